//! Season boundaries.
//!
//! The boundary table records the last day of each season per class. When a
//! season or class is missing from it, the latest date seen in that season's
//! rows stands in.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::ScoreRecord;

#[derive(Debug, Clone, Deserialize)]
pub struct BoundaryEntry {
    pub class: String,
    /// `M/D/YYYY`
    pub last_day_of_season: String,
}

/// Shape of `end_of_season.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoundaryFile {
    #[serde(default)]
    pub end_of_season: HashMap<String, Vec<BoundaryEntry>>,
}

#[derive(Debug, Clone, Default)]
pub struct SeasonBoundaries {
    by_year: HashMap<i32, Vec<(String, NaiveDate)>>,
}

impl SeasonBoundaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries with an unreadable year or date are dropped.
    pub fn from_file(file: BoundaryFile) -> Self {
        let mut boundaries = Self::default();
        for (year, entries) in file.end_of_season {
            let Ok(year) = year.trim().parse::<i32>() else {
                tracing::warn!(year = %year, "skipping season boundary with unreadable year");
                continue;
            };
            for entry in entries {
                match parse_full_date(&entry.last_day_of_season) {
                    Some(date) => boundaries.insert(year, entry.class, date),
                    None => tracing::warn!(
                        year,
                        value = %entry.last_day_of_season,
                        "skipping season boundary with unreadable date"
                    ),
                }
            }
        }
        boundaries
    }

    pub fn insert(&mut self, year: i32, class: impl Into<String>, last_day: NaiveDate) {
        self.by_year
            .entry(year)
            .or_default()
            .push((class.into(), last_day));
    }

    /// Latest recorded last day of `year` across all classes.
    pub fn recorded_end(&self, year: i32) -> Option<NaiveDate> {
        self.by_year
            .get(&year)?
            .iter()
            .map(|(_, date)| *date)
            .max()
    }

    pub fn recorded_class_end(&self, year: i32, class: &str) -> Option<NaiveDate> {
        self.by_year
            .get(&year)?
            .iter()
            .find(|(entry_class, _)| entry_class == class)
            .map(|(_, date)| *date)
    }

    /// Last day of `year`: from the table, else the latest dated row of that
    /// season in `records`.
    pub fn season_end(&self, year: i32, records: &[ScoreRecord]) -> Option<NaiveDate> {
        self.recorded_end(year)
            .or_else(|| observed_season_end(year, records.iter()))
    }

    /// Like [`season_end`](Self::season_end) but keyed to one class first.
    pub fn class_season_end<'a>(
        &self,
        year: i32,
        class: &str,
        records: impl IntoIterator<Item = &'a ScoreRecord>,
    ) -> Option<NaiveDate> {
        self.recorded_class_end(year, class)
            .or_else(|| observed_season_end(year, records))
    }

    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }
}

pub fn observed_season_end<'a>(
    year: i32,
    records: impl IntoIterator<Item = &'a ScoreRecord>,
) -> Option<NaiveDate> {
    records
        .into_iter()
        .filter(|record| record.year == year)
        .filter_map(ScoreRecord::event_date)
        .max()
}

/// Parses `M/D/YYYY`.
pub fn parse_full_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, year: i32) -> ScoreRecord {
        ScoreRecord {
            date: date.to_string(),
            year,
            city: "Indianapolis".to_string(),
            state: "IN".to_string(),
            corps: "Carolina Crown".to_string(),
            class: "World Class".to_string(),
            score: Some(90.0),
            place: Some(1),
        }
    }

    #[test]
    fn parses_boundary_json() {
        let file: BoundaryFile = serde_json::from_str(
            r#"{"end_of_season": {"2025": [
                {"class": "World Class", "last_day_of_season": "8/9/2025"},
                {"class": "Open Class", "last_day_of_season": "8/7/2025"}
            ], "bogus": []}}"#,
        )
        .expect("valid json");
        let boundaries = SeasonBoundaries::from_file(file);
        assert_eq!(boundaries.recorded_end(2025), NaiveDate::from_ymd_opt(2025, 8, 9));
        assert_eq!(
            boundaries.recorded_class_end(2025, "Open Class"),
            NaiveDate::from_ymd_opt(2025, 8, 7)
        );
    }

    #[test]
    fn falls_back_to_latest_observed_date() {
        let records = vec![
            row("07/01", 2014),
            row("08/09", 2014),
            row("bad", 2014),
            row("08/20", 2013),
        ];
        let boundaries = SeasonBoundaries::new();
        assert_eq!(
            boundaries.season_end(2014, &records),
            NaiveDate::from_ymd_opt(2014, 8, 9)
        );
        assert_eq!(boundaries.season_end(2012, &records), None);
    }

    #[test]
    fn class_end_prefers_table_then_rows() {
        let mut boundaries = SeasonBoundaries::new();
        let last_day = NaiveDate::from_ymd_opt(2014, 8, 9).unwrap_or_default();
        boundaries.insert(2014, "World Class", last_day);
        let records = vec![row("08/02", 2014)];
        assert_eq!(
            boundaries.class_season_end(2014, "Open Class", &records),
            NaiveDate::from_ymd_opt(2014, 8, 2)
        );
        assert_eq!(
            boundaries.class_season_end(2014, "World Class", &records),
            NaiveDate::from_ymd_opt(2014, 8, 9)
        );
    }
}

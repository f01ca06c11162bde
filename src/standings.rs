//! Season standings ranked by each corps' most recent score.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::alias::AliasMap;
use crate::models::{MonthDay, ScoreRecord, StandingRow};
use crate::score_plus::{peer_mean, score_plus_from_mean};

/// Rank whose score marks the finals cutoff.
pub const CUTOFF_RANK: usize = 12;

/// Class selection. `Dci` and `AllAge` stand for groups of labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClassFilter {
    Dci,
    AllAge,
    Exact(String),
}

/// DCI competitive classes in force for a season.
pub fn dci_classes(year: i32) -> &'static [&'static str] {
    if year >= 2008 {
        &["Open Class", "World Class"]
    } else if year >= 1991 {
        &["Division I", "Division II", "Division III"]
    } else {
        &["Open Class", "A Class", "A60 Class", "All-Girl Class"]
    }
}

pub fn is_all_age_class(class: &str) -> bool {
    class.contains("All-Age") || class.contains("DCA")
}

impl ClassFilter {
    pub fn matches(&self, class: &str, year: i32) -> bool {
        match self {
            ClassFilter::Dci => dci_classes(year).contains(&class),
            ClassFilter::AllAge => is_all_age_class(class),
            ClassFilter::Exact(label) => class == label,
        }
    }
}

impl FromStr for ClassFilter {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(match raw {
            "DCI" => ClassFilter::Dci,
            "All-Age" => ClassFilter::AllAge,
            other => ClassFilter::Exact(other.to_string()),
        })
    }
}

impl fmt::Display for ClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassFilter::Dci => f.write_str("DCI"),
            ClassFilter::AllAge => f.write_str("All-Age"),
            ClassFilter::Exact(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandingsQuery {
    pub season_year: i32,
    pub class_filter: Option<ClassFilter>,
    /// Keep shows on or before this day.
    pub through: Option<MonthDay>,
}

impl StandingsQuery {
    pub fn season(season_year: i32) -> Self {
        Self {
            season_year,
            class_filter: None,
            through: None,
        }
    }

    pub fn with_class(mut self, filter: ClassFilter) -> Self {
        self.class_filter = Some(filter);
        self
    }

    pub fn through(mut self, day: MonthDay) -> Self {
        self.through = Some(day);
        self
    }

    pub fn accepts(&self, record: &ScoreRecord) -> bool {
        if record.year != self.season_year {
            return false;
        }
        if let Some(through) = self.through {
            match record.month_day() {
                Some(day) if day <= through => {}
                _ => return false,
            }
        }
        self.class_filter
            .as_ref()
            .map_or(true, |filter| filter.matches(&record.class, record.year))
    }
}

/// Rows of one season that survive the query's date and class filters.
pub fn filter_season<'a>(
    records: &'a [ScoreRecord],
    query: &StandingsQuery,
) -> Vec<&'a ScoreRecord> {
    records.iter().filter(|record| query.accepts(record)).collect()
}

struct Performance {
    score: f64,
    day: Option<MonthDay>,
}

fn mean_of_first(performances: &[Performance], n: usize) -> f64 {
    let recent = &performances[..performances.len().min(n)];
    if recent.is_empty() {
        0.0
    } else {
        recent.iter().map(|p| p.score).sum::<f64>() / recent.len() as f64
    }
}

/// Ranks every corps in the filtered season by its most recent score.
pub fn compute_standings(
    records: &[ScoreRecord],
    aliases: &AliasMap,
    query: &StandingsQuery,
) -> Vec<StandingRow> {
    let filtered = filter_season(records, query);

    let mut order: Vec<String> = Vec::new();
    let mut by_corps: HashMap<String, Vec<Performance>> = HashMap::new();
    for record in &filtered {
        if !record.has_corps() {
            continue;
        }
        let Some(score) = record.numeric_score() else {
            continue;
        };
        let corps = aliases.normalize(&record.corps);
        by_corps
            .entry(corps.to_string())
            .or_insert_with(|| {
                order.push(corps.to_string());
                Vec::new()
            })
            .push(Performance {
                score,
                day: record.month_day(),
            });
    }

    // Peers are the filtered season as a whole; the class filter has
    // already narrowed it.
    let season_mean = peer_mean(
        filtered
            .iter()
            .copied()
            .filter(|record| record.year == query.season_year),
    );

    let mut rows: Vec<StandingRow> = Vec::with_capacity(order.len());
    for corps in order {
        let Some(mut performances) = by_corps.remove(&corps) else {
            continue;
        };
        // Newest first; undated shows sink to the end.
        performances.sort_by(|a, b| b.day.cmp(&a.day));

        let Some(latest) = performances.first() else {
            continue;
        };
        let most_recent_score = latest.score;
        let most_recent_score_plus = score_plus_from_mean(most_recent_score, season_mean);

        rows.push(StandingRow {
            rank: 0,
            corps,
            most_recent_score,
            most_recent_score_plus,
            avg_last3: mean_of_first(&performances, 3),
            avg_last5: mean_of_first(&performances, 5),
            performance_count: performances.len(),
            point_diff: None,
            leader_point_diff: None,
            twelfth_point_diff: None,
        });
    }

    rows.sort_by(|a, b| {
        b.most_recent_score
            .partial_cmp(&a.most_recent_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let scores: Vec<f64> = rows.iter().map(|row| row.most_recent_score).collect();
    let total = rows.len();
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index + 1;
        if index > 0 {
            row.point_diff = Some(scores[index - 1] - row.most_recent_score);
            row.leader_point_diff = Some(scores[0] - row.most_recent_score);
        }
        if total >= CUTOFF_RANK && index >= CUTOFF_RANK {
            row.twelfth_point_diff = Some(scores[CUTOFF_RANK - 1] - row.most_recent_score);
        }
    }

    tracing::debug!(
        season = query.season_year,
        rows = rows.len(),
        "computed standings"
    );
    rows
}

/// Show dates in a season's rows, newest first.
pub fn available_dates(records: &[ScoreRecord]) -> Vec<MonthDay> {
    let days: BTreeSet<MonthDay> = records.iter().filter_map(ScoreRecord::month_day).collect();
    days.into_iter().rev().collect()
}

/// Class labels in a season's rows, sorted.
pub fn available_classes(records: &[ScoreRecord]) -> Vec<String> {
    let classes: BTreeSet<&str> = records
        .iter()
        .map(|record| record.class.trim())
        .filter(|class| !class.is_empty())
        .collect();
    classes.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::IdentityEntry;

    fn row(corps: &str, class: &str, date: &str, score: Option<f64>) -> ScoreRecord {
        ScoreRecord {
            date: date.to_string(),
            year: 2015,
            city: "Allentown".to_string(),
            state: "PA".to_string(),
            corps: corps.to_string(),
            class: class.to_string(),
            score,
            place: None,
        }
    }

    fn fifteen_corps() -> Vec<ScoreRecord> {
        let mut records: Vec<ScoreRecord> = (0..15)
            .map(|i| {
                let name = format!("Corps {i:02}");
                row(&name, "World Class", "08/01", Some(95.0 - i as f64))
            })
            .collect();
        records.push(row("Division Two Corps", "Division II", "08/01", Some(99.0)));
        records.push(row("Corps 00", "World Class", "07/01", Some(70.0)));
        records
    }

    fn dci_2015() -> StandingsQuery {
        StandingsQuery::season(2015).with_class(ClassFilter::Dci)
    }

    #[test]
    fn ranks_follow_most_recent_score() {
        let records = fifteen_corps();
        let standings = compute_standings(&records, &AliasMap::new(), &dci_2015());

        assert_eq!(standings.len(), 15);
        assert!(standings.iter().all(|row| row.corps != "Division Two Corps"));
        for (index, row) in standings.iter().enumerate() {
            assert_eq!(row.rank, index + 1);
            if index > 0 {
                assert!(standings[index - 1].most_recent_score >= row.most_recent_score);
            }
        }
        assert_eq!(standings[0].corps, "Corps 00");
        assert_eq!(standings[0].most_recent_score, 95.0);
    }

    #[test]
    fn point_diffs_chain_to_the_row_above() {
        let records = fifteen_corps();
        let standings = compute_standings(&records, &AliasMap::new(), &dci_2015());

        assert_eq!(standings[0].point_diff, None);
        assert_eq!(standings[0].leader_point_diff, None);
        for index in 1..standings.len() {
            let row = &standings[index];
            let diff = row.point_diff.expect("ranked below first");
            let above = standings[index - 1].most_recent_score;
            assert!((row.most_recent_score + diff - above).abs() < 1e-9);
        }
        assert_eq!(standings[4].leader_point_diff, Some(4.0));
    }

    #[test]
    fn twelfth_place_gap_only_below_cutoff() {
        let records = fifteen_corps();
        let standings = compute_standings(&records, &AliasMap::new(), &dci_2015());
        assert!(standings[..12]
            .iter()
            .all(|row| row.twelfth_point_diff.is_none()));
        assert_eq!(standings[12].twelfth_point_diff, Some(1.0));
        assert_eq!(standings[14].twelfth_point_diff, Some(3.0));

        let small: Vec<ScoreRecord> = records.into_iter().take(11).collect();
        let standings = compute_standings(&small, &AliasMap::new(), &StandingsQuery::season(2015));
        assert!(standings.iter().all(|row| row.twelfth_point_diff.is_none()));
    }

    #[test]
    fn every_corps_is_measured_against_one_season_mean() {
        let records = fifteen_corps();
        let standings = compute_standings(&records, &AliasMap::new(), &dci_2015());

        // World Class rows only: 95 down to 81 on 08/01, plus 70 on 07/01.
        let mean = (1320.0 + 70.0) / 16.0;
        for row in &standings {
            let expected = row.most_recent_score / mean * 100.0;
            assert!((row.most_recent_score_plus - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn rolling_averages_use_what_exists() {
        let records = vec![
            row("Crown", "World Class", "07/01", Some(80.0)),
            row("Crown", "World Class", "07/08", Some(84.0)),
        ];
        let query = StandingsQuery::season(2015);
        let standings = compute_standings(&records, &AliasMap::new(), &query);
        assert_eq!(standings[0].avg_last3, 82.0);
        assert_eq!(standings[0].avg_last5, 82.0);
        assert_eq!(standings[0].most_recent_score, 84.0);
        assert_eq!(standings[0].performance_count, 2);
    }

    #[test]
    fn averages_take_most_recent_shows() {
        let shows = [
            ("07/01", 70.0),
            ("07/02", 72.0),
            ("07/03", 74.0),
            ("07/04", 76.0),
            ("07/05", 78.0),
            ("07/06", 80.0),
        ];
        let records: Vec<ScoreRecord> = shows
            .iter()
            .map(|(date, score)| row("Crown", "World Class", date, Some(*score)))
            .collect();
        let query = StandingsQuery::season(2015);
        let standings = compute_standings(&records, &AliasMap::new(), &query);
        assert_eq!(standings[0].avg_last3, 78.0);
        assert_eq!(standings[0].avg_last5, 76.0);
    }

    #[test]
    fn date_cutoff_is_inclusive() {
        let records = vec![
            row("Crown", "World Class", "07/01", Some(80.0)),
            row("Crown", "World Class", "07/08", Some(84.0)),
            row("Crown", "World Class", "07/15", Some(88.0)),
        ];
        let query = StandingsQuery::season(2015).through(MonthDay::new(7, 8).expect("valid day"));
        let standings = compute_standings(&records, &AliasMap::new(), &query);
        assert_eq!(standings[0].most_recent_score, 84.0);
    }

    #[test]
    fn former_names_merge_and_nameless_rows_drop() {
        let records = vec![
            row("Star of Indiana", "Division I", "07/01", Some(90.0)),
            row("Star Legacy", "Division I", "07/08", Some(92.0)),
            row("", "Division I", "07/08", Some(99.0)),
            row("Cavaliers", "Division I", "07/08", None),
        ];
        let aliases = AliasMap::from_entries(&[IdentityEntry {
            corps: "Star of Indiana".to_string(),
            logo: String::new(),
            live: true,
            current_alias: "Star Legacy".to_string(),
        }]);
        let standings = compute_standings(&records, &aliases, &StandingsQuery::season(2015));
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].corps, "Star Legacy");
        assert_eq!(standings[0].performance_count, 2);
    }

    #[test]
    fn score_plus_measures_against_filtered_season() {
        let records = vec![
            row("Crown", "World Class", "07/01", Some(90.0)),
            row("Cadets", "World Class", "07/01", Some(80.0)),
            row("Spartans", "Open Class", "07/01", Some(40.0)),
        ];
        let world_class = ClassFilter::Exact("World Class".to_string());
        let query = StandingsQuery::season(2015).with_class(world_class);
        let standings = compute_standings(&records, &AliasMap::new(), &query);
        assert!((standings[0].most_recent_score_plus - 90.0 / 85.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![
            row("Crown", "World Class", "07/01", Some(85.0)),
            row("Cadets", "World Class", "07/01", Some(85.0)),
        ];
        let query = StandingsQuery::season(2015);
        let standings = compute_standings(&records, &AliasMap::new(), &query);
        assert_eq!(standings[0].corps, "Crown");
        assert_eq!(standings[1].rank, 2);
        assert_eq!(standings[1].point_diff, Some(0.0));
    }

    #[test]
    fn class_groups_follow_the_era() {
        assert!(ClassFilter::Dci.matches("World Class", 2015));
        assert!(!ClassFilter::Dci.matches("Division II", 2015));
        assert!(ClassFilter::Dci.matches("Division II", 1995));
        assert!(ClassFilter::Dci.matches("Division I", 1991));
        assert!(!ClassFilter::Dci.matches("World Class", 1990));
        assert!(ClassFilter::Dci.matches("All-Girl Class", 1985));
        assert!(ClassFilter::Dci.matches("Open Class", 2008));
        assert!(!ClassFilter::Dci.matches("Division I", 2008));
        assert!(ClassFilter::AllAge.matches("DCA Class", 2015));
        assert!(ClassFilter::AllAge.matches("All-Age World Class", 2015));
        assert!(!ClassFilter::AllAge.matches("World Class", 2015));
        assert_eq!("DCI".parse::<ClassFilter>(), Ok(ClassFilter::Dci));
        assert_eq!(
            "Open Class".parse::<ClassFilter>(),
            Ok(ClassFilter::Exact("Open Class".to_string()))
        );
    }

    #[test]
    fn filter_options_come_from_the_rows() {
        let records = fifteen_corps();
        let dates = available_dates(&records);
        let expected = vec![MonthDay::new(8, 1), MonthDay::new(7, 1)];
        assert_eq!(dates.into_iter().map(Some).collect::<Vec<_>>(), expected);
        assert_eq!(available_classes(&records), vec!["Division II", "World Class"]);
    }
}

//! Career summary for one corps across every loaded season.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::alias::AliasMap;
use crate::models::ScoreRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpsProfile {
    pub corps: String,
    pub total_shows: usize,
    pub seasons_active: usize,
    pub first_season: Option<i32>,
    pub last_season: Option<i32>,
    pub avg_score: Option<f64>,
    pub high_score: Option<f64>,
    pub low_score: Option<f64>,
    /// Population standard deviation; needs at least two scores.
    pub std_dev: Option<f64>,
    pub avg_placement: Option<f64>,
    pub best_placement: Option<u32>,
    /// Mean score of the last season minus that of the first.
    pub improvement: Option<f64>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn corps_profile(records: &[ScoreRecord], aliases: &AliasMap, corps: &str) -> CorpsProfile {
    let corps = aliases.normalize(corps).to_string();
    let shows: Vec<&ScoreRecord> = records
        .iter()
        .filter(|record| record.has_corps() && aliases.is_same_corps(&record.corps, &corps))
        .collect();

    let mut by_season: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for show in &shows {
        let scores = by_season.entry(show.year).or_default();
        if let Some(score) = show.numeric_score() {
            scores.push(score);
        }
    }

    let scores: Vec<f64> = shows.iter().filter_map(|show| show.numeric_score()).collect();
    let places: Vec<u32> = shows.iter().filter_map(|show| show.place).collect();

    let avg_score = mean(&scores);
    let std_dev = match avg_score {
        Some(avg) if scores.len() > 1 => {
            let variance =
                scores.iter().map(|score| (score - avg).powi(2)).sum::<f64>() / scores.len() as f64;
            Some(variance.sqrt())
        }
        _ => None,
    };

    let first_season = by_season.keys().next().copied();
    let last_season = by_season.keys().next_back().copied();
    let improvement = match (by_season.values().next(), by_season.values().next_back()) {
        (Some(first), Some(last)) if by_season.len() >= 2 => {
            mean(last).zip(mean(first)).map(|(last, first)| last - first)
        }
        _ => None,
    };

    let placements: Vec<f64> = places.iter().map(|place| f64::from(*place)).collect();

    CorpsProfile {
        corps,
        total_shows: shows.len(),
        seasons_active: by_season.len(),
        first_season,
        last_season,
        avg_score,
        high_score: scores.iter().copied().reduce(f64::max),
        low_score: scores.iter().copied().reduce(f64::min),
        std_dev,
        avg_placement: mean(&placements),
        best_placement: places.iter().copied().min(),
        improvement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, score: Option<f64>, place: Option<u32>) -> ScoreRecord {
        ScoreRecord {
            date: "07/04".to_string(),
            year,
            city: "Allentown".to_string(),
            state: "PA".to_string(),
            corps: "Madison Scouts".to_string(),
            class: "World Class".to_string(),
            score,
            place,
        }
    }

    #[test]
    fn summarizes_career() {
        let records = vec![
            row(2013, Some(80.0), Some(4)),
            row(2013, Some(82.0), Some(3)),
            row(2015, Some(88.0), Some(1)),
            row(2015, None, None),
        ];
        let profile = corps_profile(&records, &AliasMap::new(), "Madison Scouts");

        assert_eq!(profile.total_shows, 4);
        assert_eq!(profile.seasons_active, 2);
        assert_eq!((profile.first_season, profile.last_season), (Some(2013), Some(2015)));
        assert_eq!(profile.high_score, Some(88.0));
        assert_eq!(profile.low_score, Some(80.0));
        assert_eq!(profile.best_placement, Some(1));
        assert!((profile.avg_score.unwrap_or_default() - 250.0 / 3.0).abs() < 1e-9);
        assert!((profile.avg_placement.unwrap_or_default() - 8.0 / 3.0).abs() < 1e-9);
        assert!((profile.improvement.unwrap_or_default() - 7.0).abs() < 1e-9);
        assert!(profile.std_dev.is_some());
    }

    #[test]
    fn single_show_has_no_spread_or_improvement() {
        let records = vec![row(2015, Some(88.0), Some(1))];
        let profile = corps_profile(&records, &AliasMap::new(), "Madison Scouts");
        assert_eq!(profile.std_dev, None);
        assert_eq!(profile.improvement, None);
    }

    #[test]
    fn unknown_corps_is_empty() {
        let records = vec![row(2015, Some(88.0), Some(1))];
        let profile = corps_profile(&records, &AliasMap::new(), "Nobody");
        assert_eq!(profile.total_shows, 0);
        assert_eq!(profile.avg_score, None);
        assert_eq!(profile.first_season, None);
    }
}

//! Score+: a score relative to its season's average, scaled so the average
//! is 100.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::alias::AliasMap;
use crate::models::ScoreRecord;
use crate::season::SeasonBoundaries;

/// Which rows a score is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum PeerMode {
    /// Same season and same class label.
    #[default]
    SameClass,
    /// Same season, any class.
    CrossClass,
}

impl PeerMode {
    pub fn from_cross_class(cross_class: bool) -> Self {
        if cross_class {
            PeerMode::CrossClass
        } else {
            PeerMode::SameClass
        }
    }

    fn is_peer(self, target: &ScoreRecord, candidate: &ScoreRecord) -> bool {
        candidate.year == target.year
            && match self {
                PeerMode::SameClass => candidate.class == target.class,
                PeerMode::CrossClass => true,
            }
    }

    fn group_key(self, record: &ScoreRecord) -> (i32, Option<&str>) {
        match self {
            PeerMode::SameClass => (record.year, Some(record.class.as_str())),
            PeerMode::CrossClass => (record.year, None),
        }
    }
}

pub fn select_peers<'a>(
    target: &ScoreRecord,
    pool: &'a [ScoreRecord],
    mode: PeerMode,
) -> Vec<&'a ScoreRecord> {
    pool.iter()
        .filter(|candidate| mode.is_peer(target, candidate))
        .collect()
}

/// Mean of the numeric scores among `peers`; `None` when there is nothing
/// usable to divide by.
pub fn peer_mean<'a>(peers: impl IntoIterator<Item = &'a ScoreRecord>) -> Option<f64> {
    let (sum, count) = peers
        .into_iter()
        .filter_map(ScoreRecord::numeric_score)
        .fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));

    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    (mean.is_finite() && mean != 0.0).then_some(mean)
}

/// Score+ of `score` given its peers' mean; the raw score when there is no
/// usable mean.
pub fn score_plus_from_mean(score: f64, mean: Option<f64>) -> f64 {
    match mean {
        Some(mean) => score / mean * 100.0,
        None => score,
    }
}

/// Score+ of `target` against `peers`. Falls back to the raw score when the
/// peers give no usable average; `None` only when the target itself has no
/// numeric score.
pub fn compute_score_plus<'a>(
    target: &ScoreRecord,
    peers: impl IntoIterator<Item = &'a ScoreRecord>,
) -> Option<f64> {
    let score = target.numeric_score()?;
    Some(score_plus_against(score, peers))
}

/// Score+ of a bare score value against `peers`.
pub fn score_plus_against<'a>(score: f64, peers: impl IntoIterator<Item = &'a ScoreRecord>) -> f64 {
    score_plus_from_mean(score, peer_mean(peers))
}

/// Per-group averages computed once over a pool, for scoring many rows.
#[derive(Debug, Clone)]
pub struct PeerAverages {
    mode: PeerMode,
    means: HashMap<(i32, Option<String>), f64>,
}

impl PeerAverages {
    pub fn build(pool: &[ScoreRecord], mode: PeerMode) -> Self {
        let mut groups: HashMap<(i32, Option<&str>), Vec<&ScoreRecord>> = HashMap::new();
        for record in pool {
            groups.entry(mode.group_key(record)).or_default().push(record);
        }

        let means = groups
            .into_iter()
            .filter_map(|((year, class), members)| {
                peer_mean(members).map(|mean| ((year, class.map(str::to_string)), mean))
            })
            .collect();

        Self { mode, means }
    }

    pub fn mean_for(&self, record: &ScoreRecord) -> Option<f64> {
        let (year, class) = self.mode.group_key(record);
        self.means.get(&(year, class.map(str::to_string))).copied()
    }

    pub fn score_plus(&self, record: &ScoreRecord) -> Option<f64> {
        let score = record.numeric_score()?;
        Some(score_plus_from_mean(score, self.mean_for(record)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorePlusEntry<'a> {
    pub record: &'a ScoreRecord,
    pub score_plus: Option<f64>,
}

/// Score+ for each target, measured against `pool`.
pub fn score_plus_for_records<'a>(
    targets: impl IntoIterator<Item = &'a ScoreRecord>,
    pool: &[ScoreRecord],
    mode: PeerMode,
) -> Vec<ScorePlusEntry<'a>> {
    let averages = PeerAverages::build(pool, mode);
    targets
        .into_iter()
        .map(|record| ScorePlusEntry {
            record,
            score_plus: averages.score_plus(record),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorpsSeason {
    pub corps: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub date: String,
    pub days_from_end: i64,
    pub score: f64,
    pub score_plus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub corps: String,
    pub year: i32,
    /// Earliest show first.
    pub points: Vec<TrajectoryPoint>,
}

/// Score+ over the course of each selected season, positioned by days
/// before that season's end. Undated and unscored rows are left out.
pub fn score_plus_trajectories(
    pool: &[ScoreRecord],
    aliases: &AliasMap,
    selections: &[CorpsSeason],
    mode: PeerMode,
    boundaries: &SeasonBoundaries,
) -> Vec<Trajectory> {
    let charted: Vec<ScoreRecord> = pool
        .iter()
        .filter(|record| record.positive_score().is_some() && record.event_date().is_some())
        .cloned()
        .collect();
    let averages = PeerAverages::build(&charted, mode);

    let mut trajectories = Vec::with_capacity(selections.len());
    for selection in selections {
        let canonical = aliases.normalize(&selection.corps).to_string();
        let rows: Vec<&ScoreRecord> = charted
            .iter()
            .filter(|record| {
                record.year == selection.year && aliases.is_same_corps(&record.corps, &canonical)
            })
            .collect();

        let Some(first) = rows.first() else {
            tracing::debug!(
                corps = %canonical,
                year = selection.year,
                "no charted rows for selection"
            );
            continue;
        };
        let Some(end) = boundaries.class_season_end(selection.year, &first.class, &charted) else {
            continue;
        };

        let mut points: Vec<TrajectoryPoint> = rows
            .iter()
            .filter_map(|record| {
                let date = record.event_date()?;
                let score = record.positive_score()?;
                Some(TrajectoryPoint {
                    date: record.date.clone(),
                    days_from_end: (end - date).num_days(),
                    score,
                    score_plus: score_plus_from_mean(score, averages.mean_for(record)),
                })
            })
            .collect();
        points.sort_by(|a, b| b.days_from_end.cmp(&a.days_from_end));

        trajectories.push(Trajectory {
            corps: canonical,
            year: selection.year,
            points,
        });
    }
    trajectories
}

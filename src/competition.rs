//! Competitions rebuilt from flat score rows.
//!
//! Season files list one row per corps per show. Rows that share a date,
//! city, state and season make up one competition. Matching is exact: two
//! spellings of the same city are two competitions.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::alias::AliasMap;
use crate::models::{format_location, MonthDay, ScoreRecord};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CompetitionKey {
    pub date: String,
    pub city: String,
    pub state: String,
    pub year: i32,
}

impl CompetitionKey {
    pub fn of(record: &ScoreRecord) -> Self {
        Self {
            date: record.date.clone(),
            city: record.city.clone(),
            state: record.state.clone(),
            year: record.year,
        }
    }

    pub fn matches(&self, record: &ScoreRecord) -> bool {
        record.year == self.year
            && record.date == self.date
            && record.city == self.city
            && record.state == self.state
    }

    pub fn location(&self) -> String {
        format_location(&self.city, &self.state)
    }
}

/// Groups rows into competitions. Rows without a corps name are skipped.
pub fn group_into_competitions(
    records: &[ScoreRecord],
) -> HashMap<CompetitionKey, Vec<&ScoreRecord>> {
    let mut competitions: HashMap<CompetitionKey, Vec<&ScoreRecord>> = HashMap::new();

    for record in records.iter().filter(|record| record.has_corps()) {
        competitions
            .entry(CompetitionKey::of(record))
            .or_default()
            .push(record);
    }

    tracing::debug!(
        rows = records.len(),
        competitions = competitions.len(),
        "grouped score rows into competitions"
    );
    competitions
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub place: Option<u32>,
    pub corps: String,
    pub score: Option<f64>,
    /// Behind the row placed directly ahead.
    pub point_diff: Option<f64>,
    /// Behind the class winner.
    pub lead_point_diff: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassResults {
    pub class: String,
    pub rows: Vec<ResultRow>,
}

/// Results of one competition, one table per class in alphabetical order,
/// each ordered by place with unplaced rows last.
pub fn competition_results(records: &[ScoreRecord], key: &CompetitionKey) -> Vec<ClassResults> {
    let mut by_class: BTreeMap<String, Vec<&ScoreRecord>> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|record| record.has_corps() && key.matches(record))
    {
        let class = if record.class.trim().is_empty() {
            "Unknown Class".to_string()
        } else {
            record.class.clone()
        };
        by_class.entry(class).or_default().push(record);
    }

    by_class
        .into_iter()
        .map(|(class, mut rows)| {
            rows.sort_by_key(|record| record.place.unwrap_or(u32::MAX));
            let leader = rows.first().and_then(|record| record.numeric_score()).unwrap_or(0.0);

            let mut results = Vec::with_capacity(rows.len());
            for (index, record) in rows.iter().enumerate() {
                let score = record.numeric_score().unwrap_or(0.0);
                let behind_winner = record.place.is_some_and(|place| place > 1);
                let point_diff = (behind_winner && index > 0).then(|| {
                    let ahead = rows[index - 1].numeric_score().unwrap_or(0.0);
                    ahead - score
                });
                results.push(ResultRow {
                    place: record.place,
                    corps: record.corps.clone(),
                    score: record.numeric_score(),
                    point_diff,
                    lead_point_diff: behind_winner.then(|| leader - score),
                });
            }

            ClassResults {
                class,
                rows: results,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionSummary {
    pub key: CompetitionKey,
    pub location: String,
    pub corps_count: usize,
    pub winner: Option<String>,
}

/// One line per competition, newest first.
pub fn summarize_competitions(records: &[ScoreRecord]) -> Vec<CompetitionSummary> {
    let mut summaries: Vec<CompetitionSummary> = group_into_competitions(records)
        .into_iter()
        .map(|(key, entries)| {
            let winner = entries
                .iter()
                .filter(|record| record.place.is_some())
                .min_by_key(|record| record.place)
                .or_else(|| {
                    entries.iter().max_by(|a, b| {
                        a.numeric_score()
                            .unwrap_or(f64::MIN)
                            .partial_cmp(&b.numeric_score().unwrap_or(f64::MIN))
                            .unwrap_or(Ordering::Equal)
                    })
                })
                .map(|record| record.corps.clone());

            CompetitionSummary {
                location: key.location(),
                corps_count: entries.len(),
                winner,
                key,
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        let a_date = MonthDay::parse(&a.key.date);
        let b_date = MonthDay::parse(&b.key.date);
        b.key
            .year
            .cmp(&a.key.year)
            .then(b_date.cmp(&a_date))
            .then_with(|| a.key.city.cmp(&b.key.city))
    });
    summaries
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentRecord {
    pub opponent: String,
    pub meetings: usize,
    pub wins: usize,
    pub losses: usize,
    pub ties: usize,
    /// Over decided meetings only.
    pub win_pct: f64,
    /// Own score minus opponent score, over meetings where both scored.
    pub avg_margin: f64,
}

#[derive(Default)]
struct Tally {
    meetings: usize,
    wins: usize,
    losses: usize,
    ties: usize,
    margins: Vec<f64>,
}

fn tally_opponents(
    records: &[ScoreRecord],
    aliases: &AliasMap,
    corps: &str,
    include: impl Fn(&str) -> bool,
) -> Vec<(String, Tally)> {
    let competitions = group_into_competitions(records);
    let mut order: Vec<String> = Vec::new();
    let mut tallies: HashMap<String, Tally> = HashMap::new();

    let mut keys: Vec<&CompetitionKey> = competitions.keys().collect();
    keys.sort();

    for key in keys {
        let entries = &competitions[key];
        let Some(ours) = entries
            .iter()
            .find(|record| aliases.normalize(&record.corps) == corps)
        else {
            continue;
        };

        for theirs in entries.iter() {
            let opponent = aliases.normalize(&theirs.corps);
            if opponent == corps || !include(opponent) {
                continue;
            }

            let tally = tallies.entry(opponent.to_string()).or_insert_with(|| {
                order.push(opponent.to_string());
                Tally::default()
            });
            tally.meetings += 1;

            if let (Some(own), Some(other)) = (ours.numeric_score(), theirs.numeric_score()) {
                match own.partial_cmp(&other) {
                    Some(Ordering::Greater) => tally.wins += 1,
                    Some(Ordering::Less) => tally.losses += 1,
                    _ => tally.ties += 1,
                }
                tally.margins.push(own - other);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|name| tallies.remove(&name).map(|tally| (name, tally)))
        .collect()
}

/// Career record of `corps` against every opponent met at least
/// `min_meetings` times, most frequent opponents first.
pub fn opponent_records(
    records: &[ScoreRecord],
    aliases: &AliasMap,
    corps: &str,
    min_meetings: usize,
) -> Vec<OpponentRecord> {
    let corps = aliases.normalize(corps);
    let mut results: Vec<OpponentRecord> = tally_opponents(records, aliases, corps, |_| true)
        .into_iter()
        .filter(|(_, tally)| tally.meetings >= min_meetings)
        .map(|(opponent, tally)| {
            let decided = tally.wins + tally.losses;
            OpponentRecord {
                opponent,
                meetings: tally.meetings,
                wins: tally.wins,
                losses: tally.losses,
                // Meetings without two scores are neither won nor lost.
                ties: tally.meetings - decided,
                win_pct: if decided == 0 {
                    0.0
                } else {
                    tally.wins as f64 / decided as f64 * 100.0
                },
                avg_margin: if tally.margins.is_empty() {
                    0.0
                } else {
                    tally.margins.iter().sum::<f64>() / tally.margins.len() as f64
                },
            }
        })
        .collect();

    results.sort_by(|a, b| b.meetings.cmp(&a.meetings));
    results
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RivalRecord {
    pub opponent: String,
    pub wins: usize,
    pub losses: usize,
    pub ties: usize,
    pub total: usize,
}

/// The live corps `corps` has faced most often, with W-L-T by score.
pub fn most_competed_against(
    records: &[ScoreRecord],
    aliases: &AliasMap,
    corps: &str,
    limit: usize,
) -> Vec<RivalRecord> {
    let corps = aliases.normalize(corps);
    let mut rivals: Vec<RivalRecord> =
        tally_opponents(records, aliases, corps, |name| aliases.is_live(name))
            .into_iter()
            .map(|(opponent, tally)| RivalRecord {
                opponent,
                wins: tally.wins,
                losses: tally.losses,
                ties: tally.ties,
                total: tally.meetings,
            })
            .collect();

    rivals.sort_by(|a, b| b.total.cmp(&a.total));
    rivals.truncate(limit);
    rivals
}

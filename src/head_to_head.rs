//! Head-to-head comparison of two corps.
//!
//! Every pair of rows with the same date, city and season is a meeting; the
//! scan is pairwise over the two corps' rows, which stays small at season
//! scale.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::alias::AliasMap;
use crate::models::{Matchup, MonthDay, ScoreRecord, Side, Winner};
use crate::season::SeasonBoundaries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeadToHeadOptions {
    /// Drop rows without a positive numeric score before comparing.
    pub require_valid_scores: bool,
    /// Ignore the last N days of each season.
    pub max_days_from_season_end: i64,
}

impl Default for HeadToHeadOptions {
    fn default() -> Self {
        Self {
            require_valid_scores: true,
            max_days_from_season_end: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideStats {
    pub performances: usize,
    pub high_score: Option<f64>,
    /// Mean winning margin over the meetings this corps won; 0 with no wins.
    pub avg_margin: f64,
    pub first_victory: Option<Matchup>,
    pub last_victory: Option<Matchup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SideSummary {
    DidNotCompete,
    Competed(SideStats),
}

impl SideSummary {
    pub fn stats(&self) -> Option<&SideStats> {
        match self {
            SideSummary::Competed(stats) => Some(stats),
            SideSummary::DidNotCompete => None,
        }
    }

    pub fn did_not_compete(&self) -> bool {
        matches!(self, SideSummary::DidNotCompete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeetingStatus {
    Met { meetings: usize },
    /// Both corps competed but never at the same show.
    DidNotMeet,
    /// At least one corps has no qualifying rows.
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadToHeadReport {
    pub corps_a: String,
    pub corps_b: String,
    /// Newest first.
    pub matchups: Vec<Matchup>,
    pub wins_a: usize,
    pub wins_b: usize,
    pub ties: usize,
    pub side_a: SideSummary,
    pub side_b: SideSummary,
    pub status: MeetingStatus,
}

impl HeadToHeadReport {
    pub fn side(&self, side: Side) -> &SideSummary {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    pub fn wins(&self, side: Side) -> usize {
        match side {
            Side::A => self.wins_a,
            Side::B => self.wins_b,
        }
    }

    pub fn name(&self, side: Side) -> &str {
        match side {
            Side::A => &self.corps_a,
            Side::B => &self.corps_b,
        }
    }
}

/// Rows belonging to `corps`, matched on canonical or printed name.
pub fn select_corps_records<'a>(
    records: &'a [ScoreRecord],
    aliases: &AliasMap,
    corps: &str,
) -> Vec<&'a ScoreRecord> {
    records
        .iter()
        .filter(|record| record.has_corps() && aliases.is_same_corps(&record.corps, corps))
        .collect()
}

fn qualifies(record: &ScoreRecord, options: &HeadToHeadOptions) -> bool {
    !options.require_valid_scores || record.positive_score().is_some()
}

/// Last day kept when the final `days` of a season ending on `end` are
/// ignored. Windows past the calendar range clamp to its edges.
pub fn season_cutoff(end: NaiveDate, days: i64) -> NaiveDate {
    let clamp = if days > 0 { NaiveDate::MIN } else { NaiveDate::MAX };
    Duration::try_days(days)
        .and_then(|window| end.checked_sub_signed(window))
        .unwrap_or(clamp)
}

/// Applies the score requirement and the season-end cutoff. `season_pool`
/// holds every row of the seasons involved so the observed season end
/// reflects the whole field, not just one corps.
pub fn apply_season_cutoff<'a>(
    records: Vec<&'a ScoreRecord>,
    season_pool: &[ScoreRecord],
    boundaries: &SeasonBoundaries,
    options: &HeadToHeadOptions,
) -> Vec<&'a ScoreRecord> {
    let mut cutoffs: HashMap<i32, Option<NaiveDate>> = HashMap::new();

    records
        .into_iter()
        .filter(|record| qualifies(record, options))
        .filter(|record| {
            let cutoff = *cutoffs.entry(record.year).or_insert_with(|| {
                boundaries
                    .season_end(record.year, season_pool)
                    .map(|end| season_cutoff(end, options.max_days_from_season_end))
            });
            match cutoff {
                Some(cutoff) => record.event_date().is_some_and(|date| date <= cutoff),
                None => true,
            }
        })
        .collect()
}

fn meets(a: &ScoreRecord, b: &ScoreRecord) -> bool {
    a.date == b.date && a.city == b.city && a.year == b.year
}

fn decide(score_a: Option<f64>, score_b: Option<f64>) -> (Winner, f64) {
    match (score_a, score_b) {
        (Some(a), Some(b)) if a > b => (Winner::Corps(Side::A), a - b),
        (Some(a), Some(b)) if b > a => (Winner::Corps(Side::B), b - a),
        (Some(_), Some(_)) => (Winner::Tie, 0.0),
        _ => (Winner::Undecided, 0.0),
    }
}

/// All meetings between the two row sets, newest first.
pub fn find_matchups(a: &[&ScoreRecord], b: &[&ScoreRecord]) -> Vec<Matchup> {
    let mut matchups = Vec::new();

    for row_a in a {
        for row_b in b {
            if !meets(row_a, row_b) {
                continue;
            }
            let score_a = row_a.numeric_score();
            let score_b = row_b.numeric_score();
            let (winner, difference) = decide(score_a, score_b);
            matchups.push(Matchup {
                date: row_a.date.clone(),
                year: row_a.year,
                city: row_a.city.clone(),
                state: row_a.state.clone(),
                score_a,
                score_b,
                winner,
                difference,
            });
        }
    }

    sort_newest_first(&mut matchups);
    matchups
}

/// Year descending, then date within the year descending. Undated rows
/// fall to the end of their year.
pub fn sort_newest_first(matchups: &mut [Matchup]) {
    matchups.sort_by(|x, y| {
        y.year
            .cmp(&x.year)
            .then_with(|| MonthDay::parse(&y.date).cmp(&MonthDay::parse(&x.date)))
    });
}

fn side_stats(side: Side, records: &[&ScoreRecord], matchups: &[Matchup]) -> SideSummary {
    if records.is_empty() {
        return SideSummary::DidNotCompete;
    }

    let high_score = records
        .iter()
        .filter_map(|record| record.numeric_score())
        .fold(None, |best: Option<f64>, score| {
            Some(best.map_or(score, |best| best.max(score)))
        });

    let victories: Vec<&Matchup> = matchups.iter().filter(|m| m.won_by(side)).collect();
    let avg_margin = if victories.is_empty() {
        0.0
    } else {
        victories.iter().map(|m| m.difference).sum::<f64>() / victories.len() as f64
    };

    let dated: Vec<&Matchup> = victories
        .iter()
        .copied()
        .filter(|m| MonthDay::parse(&m.date).is_some())
        .collect();

    SideSummary::Competed(SideStats {
        performances: records.len(),
        high_score,
        avg_margin,
        first_victory: dated.last().map(|m| (*m).clone()),
        last_victory: dated.first().map(|m| (*m).clone()),
    })
}

/// Compares two already selected row sets.
pub fn compare_head_to_head(
    corps_a: &str,
    records_a: &[&ScoreRecord],
    corps_b: &str,
    records_b: &[&ScoreRecord],
    options: &HeadToHeadOptions,
) -> HeadToHeadReport {
    let records_a: Vec<&ScoreRecord> = records_a
        .iter()
        .copied()
        .filter(|record| qualifies(record, options))
        .collect();
    let records_b: Vec<&ScoreRecord> = records_b
        .iter()
        .copied()
        .filter(|record| qualifies(record, options))
        .collect();

    let matchups = find_matchups(&records_a, &records_b);
    let wins_a = matchups.iter().filter(|m| m.won_by(Side::A)).count();
    let wins_b = matchups.iter().filter(|m| m.won_by(Side::B)).count();
    let ties = matchups.iter().filter(|m| m.winner == Winner::Tie).count();

    let side_a = side_stats(Side::A, &records_a, &matchups);
    let side_b = side_stats(Side::B, &records_b, &matchups);

    let status = if side_a.did_not_compete() || side_b.did_not_compete() {
        MeetingStatus::InsufficientData
    } else if matchups.is_empty() {
        MeetingStatus::DidNotMeet
    } else {
        MeetingStatus::Met {
            meetings: matchups.len(),
        }
    };

    HeadToHeadReport {
        corps_a: corps_a.to_string(),
        corps_b: corps_b.to_string(),
        matchups,
        wins_a,
        wins_b,
        ties,
        side_a,
        side_b,
        status,
    }
}

/// Full query: selects both corps from `records` (one or more seasons),
/// applies the season cutoff, and compares.
pub fn head_to_head(
    records: &[ScoreRecord],
    aliases: &AliasMap,
    boundaries: &SeasonBoundaries,
    corps_a: &str,
    corps_b: &str,
    options: &HeadToHeadOptions,
) -> HeadToHeadReport {
    let a = apply_season_cutoff(
        select_corps_records(records, aliases, corps_a),
        records,
        boundaries,
        options,
    );
    let b = apply_season_cutoff(
        select_corps_records(records, aliases, corps_b),
        records,
        boundaries,
        options,
    );
    tracing::debug!(corps_a, rows_a = a.len(), corps_b, rows_b = b.len(), "comparing head to head");
    compare_head_to_head(corps_a, &a, corps_b, &b, options)
}

/// Narrows a matchup history the way the history view does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchupHistoryFilter {
    pub year: Option<i32>,
    pub winner: Option<Winner>,
    /// Only meetings decided by at least this many points; 0 disables.
    pub min_margin: f64,
}

impl MatchupHistoryFilter {
    pub fn accepts(&self, matchup: &Matchup) -> bool {
        self.year.map_or(true, |year| matchup.year == year)
            && self.winner.map_or(true, |winner| matchup.winner == winner)
            && (self.min_margin <= 0.0 || matchup.difference >= self.min_margin)
    }

    pub fn apply<'a>(&self, matchups: &'a [Matchup]) -> Vec<&'a Matchup> {
        matchups.iter().filter(|m| self.accepts(m)).collect()
    }
}

pub const HISTORY_PAGE_SIZE: usize = 20;

#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
}

/// Slices out one 1-based page; pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_pages = items.len().div_ceil(per_page);
    let start = ((page - 1) * per_page).min(items.len());
    let end = (start + per_page).min(items.len());
    Page {
        items: &items[start..end],
        page,
        total_pages,
    }
}

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Month and day of an event as printed on a score sheet. Seasons never
/// cross a new year, so the season year completes the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (1..=31).contains(&day) {
            Some(Self { month, day })
        } else {
            None
        }
    }

    /// Parses `M/D` or `MM/DD`. Anything else is not a comparable date.
    pub fn parse(raw: &str) -> Option<Self> {
        let (month, day) = raw.trim().split_once('/')?;
        let month = month.trim().parse().ok()?;
        let day = day.trim().parse().ok()?;
        Self::new(month, day)
    }

    pub fn with_year(self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.day)
    }
}

/// One corps performance at one event, as parsed from a season file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    /// Date exactly as printed (`MM/DD`), kept for exact-match grouping.
    pub date: String,
    pub year: i32,
    pub city: String,
    pub state: String,
    /// Corps name as printed; may be a former name.
    pub corps: String,
    pub class: String,
    pub score: Option<f64>,
    pub place: Option<u32>,
}

impl ScoreRecord {
    pub fn month_day(&self) -> Option<MonthDay> {
        MonthDay::parse(&self.date)
    }

    pub fn event_date(&self) -> Option<NaiveDate> {
        self.month_day()?.with_year(self.year)
    }

    /// The score when it is a usable number.
    pub fn numeric_score(&self) -> Option<f64> {
        self.score.filter(|score| score.is_finite())
    }

    /// A numeric score strictly above zero. Zero rows on historical sheets
    /// mark shows that were not judged.
    pub fn positive_score(&self) -> Option<f64> {
        self.numeric_score().filter(|score| *score > 0.0)
    }

    pub fn has_corps(&self) -> bool {
        !self.corps.trim().is_empty()
    }

    pub fn location(&self) -> String {
        format_location(&self.city, &self.state)
    }
}

pub fn format_location(city: &str, state: &str) -> String {
    let state = state.trim();
    if state.is_empty() {
        city.trim().to_string()
    } else {
        format!("{}, {}", city.trim(), state)
    }
}

/// Parses a score cell; empty, non-numeric, NaN and infinite cells are absent.
pub fn parse_score(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub fn parse_place(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Winner {
    Corps(Side),
    Tie,
    /// At least one side has no valid score, so nobody won.
    Undecided,
}

/// Two corps meeting at one competition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matchup {
    pub date: String,
    pub year: i32,
    pub city: String,
    pub state: String,
    pub score_a: Option<f64>,
    pub score_b: Option<f64>,
    pub winner: Winner,
    pub difference: f64,
}

impl Matchup {
    pub fn event(&self) -> String {
        format_location(&self.city, &self.state)
    }

    pub fn won_by(&self, side: Side) -> bool {
        self.winner == Winner::Corps(side)
    }

    /// The same meeting seen from the other corps.
    pub fn swapped(&self) -> Matchup {
        Matchup {
            score_a: self.score_b,
            score_b: self.score_a,
            winner: match self.winner {
                Winner::Corps(side) => Winner::Corps(side.other()),
                other => other,
            },
            ..self.clone()
        }
    }
}

/// One ranked corps in a standings table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingRow {
    pub rank: usize,
    pub corps: String,
    pub most_recent_score: f64,
    pub most_recent_score_plus: f64,
    pub avg_last3: f64,
    pub avg_last5: f64,
    pub performance_count: usize,
    pub point_diff: Option<f64>,
    pub leader_point_diff: Option<f64>,
    pub twelfth_point_diff: Option<f64>,
}

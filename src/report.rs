use std::fmt::Write;

use crate::competition::{
    ClassResults, CompetitionKey, CompetitionSummary, OpponentRecord, RivalRecord,
};
use crate::head_to_head::{HeadToHeadReport, MeetingStatus, Page, SideSummary};
use crate::models::{Matchup, Side, StandingRow, Winner};
use crate::profile::CorpsProfile;
use crate::score_plus::Trajectory;
use crate::standings::StandingsQuery;

fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| format!("{value:.3}"))
}

fn signed(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| format!("{value:+.3}"))
}

fn winner_label(report: &HeadToHeadReport, matchup: &Matchup) -> String {
    match matchup.winner {
        Winner::Corps(side) => report.name(side).to_string(),
        Winner::Tie => "Tie".to_string(),
        Winner::Undecided => "Undecided".to_string(),
    }
}

pub fn build_standings_report(query: &StandingsQuery, rows: &[StandingRow]) -> String {
    let mut output = String::new();
    let class_label = query
        .class_filter
        .as_ref()
        .map_or_else(|| "all classes".to_string(), ToString::to_string);

    let _ = writeln!(output, "# {} Standings", query.season_year);
    match query.through {
        Some(day) => {
            let _ = writeln!(output, "Generated for {class_label} (scores through {day})");
        }
        None => {
            let _ = writeln!(output, "Generated for {class_label}");
        }
    }
    let _ = writeln!(output);

    if rows.is_empty() {
        let _ = writeln!(output, "No scored performances for this season.");
        return output;
    }

    let _ = writeln!(
        output,
        "| Rank | Corps | Score | Score+ | Avg 3 | Avg 5 | Shows | Diff | Lead | 12th |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|---|---|---|");
    for row in rows {
        let _ = writeln!(
            output,
            "| {} | {} | {:.3} | {:.1} | {:.3} | {:.3} | {} | {} | {} | {} |",
            row.rank,
            row.corps,
            row.most_recent_score,
            row.most_recent_score_plus,
            row.avg_last3,
            row.avg_last5,
            row.performance_count,
            signed(row.point_diff),
            signed(row.leader_point_diff),
            signed(row.twelfth_point_diff),
        );
    }

    output
}

fn write_side(output: &mut String, report: &HeadToHeadReport, side: Side) {
    let _ = writeln!(output, "## {}", report.name(side));
    match report.side(side) {
        SideSummary::DidNotCompete => {
            let _ = writeln!(output, "Did Not Compete");
        }
        SideSummary::Competed(stats) => {
            let _ = writeln!(output, "- Wins: {}", report.wins(side));
            let _ = writeln!(output, "- Performances: {}", stats.performances);
            let _ = writeln!(output, "- High score: {}", score(stats.high_score));
            let _ = writeln!(output, "- Average margin of victory: {:.3}", stats.avg_margin);
            for (label, victory) in [
                ("First victory", &stats.first_victory),
                ("Last victory", &stats.last_victory),
            ] {
                match victory {
                    Some(matchup) => {
                        let _ = writeln!(
                            output,
                            "- {label}: {}/{} at {}",
                            matchup.date,
                            matchup.year,
                            matchup.event()
                        );
                    }
                    None => {
                        let _ = writeln!(output, "- {label}: Never");
                    }
                }
            }
        }
    }
    let _ = writeln!(output);
}

/// `history` is the filtered, paginated slice of `report.matchups`.
pub fn build_head_to_head_report(
    report: &HeadToHeadReport,
    history: &Page<'_, &Matchup>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {} vs {}", report.corps_a, report.corps_b);
    match report.status {
        MeetingStatus::Met { meetings } => {
            let _ = writeln!(
                output,
                "{} meetings: {} {}, {} {}, {} ties",
                meetings, report.corps_a, report.wins_a, report.corps_b, report.wins_b, report.ties
            );
        }
        MeetingStatus::DidNotMeet => {
            let _ = writeln!(output, "Did Not Meet");
        }
        MeetingStatus::InsufficientData => {
            let _ = writeln!(output, "Not enough data to compare these corps.");
        }
    }
    let _ = writeln!(output);

    write_side(&mut output, report, Side::A);
    write_side(&mut output, report, Side::B);

    let _ = writeln!(output, "## Matchup History");
    if history.items.is_empty() {
        let _ = writeln!(output, "No matchups for this selection.");
        return output;
    }

    let _ = writeln!(
        output,
        "| Date | Event | {} | {} | Winner | Margin |",
        report.corps_a, report.corps_b
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for matchup in history.items {
        let _ = writeln!(
            output,
            "| {}/{} | {} | {} | {} | {} | {:.3} |",
            matchup.date,
            matchup.year,
            matchup.event(),
            score(matchup.score_a),
            score(matchup.score_b),
            winner_label(report, matchup),
            matchup.difference
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Page {} of {}", history.page, history.total_pages);

    output
}

pub fn build_event_report(key: &CompetitionKey, results: &[ClassResults]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", key.location());
    let _ = writeln!(output, "{}/{}", key.date, key.year);

    if results.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No results recorded for this competition.");
        return output;
    }

    for class in results {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", class.class);
        let _ = writeln!(output, "| Place | Corps | Score | Diff | Lead |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for row in &class.rows {
            let place = row.place.map_or_else(|| "-".to_string(), |place| place.to_string());
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                place,
                row.corps,
                score(row.score),
                signed(row.point_diff),
                signed(row.lead_point_diff)
            );
        }
    }

    output
}

pub fn build_competition_list(summaries: &[CompetitionSummary], limit: usize) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Competitions");
    if summaries.is_empty() {
        let _ = writeln!(output, "No competitions recorded.");
        return output;
    }
    for summary in summaries.iter().take(limit) {
        let _ = writeln!(
            output,
            "- {}/{} {}: {} corps, won by {}",
            summary.key.date,
            summary.key.year,
            summary.location,
            summary.corps_count,
            summary.winner.as_deref().unwrap_or("unknown")
        );
    }

    output
}

pub fn build_opponents_report(
    corps: &str,
    opponents: &[OpponentRecord],
    rivals: &[RivalRecord],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {corps} Opponents");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Competed Against");
    if rivals.is_empty() {
        let _ = writeln!(output, "No meetings with active corps.");
    } else {
        for rival in rivals {
            let _ = writeln!(
                output,
                "- {}: {}-{}-{} over {} meetings",
                rival.opponent, rival.wins, rival.losses, rival.ties, rival.total
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## All Opponents");
    if opponents.is_empty() {
        let _ = writeln!(output, "No opponents met often enough.");
        return output;
    }
    let _ = writeln!(output, "| Opponent | Meetings | W | L | T | Win % | Avg margin |");
    let _ = writeln!(output, "|---|---|---|---|---|---|---|");
    for record in opponents {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {:.1} | {:+.3} |",
            record.opponent,
            record.meetings,
            record.wins,
            record.losses,
            record.ties,
            record.win_pct,
            record.avg_margin
        );
    }

    output
}

pub fn build_profile_report(profile: &CorpsProfile) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", profile.corps);
    if profile.total_shows == 0 {
        let _ = writeln!(output, "No performances recorded.");
        return output;
    }

    let seasons = match (profile.first_season, profile.last_season) {
        (Some(first), Some(last)) if first != last => format!("{first}-{last}"),
        (Some(first), _) => first.to_string(),
        _ => "-".to_string(),
    };
    let _ = writeln!(output, "- Shows: {}", profile.total_shows);
    let _ = writeln!(output, "- Seasons: {} ({})", profile.seasons_active, seasons);
    let _ = writeln!(output, "- Average score: {}", score(profile.avg_score));
    let _ = writeln!(output, "- High score: {}", score(profile.high_score));
    let _ = writeln!(output, "- Low score: {}", score(profile.low_score));
    let _ = writeln!(output, "- Consistency (std dev): {}", score(profile.std_dev));
    let _ = writeln!(
        output,
        "- Average placement: {}",
        profile
            .avg_placement
            .map_or_else(|| "-".to_string(), |place| format!("{place:.1}"))
    );
    let _ = writeln!(
        output,
        "- Best placement: {}",
        profile
            .best_placement
            .map_or_else(|| "-".to_string(), |place| place.to_string())
    );
    let _ = writeln!(output, "- Improvement: {}", signed(profile.improvement));

    output
}

pub fn build_score_plus_report(trajectories: &[Trajectory]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Score+ Trajectories");
    if trajectories.is_empty() {
        let _ = writeln!(output, "No scored performances for the selected seasons.");
        return output;
    }

    for trajectory in trajectories {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {} {}", trajectory.year, trajectory.corps);
        let _ = writeln!(output, "| Date | Days to end | Score | Score+ |");
        let _ = writeln!(output, "|---|---|---|---|");
        for point in &trajectory.points {
            let _ = writeln!(
                output,
                "| {} | {} | {:.3} | {:.1} |",
                point.date, point.days_from_end, point.score, point.score_plus
            );
        }
    }

    output
}

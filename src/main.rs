use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use corps_stats::competition::{
    competition_results, most_competed_against, opponent_records, summarize_competitions,
    CompetitionKey,
};
use corps_stats::config::Config;
use corps_stats::head_to_head::{head_to_head, paginate, MatchupHistoryFilter, HISTORY_PAGE_SIZE};
use corps_stats::loader::Dataset;
use corps_stats::models::MonthDay;
use corps_stats::profile::corps_profile;
use corps_stats::report;
use corps_stats::score_plus::{score_plus_trajectories, CorpsSeason, PeerMode};
use corps_stats::standings::{compute_standings, ClassFilter, StandingsQuery};

#[derive(Parser)]
#[command(name = "corps-stats")]
#[command(
    about = "Drum corps score analytics: standings, head-to-head and Score+",
    long_about = None
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, default_value = "corps-stats.toml")]
    config: PathBuf,
    /// Print JSON instead of markdown
    #[arg(long, global = true)]
    json: bool,
    /// Write the report to a file instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank a season by each corps' most recent score
    Standings {
        #[arg(long)]
        year: i32,
        /// "DCI", "All-Age" or a literal class label
        #[arg(long)]
        class: Option<ClassFilter>,
        /// Only shows on or before this day (MM/DD)
        #[arg(long, value_parser = parse_month_day)]
        through: Option<MonthDay>,
    },
    /// Compare two corps over one season or all of them
    HeadToHead {
        corps_a: String,
        corps_b: String,
        /// Season to compare; every season when omitted
        #[arg(long)]
        year: Option<i32>,
        /// Ignore the last N days of each season
        #[arg(long)]
        max_days: Option<i64>,
        /// Keep shows without a valid score
        #[arg(long)]
        include_unscored: bool,
        /// Only list history meetings from this season
        #[arg(long)]
        history_year: Option<i32>,
        /// Only list history meetings decided by at least this many points
        #[arg(long, default_value_t = 0.0)]
        min_margin: f64,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Score+ over the course of selected seasons
    ScorePlus {
        /// YEAR:CORPS, repeatable
        #[arg(long = "select", required = true, value_parser = parse_selection)]
        selections: Vec<CorpsSeason>,
        /// Compare against every class instead of the corps' own
        #[arg(long)]
        cross_class: bool,
    },
    /// Results of one competition, or the season's competitions
    Event {
        #[arg(long)]
        year: i32,
        #[arg(long, requires = "city")]
        date: Option<String>,
        #[arg(long, requires = "date")]
        city: Option<String>,
        #[arg(long, default_value = "")]
        state: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Win-loss records against every opponent
    Opponents {
        corps: String,
        /// Season to count; every season when omitted
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value_t = 3)]
        min_meetings: usize,
        #[arg(long, default_value_t = 3)]
        rivals: usize,
    },
    /// Career summary for one corps
    Profile { corps: String },
}

fn parse_month_day(raw: &str) -> Result<MonthDay, String> {
    MonthDay::parse(raw).ok_or_else(|| format!("expected MM/DD, got {raw:?}"))
}

fn parse_selection(raw: &str) -> Result<CorpsSeason, String> {
    let (year, corps) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected YEAR:CORPS, got {raw:?}"))?;
    let year = year
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("bad year in {raw:?}: {e}"))?;
    let corps = corps.trim();
    if corps.is_empty() {
        return Err(format!("missing corps name in {raw:?}"));
    }
    Ok(CorpsSeason {
        corps: corps.to_string(),
        year,
    })
}

struct Output {
    json: bool,
    out: Option<PathBuf>,
}

impl Output {
    fn emit<T: Serialize>(
        &self,
        value: &T,
        markdown: impl FnOnce() -> String,
    ) -> anyhow::Result<()> {
        let text = if self.json {
            serde_json::to_string_pretty(value).context("failed to serialize result")?
        } else {
            markdown()
        };
        match &self.out {
            Some(path) => write_report(path, &text),
            None => {
                println!("{text}");
                Ok(())
            }
        }
    }
}

fn write_report(path: &Path, text: &str) -> anyhow::Result<()> {
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Report written to {}.", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("corps_stats=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config).with_env_overrides();
    let output = Output {
        json: cli.json,
        out: cli.out,
    };

    match cli.command {
        Commands::Standings {
            year,
            class,
            through,
        } => {
            let data = Dataset::load(&config.data, &[year]).await?;
            let mut query = StandingsQuery::season(year);
            if let Some(filter) = class {
                query = query.with_class(filter);
            }
            if let Some(day) = through {
                query = query.through(day);
            }
            let rows = compute_standings(&data.records, &data.aliases, &query);
            output.emit(&rows, || report::build_standings_report(&query, &rows))?;
        }
        Commands::HeadToHead {
            corps_a,
            corps_b,
            year,
            max_days,
            include_unscored,
            history_year,
            min_margin,
            page,
        } => {
            let years: Vec<i32> = year.into_iter().collect();
            let data = Dataset::load(&config.data, &years).await?;
            let corps_a = data.aliases.normalize(corps_a.trim()).to_string();
            let corps_b = data.aliases.normalize(corps_b.trim()).to_string();
            if corps_a == corps_b {
                anyhow::bail!("pick two different corps to compare");
            }

            let mut options = config.head_to_head;
            if let Some(days) = max_days {
                options.max_days_from_season_end = days;
            }
            if include_unscored {
                options.require_valid_scores = false;
            }

            let comparison = head_to_head(
                &data.records,
                &data.aliases,
                &data.boundaries,
                &corps_a,
                &corps_b,
                &options,
            );
            let filter = MatchupHistoryFilter {
                year: history_year,
                winner: None,
                min_margin,
            };
            let history = filter.apply(&comparison.matchups);
            let page = paginate(&history, page, HISTORY_PAGE_SIZE);
            output.emit(&comparison, || report::build_head_to_head_report(&comparison, &page))?;
        }
        Commands::ScorePlus {
            selections,
            cross_class,
        } => {
            let mut years: Vec<i32> = selections.iter().map(|selection| selection.year).collect();
            years.sort_unstable();
            years.dedup();
            let data = Dataset::load(&config.data, &years).await?;
            let mode = if cross_class {
                PeerMode::CrossClass
            } else {
                config.score_plus.peer_mode()
            };
            let trajectories = score_plus_trajectories(
                &data.records,
                &data.aliases,
                &selections,
                mode,
                &data.boundaries,
            );
            output.emit(&trajectories, || report::build_score_plus_report(&trajectories))?;
        }
        Commands::Event {
            year,
            date,
            city,
            state,
            limit,
        } => {
            let data = Dataset::load(&config.data, &[year]).await?;
            match (date, city) {
                (Some(date), Some(city)) => {
                    let key = CompetitionKey {
                        date,
                        city,
                        state,
                        year,
                    };
                    let results = competition_results(&data.records, &key);
                    output.emit(&results, || report::build_event_report(&key, &results))?;
                }
                _ => {
                    let summaries = summarize_competitions(&data.records);
                    output.emit(&summaries, || report::build_competition_list(&summaries, limit))?;
                }
            }
        }
        Commands::Opponents {
            corps,
            year,
            min_meetings,
            rivals,
        } => {
            let years: Vec<i32> = year.into_iter().collect();
            let data = Dataset::load(&config.data, &years).await?;
            let corps = data.aliases.normalize(corps.trim()).to_string();
            let opponents = opponent_records(&data.records, &data.aliases, &corps, min_meetings);
            let rivals = most_competed_against(&data.records, &data.aliases, &corps, rivals);
            output.emit(&(&opponents, &rivals), || {
                report::build_opponents_report(&corps, &opponents, &rivals)
            })?;
        }
        Commands::Profile { corps } => {
            let data = Dataset::load(&config.data, &[]).await?;
            let profile = corps_profile(&data.records, &data.aliases, corps.trim());
            output.emit(&profile, || report::build_profile_report(&profile))?;
        }
    }

    Ok(())
}

//! Reading season files and reference tables from the data directory.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::alias::{AliasMap, IdentityEntry};
use crate::config::DataConfig;
use crate::models::{parse_place, parse_score, ScoreRecord};
use crate::season::{BoundaryFile, SeasonBoundaries};

const SEASON_FILE_SUFFIX: &str = "_dci_data.csv";

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", default)]
    date: String,
    #[serde(rename = "City", default)]
    city: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Place", default)]
    place: String,
    #[serde(rename = "Corps", default)]
    corps: String,
    #[serde(rename = "Class", default)]
    class: String,
    #[serde(rename = "Score", default)]
    score: String,
    #[serde(rename = "Year", default)]
    year: Option<String>,
}

impl CsvRow {
    fn into_record(self, file_year: i32) -> ScoreRecord {
        let year = self
            .year
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .unwrap_or(file_year);

        ScoreRecord {
            date: self.date,
            year,
            city: self.city,
            state: self.state,
            corps: self.corps,
            class: self.class,
            score: parse_score(&self.score),
            place: parse_place(&self.place),
        }
    }
}

pub fn season_path(data_dir: &Path, year: i32) -> PathBuf {
    data_dir.join("years").join(format!("{year}{SEASON_FILE_SUFFIX}"))
}

/// Deserializes every row of a headed CSV source. Short rows read as if
/// their missing cells were blank.
fn read_rows<T: DeserializeOwned, R: Read>(source: R) -> anyhow::Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers().context("missing header row")?.clone();
    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let mut raw = result.with_context(|| format!("unreadable row {}", index + 1))?;
        while raw.len() < headers.len() {
            raw.push_field("");
        }
        let row = raw
            .deserialize(Some(&headers))
            .with_context(|| format!("malformed row {}", index + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Parses season rows from any CSV source. `year` is used for rows without a
/// `Year` column.
pub fn read_records<R: Read>(source: R, year: i32) -> anyhow::Result<Vec<ScoreRecord>> {
    let rows: Vec<CsvRow> = read_rows(source)?;
    Ok(rows.into_iter().map(|row| row.into_record(year)).collect())
}

pub fn load_season(data_dir: &Path, year: i32) -> anyhow::Result<Vec<ScoreRecord>> {
    let path = season_path(data_dir, year);
    let file = std::fs::File::open(&path)
        .with_context(|| format!("failed to open season file {}", path.display()))?;
    let records = read_records(file, year)
        .with_context(|| format!("failed to parse season file {}", path.display()))?;
    tracing::debug!(year, rows = records.len(), "season loaded");
    Ok(records)
}

/// Seasons that have a file under `{data_dir}/years`, newest first.
pub fn discover_years(data_dir: &Path) -> anyhow::Result<Vec<i32>> {
    let years_dir = data_dir.join("years");
    let entries = std::fs::read_dir(&years_dir)
        .with_context(|| format!("failed to list {}", years_dir.display()))?;

    let mut years = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(year) = name
            .strip_suffix(SEASON_FILE_SUFFIX)
            .and_then(|prefix| prefix.parse::<i32>().ok())
        {
            years.push(year);
        }
    }
    years.sort_unstable_by(|a, b| b.cmp(a));
    Ok(years)
}

/// Loads every requested season on blocking workers. Seasons without a file
/// are skipped with a warning; a file that exists but cannot be parsed is an
/// error.
pub async fn load_seasons(data_dir: &Path, years: &[i32]) -> anyhow::Result<Vec<ScoreRecord>> {
    let mut handles = Vec::with_capacity(years.len());
    for &year in years {
        let path = season_path(data_dir, year);
        if !path.exists() {
            tracing::warn!(year, path = %path.display(), "season file not found, skipping");
            continue;
        }
        let dir = data_dir.to_path_buf();
        handles.push((year, tokio::task::spawn_blocking(move || load_season(&dir, year))));
    }

    let mut records = Vec::new();
    for (year, handle) in handles {
        let season = handle
            .await
            .with_context(|| format!("season {year} loader task failed"))??;
        records.extend(season);
    }
    tracing::info!(seasons = years.len(), rows = records.len(), "score data loaded");
    Ok(records)
}

pub fn read_identity_table<R: Read>(source: R) -> anyhow::Result<AliasMap> {
    let entries: Vec<IdentityEntry> = read_rows(source).context("bad identity table")?;
    Ok(AliasMap::from_entries(&entries))
}

/// Falls back to an empty map when the table is missing or unreadable.
pub fn load_identity_table(path: &Path) -> AliasMap {
    let loaded = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))
        .and_then(read_identity_table);
    match loaded {
        Ok(aliases) => {
            tracing::info!(
                path = %path.display(),
                aliases = aliases.len(),
                "identity table loaded"
            );
            aliases
        }
        Err(e) => {
            tracing::warn!("Identity table unavailable: {e:#}, names are used as printed");
            AliasMap::new()
        }
    }
}

/// Falls back to an empty table when the file is missing or unreadable.
pub fn load_season_boundaries(path: &Path) -> SeasonBoundaries {
    let loaded = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .and_then(|contents| {
            serde_json::from_str::<BoundaryFile>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))
        });
    match loaded {
        Ok(file) => {
            tracing::info!(path = %path.display(), "season boundaries loaded");
            SeasonBoundaries::from_file(file)
        }
        Err(e) => {
            tracing::warn!("Season boundaries unavailable: {e:#}, using observed season ends");
            SeasonBoundaries::new()
        }
    }
}

/// Everything the analytics need, loaded once.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<ScoreRecord>,
    pub aliases: AliasMap,
    pub boundaries: SeasonBoundaries,
}

impl Dataset {
    /// Loads `years`, or every season on disk when `years` is empty.
    pub async fn load(data: &DataConfig, years: &[i32]) -> anyhow::Result<Self> {
        let years = if years.is_empty() {
            discover_years(&data.data_dir)?
        } else {
            years.to_vec()
        };
        if years.is_empty() {
            anyhow::bail!("no season files found under {}", data.data_dir.display());
        }

        let records = load_seasons(&data.data_dir, &years).await?;
        Ok(Self {
            records,
            aliases: load_identity_table(&data.identity_table),
            boundaries: load_season_boundaries(&data.season_boundaries),
        })
    }
}

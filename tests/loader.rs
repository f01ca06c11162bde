use std::fs;
use std::path::Path;

use corps_stats::config::DataConfig;
use corps_stats::head_to_head::{head_to_head, HeadToHeadOptions, MeetingStatus};
use corps_stats::loader::{discover_years, load_identity_table, load_season_boundaries, Dataset};
use corps_stats::standings::{compute_standings, ClassFilter, StandingsQuery};

const SEASON_2014: &str = "\
Date,City,State,Place,Corps,Class,Score
07/04,Allentown,PA,1,Blue Devils,World Class,85.100
07/04,Allentown,PA,2,Cavaliers,World Class,80.200
08/09,Indianapolis,IN,1,Blue Devils,World Class,99.650
08/09,Indianapolis,IN,2,The Cavaliers,World Class,90.000
08/09,Indianapolis,IN,1,Spartans,Open Class,80.000
";

const SEASON_2015: &str = "\
Date,City,State,Place,Corps,Class,Score
07/10,Denton,TX,1,Blue Devils,World Class,88.000
07/10,Denton,TX,2,The Cavaliers,World Class,84.500
";

const BOUNDARIES: &str = r#"{"end_of_season": {"2014": [
    {"class": "World Class", "last_day_of_season": "8/9/2014"}
]}}"#;

const IDENTITY: &str = "\
corps,logo,live,current_alias
Cavaliers,cavies.png,true,The Cavaliers
The Cavaliers,cavies.png,true,
Blue Devils,bd.png,true,
";

fn write_data_dir(root: &Path) -> DataConfig {
    let years = root.join("years");
    fs::create_dir_all(&years).unwrap();
    fs::write(years.join("2014_dci_data.csv"), SEASON_2014).unwrap();
    fs::write(years.join("2015_dci_data.csv"), SEASON_2015).unwrap();
    fs::write(years.join("notes.txt"), "not a season").unwrap();
    fs::write(root.join("logo_dictionary.csv"), IDENTITY).unwrap();
    fs::write(root.join("end_of_season.json"), BOUNDARIES).unwrap();

    DataConfig {
        data_dir: root.to_path_buf(),
        identity_table: root.join("logo_dictionary.csv"),
        season_boundaries: root.join("end_of_season.json"),
    }
}

#[test]
fn discovers_only_season_files() {
    let dir = tempfile::tempdir().unwrap();
    write_data_dir(dir.path());
    assert_eq!(discover_years(dir.path()).unwrap(), vec![2015, 2014]);
}

#[test]
fn missing_reference_tables_fall_back_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let aliases = load_identity_table(&dir.path().join("missing.csv"));
    assert!(aliases.is_empty());
    let boundaries = load_season_boundaries(&dir.path().join("missing.json"));
    assert!(boundaries.is_empty());
}

#[test]
fn malformed_boundaries_fall_back_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("end_of_season.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(load_season_boundaries(&path).is_empty());
}

#[tokio::test]
async fn loads_every_season_when_none_requested() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_data_dir(dir.path());

    let dataset = Dataset::load(&data, &[]).await.unwrap();
    assert_eq!(dataset.records.len(), 7);
    assert_eq!(dataset.aliases.normalize("Cavaliers"), "The Cavaliers");
}

#[tokio::test]
async fn missing_season_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_data_dir(dir.path());

    let dataset = Dataset::load(&data, &[2015, 1999]).await.unwrap();
    assert_eq!(dataset.records.len(), 2);
    assert!(dataset.records.iter().all(|record| record.year == 2015));
}

#[tokio::test]
async fn empty_data_dir_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("years")).unwrap();
    let data = DataConfig {
        data_dir: dir.path().to_path_buf(),
        ..DataConfig::default()
    };
    assert!(Dataset::load(&data, &[]).await.is_err());
}

#[tokio::test]
async fn loaded_data_feeds_the_analytics() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_data_dir(dir.path());
    let dataset = Dataset::load(&data, &[2014]).await.unwrap();

    let query = StandingsQuery::season(2014)
        .with_class(ClassFilter::Exact("World Class".to_string()));
    let rows = compute_standings(&dataset.records, &dataset.aliases, &query);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].corps, "Blue Devils");
    assert_eq!(rows[1].corps, "The Cavaliers");
    assert_eq!(rows[1].performance_count, 2);

    let report = head_to_head(
        &dataset.records,
        &dataset.aliases,
        &dataset.boundaries,
        "Blue Devils",
        "The Cavaliers",
        &HeadToHeadOptions::default(),
    );
    assert_eq!(report.status, MeetingStatus::Met { meetings: 2 });
    assert_eq!(report.wins_a, 2);
}

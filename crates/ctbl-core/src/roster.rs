// League stats table ingestion and cleaning.
//
// Reads a CSV export of the league batting table (one row per player) and
// normalizes the placeholder cells the source site uses ("-" or empty) to 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Raw counting stats for one player, after cleaning.
///
/// `name` is the identity key; names are assumed unique within a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
    pub name: String,
    pub team: String,
    pub pa: u32,
    pub ab: u32,
    pub h: u32,
    pub doubles: u32,
    pub triples: u32,
    pub hr: u32,
    pub bb: u32,
    pub hbp: u32,
    pub so: u32,
}

/// One generation of the league table. Reloading produces a new `Dataset`;
/// records are never edited in place.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<PlayerRecord>,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    /// Rows dropped during cleaning because a numeric cell was malformed.
    pub skipped_rows: usize,
}

impl Dataset {
    pub fn new(records: Vec<PlayerRecord>, source: impl Into<String>) -> Self {
        Dataset {
            records,
            source: source.into(),
            loaded_at: Utc::now(),
            skipped_rows: 0,
        }
    }

    /// Distinct team names in first-seen order.
    pub fn teams(&self) -> Vec<String> {
        let mut teams: Vec<String> = Vec::new();
        for record in &self.records {
            if !teams.iter().any(|t| t == &record.team) {
                teams.push(record.team.clone());
            }
        }
        teams
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("column `{column}` has non-numeric value {value:?}")]
    InvalidValue { column: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Normalize one counting-stat cell.
///
/// `"-"` and blank cells mean "no data" on the source table and become 0.
/// Anything else must be a non-negative integer.
pub fn clean_count(column: &'static str, raw: &str) -> Result<u32, RosterError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(0);
    }
    trimmed.parse::<u32>().map_err(|_| RosterError::InvalidValue {
        column,
        value: trimmed.to_string(),
    })
}

/// Stats-table CSV row exactly as exported. Every stat is read as text so
/// placeholder cells survive deserialization; unknown columns are ignored.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawStatRow {
    Name: String,
    #[serde(default)]
    Team: String,
    #[serde(default)]
    PA: String,
    #[serde(default)]
    AB: String,
    #[serde(default)]
    H: String,
    #[serde(default, rename = "2B")]
    Doubles: String,
    #[serde(default, rename = "3B")]
    Triples: String,
    #[serde(default)]
    HR: String,
    #[serde(default)]
    BB: String,
    #[serde(default)]
    HBP: String,
    #[serde(default)]
    SO: String,
}

impl RawStatRow {
    fn clean(self) -> Result<PlayerRecord, RosterError> {
        Ok(PlayerRecord {
            name: self.Name.trim().to_string(),
            team: self.Team.trim().to_string(),
            pa: clean_count("PA", &self.PA)?,
            ab: clean_count("AB", &self.AB)?,
            h: clean_count("H", &self.H)?,
            doubles: clean_count("2B", &self.Doubles)?,
            triples: clean_count("3B", &self.Triples)?,
            hr: clean_count("HR", &self.HR)?,
            bb: clean_count("BB", &self.BB)?,
            hbp: clean_count("HBP", &self.HBP)?,
            so: clean_count("SO", &self.SO)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Returns the cleaned records and the number of rows that were skipped.
fn load_records_from_reader<R: Read>(rdr: R) -> Result<(Vec<PlayerRecord>, usize), csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let mut records = Vec::new();
    let mut skipped = 0;
    for result in reader.deserialize::<RawStatRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed stats row: {}", e);
                skipped += 1;
                continue;
            }
        };
        if raw.Name.trim().is_empty() {
            warn!("skipping stats row without a player name");
            skipped += 1;
            continue;
        }
        let name = raw.Name.trim().to_string();
        match raw.clean() {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("skipping '{}': {}", name, e);
                skipped += 1;
            }
        }
    }
    Ok((records, skipped))
}

/// Build a dataset from any reader. `source` is a label for logs and output.
pub fn load_dataset_from_reader<R: Read>(rdr: R, source: &str) -> Result<Dataset, RosterError> {
    let (records, skipped_rows) =
        load_records_from_reader(rdr).map_err(|e| RosterError::Csv {
            path: source.to_string(),
            source: e,
        })?;
    info!(
        "Loaded {} player rows from {} ({} skipped)",
        records.len(),
        source,
        skipped_rows
    );
    Ok(Dataset {
        skipped_rows,
        ..Dataset::new(records, source)
    })
}

/// Load the league stats table from a CSV file.
pub fn load_dataset(path: &Path) -> Result<Dataset, RosterError> {
    let file = std::fs::File::open(path).map_err(|e| RosterError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_dataset_from_reader(file, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

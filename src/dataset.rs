use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Columns every data source must provide.
pub const REQUIRED_COLUMNS: &[&str] = &["artist", "bucket", "jobs_count"];

/// Hard-coded sample shipped inside the binary (tab-separated).
const SAMPLE_TSV: &str = include_str!("../data/sample.tsv");

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Data file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("Malformed delimited data: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DatasetError>;

/// One (artist, bucket, count) row as read from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub artist: String,
    pub bucket: String,
    pub jobs_count: u64,
}

impl JobRecord {
    pub fn new(artist: &str, bucket: &str, jobs_count: u64) -> Self {
        Self {
            artist: artist.to_string(),
            bucket: bucket.to_string(),
            jobs_count,
        }
    }
}

/// A named collection of job records (one file, or the embedded sample).
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub records: Vec<JobRecord>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, records: Vec<JobRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Unique artist names, sorted ascending.
    pub fn artists(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.artist.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_artist(&self, artist: &str) -> bool {
        self.records.iter().any(|r| r.artist == artist)
    }
}

/// The embedded sample dataset.
pub fn embedded_sample() -> Dataset {
    let records = parse_delimited(SAMPLE_TSV, b'\t')
        .expect("embedded sample has all required columns");
    Dataset::new("sample", records)
}

/// Load a dataset from a delimited file. The dataset is named after the file stem.
pub fn load_file(path: &Path) -> Result<Dataset> {
    load_named(path, stem_name(path))
}

/// Load a dataset from a delimited file under an explicit name.
pub fn load_named(path: &Path, name: impl Into<String>) -> Result<Dataset> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path)?;
    let delimiter = delimiter_for(path, &text);
    let records = parse_delimited(&text, delimiter)?;
    let name = name.into();

    log::info!(
        "Loaded {} rows from {} (dataset \"{}\")",
        records.len(),
        path.display(),
        name
    );
    Ok(Dataset::new(name, records))
}

fn stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Dataset names for a set of files: the file stem, qualified with the parent
/// directory when two files share a stem ("a/jobs", "b/jobs"). Falls back to
/// the full path if that still clashes.
pub fn unique_names(paths: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = paths.iter().map(|p| stem_name(p)).collect();
    let qualified: Vec<String> = paths
        .iter()
        .zip(&stems)
        .map(|(path, stem)| {
            if stems.iter().filter(|s| *s == stem).count() < 2 {
                return stem.clone();
            }
            match path.parent().and_then(|p| p.file_name()) {
                Some(dir) => format!("{}/{}", dir.to_string_lossy(), stem),
                None => path.display().to_string(),
            }
        })
        .collect();

    qualified
        .iter()
        .zip(paths)
        .map(|(name, path)| {
            if qualified.iter().filter(|q| *q == name).count() < 2 {
                name.clone()
            } else {
                path.display().to_string()
            }
        })
        .collect()
}

/// Pick the delimiter from the extension, falling back to sniffing the header.
fn delimiter_for(path: &Path, text: &str) -> u8 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        Some("csv") => b',',
        _ => {
            let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
            if header.contains('\t') { b'\t' } else { b',' }
        }
    }
}

/// Parse delimited text with a header row into job records.
///
/// Fields may be quoted (`"Doe, Jane"`). Columns may appear in any order and
/// extra columns are ignored. Missing required columns fail the whole load;
/// bad `jobs_count` cells are coerced to 0. Bucket codes are passed through
/// untouched.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Vec<JobRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let header = reader.headers()?.clone();
    let column = |name: &str| header.iter().position(|h| h == name);
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|&c| column(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::Schema { missing });
    }

    // Presence checked above
    let (artist_idx, bucket_idx, count_idx) = (
        column("artist").unwrap_or_default(),
        column("bucket").unwrap_or_default(),
        column("jobs_count").unwrap_or_default(),
    );

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let cell = |i: usize| row.get(i).unwrap_or("");

        let raw_count = cell(count_idx);
        let jobs_count = coerce_count(raw_count);
        if jobs_count.is_none() {
            log::debug!(
                "Line {}: jobs_count {:?} is not a non-negative number, using 0",
                row.position().map(|p| p.line()).unwrap_or(0),
                raw_count
            );
        }

        records.push(JobRecord {
            artist: cell(artist_idx).to_string(),
            bucket: cell(bucket_idx).to_string(),
            jobs_count: jobs_count.unwrap_or(0),
        });
    }

    Ok(records)
}

/// Lenient count parsing: integers as-is, finite non-negative floats truncated.
/// Returns `None` for anything else (empty, text, negative).
fn coerce_count(raw: &str) -> Option<u64> {
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => Some(f.trunc() as u64),
        _ => None,
    }
}

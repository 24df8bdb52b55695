//! Artifacts produced by a fetch run and their file writers.

use std::fs::{self, Permissions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::config::{Env, OUTPUT_DIR_VAR};
use crate::filter::FilterCriteria;
use crate::model::{CompactRecord, Field, ListingFields, RawRecord, sort_by_schedule};

/// Every fetched listing, sorted.
pub const ALL_FILE: &str = "seoul_education_all.json";
/// Listings passing the area and status filter.
pub const V12_FILE: &str = "seoul_education_v12.json";
/// Listings additionally passing the usage-target filter.
pub const V123_FILE: &str = "seoul_education_v123.json";
/// CSV summary of the v12 listings.
pub const SUMMARY_FILE: &str = "seoul_education_summary.csv";

#[derive(thiserror::Error, Debug)]
/// Failures while persisting artifacts.
pub enum OutputError {
    /// Filesystem operation failed.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// JSON encoding failed.
    #[error("failed to encode {}: {source}", .path.display())]
    Json {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// CSV encoding failed.
    #[error("failed to encode {}: {source}", .path.display())]
    Csv {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Locations of the four artifacts.
pub struct ArtifactPaths {
    /// Full sorted listing.
    pub all: PathBuf,
    /// Compact v12 set.
    pub v12: PathBuf,
    /// Compact v123 set.
    pub v123: PathBuf,
    /// CSV summary of the v12 set.
    pub summary: PathBuf,
}

impl ArtifactPaths {
    /// Standard file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            all: dir.join(ALL_FILE),
            v12: dir.join(V12_FILE),
            v123: dir.join(V123_FILE),
            summary: dir.join(SUMMARY_FILE),
        }
    }

    /// Standard file names inside `$YEYAK_OUTPUT_DIR`, or the working directory.
    #[must_use]
    pub fn from_env(env: &Env) -> Self {
        Self::in_dir(env.non_empty(OUTPUT_DIR_VAR).unwrap_or("."))
    }
}

#[derive(Debug, Clone, Default)]
/// Everything a successful fetch run persists.
pub struct Artifacts {
    /// All listings sorted by schedule.
    pub all: Vec<RawRecord>,
    /// Compact listings passing stage one.
    pub v12: Vec<CompactRecord>,
    /// Compact listings passing both stages.
    pub v123: Vec<CompactRecord>,
}

impl Artifacts {
    /// Sort the fetched listings, filter them and project the filtered sets.
    #[must_use]
    pub fn build(mut records: Vec<RawRecord>, criteria: &FilterCriteria) -> Self {
        sort_by_schedule(&mut records);

        let sets = criteria.apply(&records);
        let v12 = sets.v12.iter().map(|&rec| CompactRecord::project(rec)).collect();
        let v123 = sets.v123.iter().map(|&rec| CompactRecord::project(rec)).collect();

        Self {
            all: records,
            v12,
            v123,
        }
    }

    /// Rows of the CSV summary: the v12 set, re-sorted by schedule.
    #[must_use]
    pub fn summary_rows(&self) -> Vec<CompactRecord> {
        let mut rows = self.v12.clone();
        sort_by_schedule(&mut rows);
        rows
    }

    /// Write all four artifacts, replacing previous versions.
    ///
    /// Every file is staged next to its target first; targets are only
    /// replaced once all of them were written successfully. The renames
    /// themselves happen one after another, so a rename failing midway
    /// leaves the earlier targets already replaced.
    ///
    /// Replaced files keep their previous permissions; new files get the
    /// usual `0644` on Unix.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputError`] when a directory, temporary file or target
    /// cannot be written.
    pub fn write(&self, paths: &ArtifactPaths) -> Result<(), OutputError> {
        let staged = [
            (stage_json(&paths.all, &self.all)?, &paths.all),
            (stage_json(&paths.v12, &self.v12)?, &paths.v12),
            (stage_json(&paths.v123, &self.v123)?, &paths.v123),
            (stage_summary(&paths.summary, &self.summary_rows())?, &paths.summary),
        ];

        for (file, target) in staged {
            file.persist(target).map_err(|err| OutputError::Io {
                path: target.clone(),
                source: err.error,
            })?;
        }

        tracing::info!(
            all = self.all.len(),
            v12 = self.v12.len(),
            v123 = self.v123.len(),
            "artifacts written"
        );
        Ok(())
    }
}

/// Write `value` as pretty-printed UTF-8 JSON, leaving non-ASCII text unescaped.
///
/// # Errors
///
/// Propagates serialization and I/O failures.
pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, value)
}

/// Write the CSV summary with its header row.
///
/// # Errors
///
/// Propagates encoding and I/O failures.
pub fn write_summary_csv<W: Write, R: ListingFields>(writer: W, rows: &[R]) -> csv::Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    csv.write_record(Field::SUMMARY.iter().map(|field| field.key()))?;
    for row in rows {
        csv.write_record(
            Field::SUMMARY
                .iter()
                .map(|&field| row.field(field).into_owned()),
        )?;
    }
    csv.flush()?;
    Ok(())
}

fn stage_json<T: Serialize + ?Sized>(target: &Path, value: &T) -> Result<NamedTempFile, OutputError> {
    let mut staged = temp_beside(target)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        write_json(&mut writer, value).map_err(|source| OutputError::Json {
            path: target.to_owned(),
            source,
        })?;
        writer.flush().map_err(io_error(target))?;
    }
    Ok(staged)
}

fn stage_summary(target: &Path, rows: &[CompactRecord]) -> Result<NamedTempFile, OutputError> {
    let mut staged = temp_beside(target)?;
    write_summary_csv(staged.as_file_mut(), rows).map_err(|source| OutputError::Csv {
        path: target.to_owned(),
        source,
    })?;
    Ok(staged)
}

fn temp_beside(target: &Path) -> Result<NamedTempFile, OutputError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let staged = NamedTempFile::new_in(dir).map_err(io_error(target))?;

    // Temporary files start out owner-only.
    if let Some(permissions) = target_permissions(target) {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(io_error(target))?;
    }
    Ok(staged)
}

fn target_permissions(target: &Path) -> Option<Permissions> {
    fs::metadata(target)
        .ok()
        .map(|meta| meta.permissions())
        .or_else(default_permissions)
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt as _;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.to_owned(),
        source,
    }
}

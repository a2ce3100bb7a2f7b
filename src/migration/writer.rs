// ABOUTME: Persists migration records as numbered .up.sql/.down.sql file pairs
// ABOUTME: Writes files atomically and records SHA-256 checksums in an optional manifest

use super::assembler::MigrationRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the manifest written next to the migrations
pub const MANIFEST_FILE: &str = "manifest.json";

/// A migration pair as it was written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenMigration {
    pub sequence: usize,
    pub name: String,
    pub up_file: String,
    pub down_file: String,
    pub up_sha256: String,
    pub down_sha256: String,
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub generator: String,
    pub source: Option<String>,
    pub migrations: Vec<WrittenMigration>,
}

/// File stem for a migration: zero-padded sequence, underscore, name
///
/// # Examples
///
/// ```
/// # use pg_dump_splitter::migration::file_stem;
/// assert_eq!(file_stem(1, "init_setup", 6), "000001_init_setup");
/// assert_eq!(file_stem(12, "create_users", 3), "012_create_users");
/// ```
pub fn file_stem(sequence: usize, name: &str, width: usize) -> String {
    format!("{:0width$}_{}", sequence, name, width = width)
}

/// Count `.sql` files already present in `dir` (zero if it does not exist)
pub fn existing_sql_files(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read output directory {}", dir.display()))?;

    let mut count = 0;
    for entry in entries {
        let entry = entry.context("Failed to read output directory entry")?;
        if entry.path().extension().is_some_and(|ext| ext == "sql") {
            count += 1;
        }
    }
    Ok(count)
}

/// Write every record as an up/down pair, numbering from 1
///
/// `on_written` is called after each pair lands on disk so callers can report
/// progress.
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or any file
/// cannot be written.
pub fn write_migrations(
    dir: &Path,
    records: &[MigrationRecord],
    sequence_width: usize,
    mut on_written: impl FnMut(&WrittenMigration),
) -> Result<Vec<WrittenMigration>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let sequence = idx + 1;
        let stem = file_stem(sequence, &record.name, sequence_width);
        let up_file = format!("{}.up.sql", stem);
        let down_file = format!("{}.down.sql", stem);

        let up_sha256 = write_sql_file(dir, &up_file, &record.up)?;
        let down_sha256 = write_sql_file(dir, &down_file, &record.down)?;

        let migration = WrittenMigration {
            sequence,
            name: record.name.clone(),
            up_file,
            down_file,
            up_sha256,
            down_sha256,
        };
        tracing::debug!("Wrote {} and {}", migration.up_file, migration.down_file);
        on_written(&migration);
        written.push(migration);
    }

    Ok(written)
}

/// Write `manifest.json` describing the written migrations
pub fn write_manifest(
    dir: &Path,
    source: Option<&Path>,
    migrations: &[WrittenMigration],
) -> Result<PathBuf> {
    let manifest = Manifest {
        generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        source: source.map(|p| p.display().to_string()),
        migrations: migrations.to_vec(),
    };

    let mut json =
        serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
    json.push('\n');

    write_atomic(dir, MANIFEST_FILE, json.as_bytes())?;
    Ok(dir.join(MANIFEST_FILE))
}

/// Write one SQL file (newline-terminated when non-empty), returning its hex SHA-256
fn write_sql_file(dir: &Path, file_name: &str, sql: &str) -> Result<String> {
    let mut contents = sql.to_string();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }

    write_atomic(dir, file_name, contents.as_bytes())?;
    Ok(format!("{:x}", Sha256::digest(contents.as_bytes())))
}

/// Write through a temp file in the same directory so readers never see a partial file
fn write_atomic(dir: &Path, file_name: &str, contents: &[u8]) -> Result<()> {
    let path = dir.join(file_name);

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tmp.persist(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

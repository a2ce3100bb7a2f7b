// ABOUTME: Split command turning a pg_dump file into numbered migration file pairs
// ABOUTME: Reads the dump, plans migrations, confirms overwrites, and writes files with progress

use crate::config::SplitConfig;
use crate::migration::{self, SplitPlan, WrittenMigration};
use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Options for a split run
#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: SplitConfig,
    /// Skip the confirmation prompt when the output directory already has SQL files
    pub skip_confirmation: bool,
    /// Also write `manifest.json` with per-file checksums
    pub write_manifest: bool,
}

/// Outcome of a split run
#[derive(Debug, Clone)]
pub struct SplitSummary {
    pub plan: SplitPlan,
    pub written: Vec<WrittenMigration>,
    pub manifest: Option<PathBuf>,
}

/// Split a dump file into migration pairs
///
/// Runs in three steps:
/// 1. Reads the whole dump into memory
/// 2. Plans the migrations (scan, group, assemble)
/// 3. Writes one `.up.sql`/`.down.sql` pair per migration, numbered from 1
///
/// If the output directory already contains `.sql` files the user is asked
/// to confirm, since same-named files are overwritten.
///
/// # Errors
///
/// This function will return an error if:
/// - The configuration is invalid
/// - The dump cannot be read (missing file, not UTF-8)
/// - The user declines the overwrite prompt
/// - The output directory or any file cannot be written
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use pg_dump_splitter::commands::{split, SplitOptions};
/// # use pg_dump_splitter::config::SplitConfig;
/// # fn example() -> Result<()> {
/// let summary = split(&SplitOptions {
///     input: "db.sql".into(),
///     output: "migrations".into(),
///     config: SplitConfig::default(),
///     skip_confirmation: true,
///     write_manifest: false,
/// })?;
/// println!("{} migration pair(s)", summary.written.len());
/// # Ok(())
/// # }
/// ```
pub fn split(options: &SplitOptions) -> Result<SplitSummary> {
    tracing::info!("Starting dump split...");
    options.config.validate()?;

    tracing::info!("Step 1/3: Reading dump {}...", options.input.display());
    let dump = read_dump(&options.input)?;
    tracing::info!("✓ Read {} bytes", dump.len());

    tracing::info!("Step 2/3: Planning migrations...");
    let plan = migration::plan_migrations(&dump, &options.config);
    log_plan(&plan);

    let existing = migration::existing_sql_files(&options.output)?;
    if existing > 0 && !options.skip_confirmation && !confirm_overwrite(&options.output, existing)?
    {
        bail!("Split cancelled by user");
    }

    tracing::info!(
        "Step 3/3: Writing {} migration pair(s) to {}...",
        plan.records.len(),
        options.output.display()
    );
    let progress = ProgressBar::new(plan.records.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );

    let written = migration::write_migrations(
        &options.output,
        &plan.records,
        options.config.sequence_width,
        |m| {
            progress.inc(1);
            progress.set_message(m.name.clone());
            tracing::info!("  Created {} and {}", m.up_file, m.down_file);
        },
    )?;
    progress.finish_with_message("done");

    let manifest = if options.write_manifest {
        let path = migration::write_manifest(&options.output, Some(&options.input), &written)?;
        tracing::info!("✓ Manifest written to {}", path.display());
        Some(path)
    } else {
        None
    };

    tracing::info!(
        "✅ Split complete: {} migration pair(s) in {}",
        written.len(),
        options.output.display()
    );

    Ok(SplitSummary {
        plan,
        written,
        manifest,
    })
}

/// Read a dump file as UTF-8 text
pub(crate) fn read_dump(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dump file {}", path.display()))
}

fn log_plan(plan: &SplitPlan) {
    tracing::info!(
        "✓ {} table(s), {} global statement(s), {} foreign key(s), {} seed row(s)",
        plan.table_count,
        plan.global_count,
        plan.foreign_key_count,
        plan.report.seed_rows
    );

    if plan.report.dropped_data_blocks > 0 {
        tracing::warn!(
            "⚠ {} data block(s) dropped: their tables were never defined, rows are lost",
            plan.report.dropped_data_blocks
        );
    }
    if plan.report.dropped_unowned > 0 {
        tracing::warn!(
            "⚠ {} index/trigger/constraint block(s) dropped: owning table not found",
            plan.report.dropped_unowned
        );
    }
    if plan.report.schema_conflicts > 0 {
        tracing::warn!(
            "⚠ {} table block(s) merged with a same-named table from another schema",
            plan.report.schema_conflicts
        );
    }
    if plan.report.discarded_blank_rows > 0 {
        tracing::warn!(
            "⚠ {} blank COPY row(s) inside data sections skipped as blank lines",
            plan.report.discarded_blank_rows
        );
    }
    if plan.report.empty_data_blocks > 0 {
        tracing::warn!(
            "⚠ {} data block(s) produced no inserts (no rows or unparsable COPY header)",
            plan.report.empty_data_blocks
        );
    }
}

fn confirm_overwrite(output: &Path, existing: usize) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "{} already contains {} .sql file(s); files with matching names will be overwritten. Continue?",
            output.display(),
            existing
        ))
        .default(false)
        .interact()
        .context("Failed to get overwrite confirmation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_split_missing_input_fails() {
        let dir = tempdir().unwrap();
        let options = SplitOptions {
            input: dir.path().join("missing.sql"),
            output: dir.path().join("out"),
            config: SplitConfig::default(),
            skip_confirmation: true,
            write_manifest: false,
        };

        let err = split(&options).unwrap_err();
        assert!(err.to_string().contains("Failed to read dump file"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_split_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("dump.sql");
        std::fs::write(&input, "SELECT 1;\n").unwrap();

        let options = SplitOptions {
            input,
            output: dir.path().join("out"),
            config: SplitConfig {
                batch_size: 0,
                ..SplitConfig::default()
            },
            skip_confirmation: true,
            write_manifest: false,
        };
        assert!(split(&options).is_err());
    }

    #[test]
    fn test_split_writes_manifest() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("dump.sql");
        std::fs::write(
            &input,
            "SET x = 1;\n-- Name: t; Type: TABLE; Schema: public; Owner: app\nCREATE TABLE public.t ();\n",
        )
        .unwrap();

        let options = SplitOptions {
            input,
            output: dir.path().join("out"),
            config: SplitConfig::default(),
            skip_confirmation: true,
            write_manifest: true,
        };
        let summary = split(&options).unwrap();

        assert_eq!(summary.written.len(), 2);
        let manifest = summary.manifest.unwrap();
        assert!(manifest.ends_with(migration::MANIFEST_FILE));
        assert!(manifest.exists());
    }
}

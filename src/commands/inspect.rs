// ABOUTME: Inspect command showing how a dump would be split without writing files
// ABOUTME: Prints the block census, planned migrations with sizes, and dropped-block counts

use super::split::read_dump;
use crate::config::SplitConfig;
use crate::migration::{self, file_stem, SplitPlan};
use crate::utils::format_bytes;
use anyhow::Result;
use std::path::Path;

/// Dry-run a split and print the plan
///
/// Reads the dump, runs the same planning pipeline as `split`, and prints
/// two tables to stdout: blocks found per object kind, and the migration
/// files that would be written with the size of each side.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the dump cannot be read.
pub fn inspect(input: &Path, config: &SplitConfig) -> Result<SplitPlan> {
    config.validate()?;

    tracing::info!("Inspecting dump {}...", input.display());
    let dump = read_dump(input)?;
    let plan = migration::plan_migrations(&dump, config);

    println!();
    println!("{:<24} {:>8}", "Block kind", "Count");
    println!("{}", "─".repeat(33));
    for (kind, count) in &plan.census {
        println!("{:<24} {:>8}", kind, count);
    }
    println!("{}", "─".repeat(33));
    println!("Total: {} block(s)", plan.report.blocks);

    println!();
    println!("{:<48} {:>10} {:>10}", "Migration", "Up", "Down");
    println!("{}", "─".repeat(70));
    for (idx, record) in plan.records.iter().enumerate() {
        println!(
            "{:<48} {:>10} {:>10}",
            file_stem(idx + 1, &record.name, config.sequence_width),
            format_bytes(record.up.len() as u64),
            format_bytes(record.down.len() as u64)
        );
    }
    println!("{}", "─".repeat(70));
    println!(
        "{} migration pair(s): {} table(s), {} foreign key(s), {} seed row(s) in {} insert statement(s)",
        plan.records.len(),
        plan.table_count,
        plan.foreign_key_count,
        plan.report.seed_rows,
        plan.report.seed_statements
    );

    let report = &plan.report;
    if report.dropped() > 0
        || report.empty_data_blocks > 0
        || report.discarded_blank_rows > 0
        || report.schema_conflicts > 0
    {
        println!();
        println!(
            "Dropped: {} data block(s) for undefined tables, {} unowned index/trigger/constraint block(s)",
            report.dropped_data_blocks, report.dropped_unowned
        );
        println!(
            "Empty:   {} data block(s) without rows or with an unparsable COPY header",
            report.empty_data_blocks
        );
        println!(
            "Skipped: {} blank COPY row(s) inside data sections",
            report.discarded_blank_rows
        );
        println!(
            "Merged:  {} table block(s) sharing a name with a table in another schema",
            report.schema_conflicts
        );
    }
    println!();

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_inspect_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("dump.sql");
        std::fs::write(
            &input,
            "-- Name: t; Type: TABLE; Schema: public; Owner: app\nCREATE TABLE public.t ();\n\
             -- Data for Name: missing; Type: TABLE DATA; Schema: public; Owner: app\n\
             COPY public.missing (a) FROM stdin;\n1\n\\.\n",
        )
        .unwrap();

        let plan = inspect(&input, &SplitConfig::default()).unwrap();

        assert_eq!(plan.records.len(), 2);
        assert_eq!(plan.census.get("TABLE"), Some(&1));
        assert_eq!(plan.census.get("TABLE DATA"), Some(&1));
        assert_eq!(plan.report.dropped_data_blocks, 1);
        assert_eq!(plan.report.discarded_blank_rows, 0);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}

// ABOUTME: Migration planning module: groups dump blocks and assembles migration pairs
// ABOUTME: Exposes the end-to-end plan builder plus the file writer used by the CLI

pub mod assembler;
pub mod grouper;
pub mod writer;

pub use assembler::{assemble, MigrationRecord, SEED_SECTION_MARKER};
pub use grouper::{group_blocks, GlobalBucket, GroupReport, GroupedDump, Grouper, TableBucket};
pub use writer::{
    existing_sql_files, file_stem, write_manifest, write_migrations, Manifest, WrittenMigration,
    MANIFEST_FILE,
};

use crate::config::SplitConfig;
use crate::dump;
use std::collections::BTreeMap;

/// Everything learned from one dump: the ordered records plus diagnostics
#[derive(Debug, Clone)]
pub struct SplitPlan {
    pub records: Vec<MigrationRecord>,
    pub report: GroupReport,
    /// Number of blocks seen per object kind label
    pub census: BTreeMap<String, usize>,
    pub table_count: usize,
    pub foreign_key_count: usize,
    pub global_count: usize,
}

/// Run the full pipeline over a dump held in memory
///
/// Splits off the preamble, scans the rest into blocks, groups them and
/// assembles the migration records. Never fails: malformed or unmapped
/// content shrinks the output and is counted in [`SplitPlan::report`].
///
/// # Examples
///
/// ```
/// # use pg_dump_splitter::config::SplitConfig;
/// # use pg_dump_splitter::migration::plan_migrations;
/// let dump = "\
/// SET client_encoding = 'UTF8';
/// -- Name: users; Type: TABLE; Schema: public; Owner: app
/// CREATE TABLE public.users (id integer);
/// ";
/// let plan = plan_migrations(dump, &SplitConfig::default());
/// let names: Vec<_> = plan.records.iter().map(|r| r.name.as_str()).collect();
/// assert_eq!(names, ["init_setup", "create_users"]);
/// ```
pub fn plan_migrations(dump_text: &str, config: &SplitConfig) -> SplitPlan {
    let (prefix, rest) = dump::split_prefix(dump_text);
    let blocks = dump::scan(rest);
    tracing::debug!(
        "Scanned {} block(s) after a {}-byte preamble",
        blocks.len(),
        prefix.len()
    );

    let mut census = BTreeMap::new();
    for block in &blocks {
        *census.entry(block.kind_label().to_string()).or_insert(0) += 1;
    }

    let grouped = group_blocks(prefix, blocks, config);
    let records = assemble(&grouped, config);

    SplitPlan {
        table_count: grouped.tables.len(),
        foreign_key_count: grouped.foreign_keys.len(),
        global_count: grouped.globals.statements.len(),
        report: grouped.report,
        census,
        records,
    }
}

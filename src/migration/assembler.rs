// ABOUTME: Assembles grouped dump buckets into ordered up/down migration records
// ABOUTME: Emits init setup first, one record per table alphabetically, foreign keys last

use super::grouper::{GroupedDump, TableBucket};
use crate::config::SplitConfig;
use crate::utils::{quote_ident, slugify};

/// Comment separating a table's DDL from its generated seed inserts
pub const SEED_SECTION_MARKER: &str = "-- SEED DATA --";

const FOREIGN_KEYS_DOWN_NOTE: &str =
    "-- Foreign keys are not dropped individually; dropping their tables removes them.";

/// One forward/backward migration pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub name: String,
    pub up: String,
    pub down: String,
}

/// Build the ordered migration list from a grouped dump
///
/// Order is fixed:
/// 1. `init_name`: dump preamble followed by global statements (empty down)
/// 2. `create_<table>` for every table, alphabetically by table name; the
///    down migration drops the table in the schema its marker named
/// 3. `foreign_keys_name`, only when foreign keys were found
pub fn assemble(grouped: &GroupedDump, config: &SplitConfig) -> Vec<MigrationRecord> {
    let mut records = Vec::with_capacity(grouped.tables.len() + 2);

    let mut init = Vec::with_capacity(grouped.globals.statements.len() + 1);
    init.push(grouped.globals.prefix.as_str());
    init.extend(grouped.globals.statements.iter().map(String::as_str));
    records.push(MigrationRecord {
        name: config.init_name.clone(),
        up: join_sections(init),
        down: String::new(),
    });

    let mut table_names: Vec<&String> = grouped.tables.keys().collect();
    table_names.sort();

    for name in table_names {
        let bucket = &grouped.tables[name];
        records.push(MigrationRecord {
            name: format!("create_{}", slugify(name)),
            up: table_up(bucket),
            down: format!(
                "DROP TABLE IF EXISTS {}.{};",
                quote_ident(bucket.schema_or(&config.schema)),
                quote_ident(name)
            ),
        });
    }

    if !grouped.foreign_keys.is_empty() {
        records.push(MigrationRecord {
            name: config.foreign_keys_name.clone(),
            up: join_sections(grouped.foreign_keys.iter().map(String::as_str)),
            down: FOREIGN_KEYS_DOWN_NOTE.to_string(),
        });
    }

    records
}

fn table_up(bucket: &TableBucket) -> String {
    let mut sections: Vec<&str> = Vec::new();
    for list in [
        &bucket.create,
        &bucket.constraints,
        &bucket.indexes,
        &bucket.triggers,
    ] {
        sections.extend(list.iter().map(String::as_str));
    }

    if !bucket.seeds.is_empty() {
        sections.push(SEED_SECTION_MARKER);
        sections.extend(bucket.seeds.iter().map(String::as_str));
    }

    join_sections(sections)
}

/// Join non-empty sections with a blank line, trimming trailing whitespace
fn join_sections<'s>(sections: impl IntoIterator<Item = &'s str>) -> String {
    sections
        .into_iter()
        .map(str::trim_end)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

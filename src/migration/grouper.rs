// ABOUTME: Classifies scanned dump blocks into per-table, foreign-key and global buckets
// ABOUTME: Resolves index/trigger/constraint owners and transcodes seed data per table

use crate::config::SplitConfig;
use crate::dump::{Block, CopyBlock, ObjectKind};
use crate::utils::sanitize_identifier;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

const IDENT: &str = r#""(?:[^"]|"")+"|\w+"#;

static RE_ON_RELATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\bON\s+(?:ONLY\s+)?(?P<schema>{IDENT})\.(?P<table>{IDENT})"
    ))
    .expect("Invalid regex")
});
static RE_ALTER_TABLE_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"ALTER TABLE ONLY\s+(?P<schema>{IDENT})\.(?P<table>{IDENT})"
    ))
    .expect("Invalid regex")
});

/// Statements belonging to one table, kept in emission order by category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBucket {
    /// Schema from the first `TABLE` marker; `None` means the configured schema
    pub schema: Option<String>,
    /// Table definition blocks (DDL, comments) in encounter order
    pub create: Vec<String>,
    /// Non-foreign-key constraints (primary keys, unique, check)
    pub constraints: Vec<String>,
    pub indexes: Vec<String>,
    pub triggers: Vec<String>,
    /// Rendered INSERT statements
    pub seeds: Vec<String>,
}

impl TableBucket {
    /// Schema the table lives in, falling back to `default_schema`
    pub fn schema_or<'s>(&'s self, default_schema: &'s str) -> &'s str {
        self.schema.as_deref().unwrap_or(default_schema)
    }
}

/// Dump preamble plus extensions, types, functions and unclassified content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalBucket {
    pub prefix: String,
    pub statements: Vec<String>,
}

/// Counters describing what the grouper kept and what it dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupReport {
    pub blocks: usize,
    pub seed_rows: usize,
    pub seed_statements: usize,
    /// Data blocks whose COPY header was missing/unparsable or that had no rows
    pub empty_data_blocks: usize,
    /// Empty or whitespace-only lines inside COPY data, skipped as blank
    pub discarded_blank_rows: usize,
    /// Data blocks for tables that were never defined
    pub dropped_data_blocks: usize,
    /// Index, trigger and constraint blocks with no resolvable owning table
    pub dropped_unowned: usize,
    /// `TABLE` blocks merged into a same-named table from another schema
    pub schema_conflicts: usize,
}

impl GroupReport {
    pub fn dropped(&self) -> usize {
        self.dropped_data_blocks + self.dropped_unowned
    }
}

/// Fully classified dump, ready for assembly
#[derive(Debug, Clone, Default)]
pub struct GroupedDump {
    pub tables: HashMap<String, TableBucket>,
    pub foreign_keys: Vec<String>,
    pub globals: GlobalBucket,
    pub report: GroupReport,
}

/// Streaming classifier fed one block at a time in dump order
pub struct Grouper<'a> {
    config: &'a SplitConfig,
    grouped: GroupedDump,
}

impl<'a> Grouper<'a> {
    pub fn new(prefix: &str, config: &'a SplitConfig) -> Self {
        let mut grouped = GroupedDump::default();
        grouped.globals.prefix = prefix.to_string();
        Self { config, grouped }
    }

    /// Route one block into its bucket
    pub fn push(&mut self, block: Block) {
        self.grouped.report.blocks += 1;

        match block.kind.clone() {
            Some(ObjectKind::Table) if block.name.is_some() => self.push_table(block),
            Some(ObjectKind::TableData) => self.push_data(block.name, &block.content),
            Some(ObjectKind::Index) => {
                let owner = self.owning_table(&RE_ON_RELATION, &block.content);
                self.push_owned(owner, block.content, |bucket| &mut bucket.indexes, "INDEX");
            }
            Some(ObjectKind::Trigger) => {
                let owner = self.owning_table(&RE_ON_RELATION, &block.content);
                self.push_owned(owner, block.content, |bucket| &mut bucket.triggers, "TRIGGER");
            }
            Some(ObjectKind::Constraint) => self.push_constraint(block.content),
            _ => self.push_global(block),
        }
    }

    pub fn finish(self) -> GroupedDump {
        self.grouped
    }

    fn push_global(&mut self, block: Block) {
        if !block.is_blank() {
            self.grouped.globals.statements.push(block.content);
        }
    }

    fn push_table(&mut self, block: Block) {
        let Block {
            name,
            schema,
            content,
            ..
        } = block;
        let Some(name) = name else {
            return;
        };

        match self.grouped.tables.entry(name) {
            Entry::Vacant(entry) => {
                entry.insert(TableBucket {
                    schema,
                    create: vec![content],
                    ..TableBucket::default()
                });
            }
            Entry::Occupied(mut entry) => {
                let existing = entry.get().schema_or(&self.config.schema).to_string();
                let incoming = schema.as_deref().unwrap_or(&self.config.schema);
                if existing != incoming {
                    tracing::warn!(
                        "⚠ Table '{}' in schema '{}' merged into the migration for '{}.{}'; \
                         its down migration only drops the latter",
                        sanitize_identifier(entry.key()),
                        sanitize_identifier(incoming),
                        sanitize_identifier(&existing),
                        sanitize_identifier(entry.key())
                    );
                    self.grouped.report.schema_conflicts += 1;
                }
                entry.get_mut().create.push(content);
            }
        }
    }

    fn push_data(&mut self, name: Option<String>, content: &str) {
        let bucket = match name.as_deref() {
            Some(table) => self.grouped.tables.get_mut(table),
            None => None,
        };
        let Some(bucket) = bucket else {
            tracing::warn!(
                "⚠ Dropping data for '{}': no table definition precedes it",
                sanitize_identifier(name.as_deref().unwrap_or("<unnamed>"))
            );
            self.grouped.report.dropped_data_blocks += 1;
            return;
        };

        let Some(copy) = CopyBlock::parse(content) else {
            self.grouped.report.empty_data_blocks += 1;
            return;
        };
        self.grouped.report.discarded_blank_rows += copy.blank_rows;

        if copy.rows.is_empty() {
            self.grouped.report.empty_data_blocks += 1;
            return;
        }

        let statements = copy.to_inserts(self.config.batch_size);
        self.grouped.report.seed_rows += copy.rows.len();
        self.grouped.report.seed_statements += statements.len();
        bucket.seeds.push(statements.join("\n\n"));
    }

    fn push_constraint(&mut self, content: String) {
        let Some(table) = self.owning_table(&RE_ALTER_TABLE_ONLY, &content) else {
            tracing::debug!("Dropping CONSTRAINT block with no ALTER TABLE ONLY owner");
            self.grouped.report.dropped_unowned += 1;
            return;
        };

        if content.contains("FOREIGN KEY") {
            self.grouped.foreign_keys.push(content);
        } else {
            self.push_owned(
                Some(table),
                content,
                |bucket| &mut bucket.constraints,
                "CONSTRAINT",
            );
        }
    }

    fn push_owned(
        &mut self,
        owner: Option<String>,
        content: String,
        list: impl FnOnce(&mut TableBucket) -> &mut Vec<String>,
        label: &str,
    ) {
        let bucket = match owner {
            Some(table) => self.grouped.tables.get_mut(&table),
            None => None,
        };
        match bucket {
            Some(bucket) => list(bucket).push(content),
            None => {
                tracing::debug!("Dropping {} block with no known owning table", label);
                self.grouped.report.dropped_unowned += 1;
            }
        }
    }

    /// Resolve the table a statement belongs to from its `<schema>.<table>` references
    ///
    /// A reference matching a known table in that table's own schema wins.
    /// Otherwise the first reference in the configured schema to a table that
    /// was never defined is returned (foreign keys do not need a bucket).
    fn owning_table(&self, pattern: &Regex, content: &str) -> Option<String> {
        let mut fallback = None;
        for caps in pattern.captures_iter(content) {
            let schema = unquote(&caps["schema"]);
            let table = unquote(&caps["table"]);

            match self.grouped.tables.get(&table) {
                Some(bucket) if bucket.schema_or(&self.config.schema) == schema => {
                    return Some(table);
                }
                // Same name, different schema: not this table
                Some(_) => {}
                None if fallback.is_none() && schema == self.config.schema => {
                    fallback = Some(table);
                }
                None => {}
            }
        }
        fallback
    }
}

/// Classify a block sequence in one pass
pub fn group_blocks(
    prefix: &str,
    blocks: impl IntoIterator<Item = Block>,
    config: &SplitConfig,
) -> GroupedDump {
    let mut grouper = Grouper::new(prefix, config);
    for block in blocks {
        grouper.push(block);
    }
    grouper.finish()
}

/// Strip identifier quotes, collapsing doubled quotes
fn unquote(ident: &str) -> String {
    match ident
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\"\"", "\""),
        None => ident.to_string(),
    }
}

// ABOUTME: Transcodes pg_dump COPY ... FROM stdin sections into batched INSERT statements
// ABOUTME: Handles NULL sentinels, quote escaping, and size-bounded batches

use once_cell::sync::Lazy;
use regex::Regex;

/// Number of value tuples per generated INSERT statement
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Text-format NULL sentinel written by COPY
const NULL_SENTINEL: &str = "\\N";
const COPY_KEYWORD: &str = "COPY ";
const COPY_TERMINATOR: &str = "\\.";

static RE_COPY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^COPY (.+?) \((.+?)\) FROM \S+;").expect("Invalid regex")
});

/// Convert one COPY text-format field into a SQL literal
///
/// The NULL sentinel `\N` becomes `NULL`; anything else is single-quoted with
/// embedded quotes doubled. Backslash escapes such as `\t`, `\n` or `\\` are
/// passed through untouched, so fields containing them are not decoded.
///
/// # Examples
///
/// ```
/// # use pg_dump_splitter::dump::escape_value;
/// assert_eq!(escape_value("\\N"), "NULL");
/// assert_eq!(escape_value("O'Brien"), "'O''Brien'");
/// assert_eq!(escape_value(""), "''");
/// ```
pub fn escape_value(raw: &str) -> String {
    if raw == NULL_SENTINEL {
        return "NULL".to_string();
    }
    format!("'{}'", raw.replace('\'', "''"))
}

/// A parsed COPY section: target relation, column list and raw rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyBlock {
    /// Relation exactly as written in the header, e.g. `public.users`
    pub relation: String,
    /// Parenthesised column list without the parentheses, unparsed
    pub columns: String,
    pub rows: Vec<String>,
    /// Whitespace-only lines inside the data section that were skipped as blank
    pub blank_rows: usize,
}

impl CopyBlock {
    /// Parse the text of a `TABLE DATA` block
    ///
    /// The first line starting with `COPY ` is the header; every other line
    /// that is not blank, not a `--` comment and not the `\.` terminator is a
    /// data row. Returns `None` when there is no header or it does not have
    /// the `COPY <relation> (<columns>) FROM <source>;` shape.
    ///
    /// Blank lines between the header and the terminator may be real rows of
    /// empty strings (`\t` in a two-column table); they are still skipped but
    /// counted in [`CopyBlock::blank_rows`].
    pub fn parse(content: &str) -> Option<Self> {
        let mut header = None;
        let mut in_data = false;
        let mut rows = Vec::new();
        let mut blank_rows = 0;

        for line in content.lines() {
            if header.is_none() && line.starts_with(COPY_KEYWORD) {
                header = Some(line);
                in_data = true;
            } else if line.starts_with(COPY_TERMINATOR) {
                in_data = false;
            } else if line.trim().is_empty() {
                if in_data || !line.is_empty() {
                    blank_rows += 1;
                }
            } else if !line.starts_with("--") {
                rows.push(line.to_string());
            }
        }

        if blank_rows > 0 {
            tracing::debug!("Skipped {} blank COPY row(s)", blank_rows);
        }

        let Some(header) = header else {
            tracing::debug!("TABLE DATA block has no COPY header");
            return None;
        };

        let Some(caps) = RE_COPY_HEADER.captures(header) else {
            tracing::warn!("⚠ Could not parse COPY header: {}", header);
            return None;
        };

        Some(Self {
            relation: caps[1].to_string(),
            columns: caps[2].to_string(),
            rows,
            blank_rows,
        })
    }

    /// Render each row as a parenthesised tuple of escaped literals
    pub fn tuples(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.split('\t').map(escape_value).collect();
                format!("({})", values.join(", "))
            })
            .collect()
    }

    /// Render the rows as INSERT statements of at most `batch_size` tuples
    ///
    /// A `batch_size` of zero is treated as one tuple per statement.
    pub fn to_inserts(&self, batch_size: usize) -> Vec<String> {
        let tuples = self.tuples();
        tuples
            .chunks(batch_size.max(1))
            .map(|chunk| {
                format!(
                    "INSERT INTO {} ({}) VALUES\n{};",
                    self.relation,
                    self.columns,
                    chunk.join(",\n")
                )
            })
            .collect()
    }
}

/// Rewrite a `TABLE DATA` block as INSERT statements separated by blank lines
///
/// Returns an empty string when the block has no usable header or no rows;
/// callers treat that as "no seed data" rather than an error.
///
/// # Examples
///
/// ```
/// # use pg_dump_splitter::dump::copy_to_inserts;
/// let block = "COPY public.t (a, b) FROM stdin;\n1\tx\n2\t\\N\n\\.\n";
/// assert_eq!(
///     copy_to_inserts(block, 1000),
///     "INSERT INTO public.t (a, b) VALUES\n('1', 'x'),\n('2', NULL);"
/// );
/// ```
pub fn copy_to_inserts(content: &str, batch_size: usize) -> String {
    match CopyBlock::parse(content) {
        Some(block) => block.to_inserts(batch_size).join("\n\n"),
        None => String::new(),
    }
}

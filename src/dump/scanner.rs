// ABOUTME: Line-oriented scanner that partitions a pg_dump into marker-delimited blocks
// ABOUTME: Preserves every input byte so blocks concatenate back to the original text

use super::block::{Block, ObjectKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix of the comment pg_dump writes ahead of every schema object
pub const OBJECT_MARKER: &str = "-- Name:";
/// Prefix of the comment pg_dump writes ahead of every COPY data section
pub const DATA_MARKER: &str = "-- Data for Name:";

static RE_OBJECT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-- Name: (.+?); Type: (.+?);").expect("Invalid regex"));
static RE_DATA_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-- Data for Name: (.+?); Type: (.+?);").expect("Invalid regex"));
static RE_MARKER_SCHEMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"; Schema: ([^;\r\n]+)").expect("Invalid regex"));

fn is_marker(line: &str) -> bool {
    line.starts_with(OBJECT_MARKER) || line.starts_with(DATA_MARKER)
}

/// `Schema:` field of a marker line; pg_dump writes `-` for schema-less objects
fn marker_schema(line: &str) -> Option<String> {
    RE_MARKER_SCHEMA
        .captures(line)
        .map(|caps| caps[1].trim().to_string())
        .filter(|schema| !schema.is_empty() && schema != "-")
}

/// Split a dump into its preamble and the marker-delimited remainder
///
/// The preamble is everything before the first line that starts with an object
/// or data marker (the `SET ...` statements and header comments pg_dump emits).
/// A dump with no markers at all has an empty preamble and is returned whole
/// as the remainder.
///
/// # Examples
///
/// ```
/// # use pg_dump_splitter::dump::split_prefix;
/// let dump = "SET client_encoding = 'UTF8';\n-- Name: t; Type: TABLE; Schema: public\nCREATE TABLE t ();\n";
/// let (prefix, rest) = split_prefix(dump);
/// assert_eq!(prefix, "SET client_encoding = 'UTF8';\n");
/// assert!(rest.starts_with("-- Name: t;"));
/// ```
pub fn split_prefix(dump: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in dump.split_inclusive('\n') {
        if is_marker(line) {
            return dump.split_at(offset);
        }
        offset += line.len();
    }
    ("", dump)
}

/// Block currently being accumulated by the scanner
struct Accumulator {
    kind: Option<ObjectKind>,
    name: Option<String>,
    schema: Option<String>,
    buffer: String,
    blocks: Vec<Block>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            kind: None,
            name: None,
            schema: None,
            buffer: String::new(),
            blocks: Vec::new(),
        }
    }

    /// Emit the buffered block, if it has any content
    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.blocks.push(Block {
            kind: self.kind.take(),
            name: self.name.take(),
            schema: self.schema.take(),
            content: std::mem::take(&mut self.buffer),
        });
    }

    /// Close the current block and open a new one with `marker` as its first line
    fn start(&mut self, kind: Option<ObjectKind>, name: Option<String>, marker: &str) {
        self.flush();
        self.schema = name.as_ref().and_then(|_| marker_schema(marker));
        self.kind = kind;
        self.name = name;
        self.buffer.push_str(marker);
    }

    fn push(&mut self, line: &str) {
        self.buffer.push_str(line);
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

/// Scan a dump (preamble already removed) into typed blocks
///
/// Object markers (`-- Name: x; Type: TABLE; ...`) and data markers
/// (`-- Data for Name: x; Type: TABLE DATA; ...`) each open a new block; the
/// marker stays as the block's first line. A marker whose fields cannot be
/// parsed still opens a block, just without a kind, name or schema. Data markers are
/// always typed [`ObjectKind::TableData`] regardless of their `Type:` field.
///
/// Every input line lands in exactly one block, in order, so concatenating
/// the block contents reproduces the input byte for byte.
pub fn scan(text: &str) -> Vec<Block> {
    let mut acc = Accumulator::new();

    for line in text.split_inclusive('\n') {
        if line.starts_with(OBJECT_MARKER) {
            match RE_OBJECT_MARKER.captures(line) {
                Some(caps) => acc.start(
                    Some(ObjectKind::from_label(&caps[2])),
                    Some(caps[1].trim().to_string()),
                    line,
                ),
                None => {
                    tracing::debug!("Unparsed object marker: {}", line.trim_end());
                    acc.start(None, None, line);
                }
            }
        } else if line.starts_with(DATA_MARKER) {
            let name = RE_DATA_MARKER
                .captures(line)
                .map(|caps| caps[1].trim().to_string());
            if name.is_none() {
                tracing::debug!("Unparsed data marker: {}", line.trim_end());
            }
            acc.start(Some(ObjectKind::TableData), name, line);
        } else {
            acc.push(line);
        }
    }

    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
--
-- PostgreSQL database dump
--

SET statement_timeout = 0;

--
-- Name: users; Type: TABLE; Schema: public; Owner: app
--

CREATE TABLE public.users (
    id integer NOT NULL
);

--
-- Data for Name: users; Type: TABLE DATA; Schema: public; Owner: app
--

COPY public.users (id) FROM stdin;
1
\\.

";

    #[test]
    fn test_split_prefix_stops_at_first_marker() {
        let (prefix, rest) = split_prefix(DUMP);
        assert!(prefix.ends_with("SET statement_timeout = 0;\n\n--\n"));
        assert!(rest.starts_with("-- Name: users; Type: TABLE;"));
        assert_eq!(format!("{}{}", prefix, rest), DUMP);
    }

    #[test]
    fn test_split_prefix_recognises_data_marker_first() {
        let dump = "SET x = 1;\n-- Data for Name: t; Type: TABLE DATA; Schema: public\nCOPY ...\n";
        let (prefix, rest) = split_prefix(dump);
        assert_eq!(prefix, "SET x = 1;\n");
        assert!(rest.starts_with(DATA_MARKER));
    }

    #[test]
    fn test_split_prefix_without_markers() {
        let (prefix, rest) = split_prefix("SELECT 1;\n");
        assert_eq!(prefix, "");
        assert_eq!(rest, "SELECT 1;\n");
    }

    #[test]
    fn test_scan_without_markers_yields_single_block() {
        let text = "CREATE EXTENSION citext;\n\n-- just a comment\nSELECT 1;";
        let blocks = scan(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, None);
        assert_eq!(blocks[0].name, None);
        assert_eq!(blocks[0].content, text);
    }

    #[test]
    fn test_scan_empty_input() {
        assert!(scan("").is_empty());
    }

    #[test]
    fn test_scan_types_and_names_blocks() {
        let (_, rest) = split_prefix(DUMP);
        let blocks = scan(rest);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, Some(ObjectKind::Table));
        assert_eq!(blocks[0].name.as_deref(), Some("users"));
        assert!(blocks[0].content.starts_with("-- Name: users;"));
        assert!(blocks[0].content.contains("CREATE TABLE public.users"));

        assert_eq!(blocks[1].kind, Some(ObjectKind::TableData));
        assert_eq!(blocks[1].name.as_deref(), Some("users"));
        assert!(blocks[1].content.contains("COPY public.users (id) FROM stdin;"));
    }

    #[test]
    fn test_scan_concatenation_reproduces_input() {
        let (_, rest) = split_prefix(DUMP);
        let joined: String = scan(rest).into_iter().map(|b| b.content).collect();
        assert_eq!(joined, rest);

        let crlf = "-- Name: a; Type: TABLE; Schema: public\r\nCREATE TABLE a ();\r\n\r\n-- Name: broken\r\nx";
        let joined: String = scan(crlf).into_iter().map(|b| b.content).collect();
        assert_eq!(joined, crlf);
    }

    #[test]
    fn test_scan_keeps_unparsed_marker_block() {
        let text = "-- Name: users; Type: TABLE; Schema: public\nCREATE TABLE users ();\n-- Name: garbage without fields\nSELECT 1;\n";
        let blocks = scan(text);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].kind, None);
        assert_eq!(blocks[1].name, None);
        assert_eq!(
            blocks[1].content,
            "-- Name: garbage without fields\nSELECT 1;\n"
        );
    }

    #[test]
    fn test_scan_data_marker_is_always_table_data() {
        let text = "-- Data for Name: seq_x; Type: SEQUENCE SET; Schema: public\nSELECT 1;\n";
        let blocks = scan(text);
        assert_eq!(blocks[0].kind, Some(ObjectKind::TableData));
        assert_eq!(blocks[0].name.as_deref(), Some("seq_x"));

        let blocks = scan("-- Data for Name: nothing parseable\n");
        assert_eq!(blocks[0].kind, Some(ObjectKind::TableData));
        assert_eq!(blocks[0].name, None);
    }

    #[test]
    fn test_scan_captures_marker_schema() {
        let text = "\
-- Name: events; Type: TABLE; Schema: audit; Owner: app
CREATE TABLE audit.events ();
-- Name: citext; Type: EXTENSION; Schema: -; Owner: -
CREATE EXTENSION citext;
-- Data for Name: events; Type: TABLE DATA; Schema: audit; Owner: app
COPY audit.events (id) FROM stdin;
-- Name: t; Type: TABLE; Schema: public
CREATE TABLE public.t ();
-- Name: no schema field; Type: TABLE;
";
        let blocks = scan(text);

        assert_eq!(blocks[0].schema.as_deref(), Some("audit"));
        assert_eq!(blocks[1].schema, None);
        assert_eq!(blocks[2].schema.as_deref(), Some("audit"));
        assert_eq!(blocks[3].schema.as_deref(), Some("public"));
        assert_eq!(blocks[4].schema, None);
    }

    #[test]
    fn test_unparsed_marker_has_no_schema() {
        let blocks = scan("-- Name: broken; Schema: audit\nSELECT 1;\n");
        assert_eq!(blocks[0].kind, None);
        assert_eq!(blocks[0].schema, None);
    }

    #[test]
    fn test_scan_unknown_type_degrades_to_other() {
        let text = "-- Name: users_id_seq; Type: SEQUENCE; Schema: public; Owner: app\nCREATE SEQUENCE x;\n";
        let blocks = scan(text);
        assert_eq!(
            blocks[0].kind,
            Some(ObjectKind::Other("SEQUENCE".to_string()))
        );
    }
}

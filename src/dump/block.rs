// ABOUTME: Block and object-kind types produced by the dump scanner
// ABOUTME: Maps pg_dump "Type:" labels onto the kinds the grouper understands

use std::fmt;

/// Kind of schema object a dump block describes
///
/// Parsed from the `Type:` field of a pg_dump marker comment. Labels that are
/// not recognised degrade to [`ObjectKind::Other`] and keep the raw label so
/// they can still be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Table,
    TableData,
    Index,
    Trigger,
    /// Primary key, unique, check and foreign key constraints
    Constraint,
    Extension,
    Type,
    Function,
    Other(String),
}

impl ObjectKind {
    /// Parse a pg_dump `Type:` label
    ///
    /// # Examples
    ///
    /// ```
    /// # use pg_dump_splitter::dump::ObjectKind;
    /// assert_eq!(ObjectKind::from_label("TABLE"), ObjectKind::Table);
    /// assert_eq!(ObjectKind::from_label("FK CONSTRAINT"), ObjectKind::Constraint);
    /// assert_eq!(
    ///     ObjectKind::from_label("SEQUENCE"),
    ///     ObjectKind::Other("SEQUENCE".to_string())
    /// );
    /// ```
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "TABLE" => ObjectKind::Table,
            "TABLE DATA" => ObjectKind::TableData,
            "INDEX" => ObjectKind::Index,
            "TRIGGER" => ObjectKind::Trigger,
            "CONSTRAINT" | "FK CONSTRAINT" => ObjectKind::Constraint,
            "EXTENSION" => ObjectKind::Extension,
            "TYPE" => ObjectKind::Type,
            "FUNCTION" => ObjectKind::Function,
            other => ObjectKind::Other(other.to_string()),
        }
    }

    /// Label used in reports and logs
    pub fn label(&self) -> &str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::TableData => "TABLE DATA",
            ObjectKind::Index => "INDEX",
            ObjectKind::Trigger => "TRIGGER",
            ObjectKind::Constraint => "CONSTRAINT",
            ObjectKind::Extension => "EXTENSION",
            ObjectKind::Type => "TYPE",
            ObjectKind::Function => "FUNCTION",
            ObjectKind::Other(label) => label,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A contiguous run of dump lines opened by a marker comment
///
/// `kind` and `name` are `None` when the opening marker could not be parsed
/// (or for the leading block of a dump without markers). `schema` is `None`
/// when the marker has no `Schema:` field or pg_dump wrote `-` there. The
/// content is kept verbatim, line terminators included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: Option<ObjectKind>,
    pub name: Option<String>,
    pub schema: Option<String>,
    pub content: String,
}

impl Block {
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Label for census output; unparsed blocks report as `UNKNOWN`
    pub fn kind_label(&self) -> &str {
        self.kind.as_ref().map_or("UNKNOWN", ObjectKind::label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_known_kinds() {
        assert_eq!(ObjectKind::from_label("TABLE"), ObjectKind::Table);
        assert_eq!(ObjectKind::from_label("TABLE DATA"), ObjectKind::TableData);
        assert_eq!(ObjectKind::from_label("INDEX"), ObjectKind::Index);
        assert_eq!(ObjectKind::from_label("TRIGGER"), ObjectKind::Trigger);
        assert_eq!(ObjectKind::from_label("CONSTRAINT"), ObjectKind::Constraint);
        assert_eq!(ObjectKind::from_label("FK CONSTRAINT"), ObjectKind::Constraint);
        assert_eq!(ObjectKind::from_label("EXTENSION"), ObjectKind::Extension);
        assert_eq!(ObjectKind::from_label("TYPE"), ObjectKind::Type);
        assert_eq!(ObjectKind::from_label(" FUNCTION "), ObjectKind::Function);
    }

    #[test]
    fn test_from_label_unknown_degrades_to_other() {
        let kind = ObjectKind::from_label("SEQUENCE OWNED BY");
        assert_eq!(kind, ObjectKind::Other("SEQUENCE OWNED BY".to_string()));
        assert_eq!(kind.to_string(), "SEQUENCE OWNED BY");
    }

    #[test]
    fn test_block_helpers() {
        let block = Block {
            kind: None,
            name: None,
            schema: None,
            content: "\n  \n".to_string(),
        };
        assert!(block.is_blank());
        assert_eq!(block.kind_label(), "UNKNOWN");
    }
}

// ABOUTME: Utility functions for identifier handling and display formatting
// ABOUTME: Provides file-safe slugs, SQL identifier quoting, and size formatting

/// Sanitize an identifier (table name, schema name, etc.) for display
///
/// Removes control characters and limits length to prevent log injection
/// from hostile dump content and keep messages readable.
///
/// **Note**: This is for display purposes only. Use [`quote_ident`] when the
/// identifier goes into generated SQL.
///
/// # Examples
///
/// ```
/// # use pg_dump_splitter::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\x00name"), "tablename");
/// assert_eq!(sanitize_identifier("table\nname"), "tablename");
///
/// // Length limit
/// let long_name = "a".repeat(200);
/// assert_eq!(sanitize_identifier(&long_name).len(), 100);
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}

/// Turn a table name into a file-name-safe slug
///
/// ASCII letters are lower-cased, digits and `_` are kept, and every other run
/// of characters collapses to a single `_`. Names with nothing usable left
/// become `table`.
///
/// # Examples
///
/// ```
/// # use pg_dump_splitter::utils::slugify;
/// assert_eq!(slugify("users"), "users");
/// assert_eq!(slugify("User Accounts"), "user_accounts");
/// assert_eq!(slugify("../etc"), "etc");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "table".to_string()
    } else {
        slug.to_string()
    }
}

/// Quote a SQL identifier unless it is a plain lower-case name
///
/// Keywords are not detected; pg_dump already quotes those in its own output
/// and marker names never collide in practice.
///
/// # Examples
///
/// ```
/// # use pg_dump_splitter::utils::quote_ident;
/// assert_eq!(quote_ident("users"), "users");
/// assert_eq!(quote_ident("User"), "\"User\"");
/// assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
/// ```
pub fn quote_ident(ident: &str) -> String {
    let plain = ident
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if plain {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

/// Format bytes into human-readable string
///
/// # Examples
///
/// ```
/// # use pg_dump_splitter::utils::format_bytes;
/// assert_eq!(format_bytes(512), "512.0 B");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.1} {}", size, UNITS[unit_idx])
}

//! Identifier quote styles, selected by driver name.

/// How a driver quotes identifiers: wrapping characters plus the character
/// that must be doubled when it appears inside the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteStyle {
    pub prefix: char,
    pub suffix: char,
    pub search: char,
    pub replace: &'static str,
}

/// ANSI double quotes, used by every driver without an override.
pub const DEFAULT_STYLE: QuoteStyle = QuoteStyle {
    prefix: '"',
    suffix: '"',
    search: '"',
    replace: "\"\"",
};

const BACKTICK_STYLE: QuoteStyle = QuoteStyle {
    prefix: '`',
    suffix: '`',
    search: '`',
    replace: "``",
};

const BRACKET_STYLE: QuoteStyle = QuoteStyle {
    prefix: '[',
    suffix: ']',
    search: ']',
    replace: "]]",
};

impl QuoteStyle {
    /// Style for a driver name. Exactly three names are special-cased;
    /// everything else gets the ANSI default.
    pub fn for_driver(name: &str) -> QuoteStyle {
        match name {
            "mysql" => BACKTICK_STYLE,
            "sqlsrv" | "mssql" => BRACKET_STYLE,
            _ => DEFAULT_STYLE,
        }
    }

    /// Wrap an identifier, doubling the closing character where it appears
    /// inside the name.
    pub fn quote_name(&self, name: &str) -> String {
        let escaped = name.replace(self.search, self.replace);
        format!("{}{}{}", self.prefix, escaped, self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_uses_backticks() {
        let style = QuoteStyle::for_driver("mysql");
        assert_eq!(style.prefix, '`');
        assert_eq!(style.quote_name("order"), "`order`");
    }

    #[test]
    fn test_bracket_drivers() {
        for name in ["sqlsrv", "mssql"] {
            let style = QuoteStyle::for_driver(name);
            assert_eq!(style.quote_name("from"), "[from]");
        }
    }

    #[test]
    fn test_unknown_driver_falls_back_to_default() {
        let style = QuoteStyle::for_driver("sqlite");
        assert_eq!(style, DEFAULT_STYLE);
        assert_eq!(style.quote_name("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_embedded_quote_character_is_doubled() {
        let style = QuoteStyle::for_driver("mysql");
        assert_eq!(style.quote_name("we`ird"), "`we``ird`");
    }
}

//! Line level codec for delimited text.
//!
//! The dialect is not RFC 4180. A field is written wrapped in double quotes, literal quotes are
//! doubled and real newlines are written as the two characters `\n`, so that every record
//! occupies exactly one physical line. A null field is written as nothing at all between two
//! separators, which distinguishes it from an empty string (`""`).
//!
//! Parsing is lenient: unbalanced quotes never fail, the rest of the line simply folds into the
//! current field.
//!
//! The dialect has no escape for a backslash. A field holding a literal backslash followed by
//! `n`, such as `C:\new`, is written unchanged and reads back with a real newline in its place.
//!
//! # Examples
//! ```
//! use delimited_sort::codec;
//!
//! let line = codec::format_row(&["Tom \"Big\" Hanks", "59"], ",");
//! assert_eq!(line, r#""Tom ""Big"" Hanks","59""#);
//! assert_eq!(codec::parse_line(&line, ",", true), vec!["Tom \"Big\" Hanks", "59"]);
//! ```

const QUOTE: char = '"';

/// Split one line into fields.
///
/// With `escaped` the first character of `separator` is the delimiter and quoting is honoured.
/// Without it the fields are separated by the complete `separator` string and quotes are kept
/// literally.
pub fn parse_line(line: &str, separator: &str, escaped: bool) -> Vec<String> {
    if escaped {
        match separator.chars().next() {
            Some(delimiter) => parse_escaped(line, delimiter),
            None => vec![unescape(line)],
        }
    } else {
        parse_literal(line, separator)
    }
}

/// Split a line on `delimiter`, honouring quoted fields.
///
/// A quote toggles the quoted state, except that a doubled quote inside a quoted field is an
/// escaped literal quote. A field that starts with a quote has its first and last characters
/// removed. A line that ends with the delimiter yields a trailing empty field.
pub fn parse_escaped(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut column_start = 0;
    let mut in_quotes = false;
    let mut strip_quotes = false;
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == QUOTE {
            if in_quotes && matches!(chars.peek(), Some((_, QUOTE))) {
                chars.next();
            } else {
                in_quotes = !in_quotes;
                strip_quotes = strip_quotes || i == column_start;
            }
        } else if !in_quotes && c == delimiter {
            fields.push(field_text(&line[column_start..i], strip_quotes));
            column_start = i + c.len_utf8();
            strip_quotes = false;
        }
    }

    if column_start < line.len() {
        fields.push(field_text(&line[column_start..], strip_quotes));
    } else {
        fields.push(String::new());
    }
    fields
}

/// Split a line on every occurrence of `separator`. Quotes are not interpreted.
pub fn parse_literal(line: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return vec![line.to_string()];
    }
    line.split(separator).map(str::to_string).collect()
}

fn field_text(raw: &str, strip_quotes: bool) -> String {
    if strip_quotes {
        let mut chars = raw.chars();
        chars.next();
        chars.next_back();
        unescape(chars.as_str())
    } else {
        unescape(raw)
    }
}

/// Turn the two character sequence `\n` into a newline and `""` into `"`.
pub fn unescape(input: &str) -> String {
    input.replace("\\n", "\n").replace("\"\"", "\"")
}

/// Quote a field for output.
pub fn escape(field: &str) -> String {
    let mut escaped = String::with_capacity(field.len() + 2);
    escaped.push(QUOTE);
    for c in field.chars() {
        match c {
            QUOTE => escaped.push_str("\"\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped.push(QUOTE);
    escaped
}

/// Build one line from fields. `None` fields are written as nothing between the separators.
/// The result carries no line terminator.
pub fn format_line<S: AsRef<str>>(fields: &[Option<S>], separator: &str) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push_str(separator);
        }
        if let Some(field) = field {
            line.push_str(&escape(field.as_ref()));
        }
    }
    line
}

/// Build one line from fields that are all present.
pub fn format_row<S: AsRef<str>>(fields: &[S], separator: &str) -> String {
    let fields: Vec<Option<&str>> = fields.iter().map(|f| Some(f.as_ref())).collect();
    format_line(&fields, separator)
}

#[cfg(test)]
mod tests {
    use crate::codec::{escape, format_line, format_row, parse_escaped, parse_line, parse_literal};

    #[test]
    fn test_plain_fields() {
        assert_eq!(parse_escaped("Tom Hanks,59,7/9/1956", ','), vec!["Tom Hanks", "59", "7/9/1956"]);
    }

    #[test]
    fn test_quoted_fields() {
        assert_eq!(
            parse_escaped("\"Tom Hanks\",\"59\",\"7/9/1956\"", ','),
            vec!["Tom Hanks", "59", "7/9/1956"]
        );
    }

    #[test]
    fn test_doubled_quotes_outside_quoted_field() {
        assert_eq!(
            parse_escaped("Tom \"\"Big\"\" Hanks,\"59\",\"7/9/1956\"", ','),
            vec!["Tom \"Big\" Hanks", "59", "7/9/1956"]
        );
    }

    #[test]
    fn test_doubled_quotes_inside_quoted_field() {
        assert_eq!(
            parse_escaped("\"Meg \"\"Botched\"\" Ryan\",54,\"11/19/1961\"", ','),
            vec!["Meg \"Botched\" Ryan", "54", "11/19/1961"]
        );
    }

    #[test]
    fn test_reluctant_phrase() {
        let line = "\"01-APR-2014\"|\"INV SVC -G\"|\"SD\"|\"CORE SVCS\"|\"\"\"\"|\"\"|\"Investor Services Complex\"|\"Service Delivery\"|\"Core Services\"";
        let fields = parse_escaped(line, '|');
        assert_eq!(
            fields,
            vec![
                "01-APR-2014",
                "INV SVC -G",
                "SD",
                "CORE SVCS",
                "\"",
                "",
                "Investor Services Complex",
                "Service Delivery",
                "Core Services",
            ]
        );
    }

    #[test]
    fn test_separator_inside_quotes() {
        assert_eq!(parse_escaped("\"a,b\",c", ','), vec!["a,b", "c"]);
    }

    #[test]
    fn test_trailing_separator() {
        assert_eq!(parse_escaped("a,b,c,d,", ','), vec!["a", "b", "c", "d", ""]);
        assert_eq!(parse_escaped("\"a\",", ','), vec!["a", ""]);
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(parse_escaped(",,", ','), vec!["", "", ""]);
        assert_eq!(parse_escaped("a,\"\",b", ','), vec!["a", "", "b"]);
    }

    #[test]
    fn test_newline_escape() {
        assert_eq!(parse_escaped("\"line one\\nline two\",x", ','), vec!["line one\nline two", "x"]);
    }

    #[test]
    fn test_unbalanced_quote_folds_remainder() {
        assert_eq!(parse_escaped("a,\"b,c,d", ','), vec!["a", "b,c,"]);
        assert_eq!(parse_escaped("a,\"", ','), vec!["a", ""]);
    }

    #[test]
    fn test_multibyte_content() {
        assert_eq!(parse_escaped("\"żółw\";ß;\"日本\"", ';'), vec!["żółw", "ß", "日本"]);
        assert_eq!(parse_escaped("a→b→", '→'), vec!["a", "b", ""]);
    }

    #[test]
    fn test_literal_mode() {
        assert_eq!(parse_literal("\"a\"||b||", "||"), vec!["\"a\"", "b", ""]);
        assert_eq!(parse_literal("single", ","), vec!["single"]);
        assert_eq!(parse_line("x\"y\",z", ",", false), vec!["x\"y\"", "z"]);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("Charles \"Pinky\" Williams"), "\"Charles \"\"Pinky\"\" Williams\"");
        assert_eq!(escape("1.\n2."), "\"1.\\n2.\"");
        assert_eq!(escape(""), "\"\"");
    }

    #[test]
    fn test_null_is_not_empty() {
        let line = format_line(&[Some("a"), None, Some("")], "|");
        assert_eq!(line, "\"a\"||\"\"");
        assert_eq!(parse_escaped(&line, '|'), vec!["a", "", ""]);
    }

    #[test]
    fn test_format_then_parse() {
        let fields = vec![
            "plain",
            "with,separator",
            "with \"quotes\"",
            "multi\nline",
            "",
            "\"",
            "trailing \"",
        ];
        let line = format_row(&fields, ",");
        assert_eq!(parse_line(&line, ",", true), fields);
    }

    #[test]
    fn test_literal_backslash_n_reads_as_newline() {
        let line = format_row(&["C:\\new", "x"], ",");
        assert_eq!(line, "\"C:\\new\",\"x\"");
        assert_eq!(parse_line(&line, ",", true), vec!["C:\new", "x"]);
    }
}

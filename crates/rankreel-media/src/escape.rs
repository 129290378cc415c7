//! Escaping for text embedded in FFmpeg filter graphs and concat manifests.
//!
//! A value inside `-vf` is unescaped twice before a filter sees it: once by
//! the filtergraph parser (which splits on `[ ] , ;`) and once by the option
//! parser (which splits on `:`). Text is therefore escaped for the option
//! level first and the result escaped again for the graph level.

/// Characters special to the filter option parser.
const OPTION_SPECIALS: &[char] = &['\\', '\'', ':'];

/// Characters special to the filtergraph parser.
const GRAPH_SPECIALS: &[char] = &['\\', '\'', '[', ']', ',', ';'];

fn backslash_escape(input: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        if specials.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a value for the filter option parser.
pub fn escape_option_value(value: &str) -> String {
    backslash_escape(value, OPTION_SPECIALS)
}

/// Escape a filter argument string for the filtergraph parser.
pub fn escape_graph_value(value: &str) -> String {
    backslash_escape(value, GRAPH_SPECIALS)
}

/// Escape arbitrary text (titles, labels, font paths) for use as a filter
/// option value inside a `-vf` graph.
pub fn escape_filter_value(value: &str) -> String {
    escape_graph_value(&escape_option_value(value))
}

/// Quote a path for a concat demuxer manifest line (`file '<path>'`).
pub fn quote_concat_path(path: &str) -> String {
    format!("'{}'", path.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo one level of backslash escaping, as FFmpeg's tokenizer does.
    fn unescape(value: &str) -> String {
        let mut out = String::new();
        let mut chars = value.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(escape_filter_value("Top Picks"), "Top Picks");
    }

    #[test]
    fn test_colon_survives_two_levels() {
        let escaped = escape_filter_value("Rank: 1");
        assert_eq!(escaped, "Rank\\\\: 1");
        assert_eq!(unescape(&escaped), "Rank\\: 1");
        assert_eq!(unescape(&unescape(&escaped)), "Rank: 1");
    }

    #[test]
    fn test_quote_and_backslash() {
        let escaped = escape_filter_value("It's a\\b");
        assert_eq!(escaped, "It\\\\\\'s a\\\\\\\\b");
        assert_eq!(unescape(&unescape(&escaped)), "It's a\\b");
    }

    #[test]
    fn test_graph_separators_escaped() {
        let escaped = escape_filter_value("[1, 2; 3]");
        assert_eq!(escaped, "\\[1\\, 2\\; 3\\]");
        assert_eq!(unescape(&unescape(&escaped)), "[1, 2; 3]");
    }

    #[test]
    fn test_percent_left_alone() {
        assert_eq!(escape_filter_value("100%"), "100%");
    }

    #[test]
    fn test_concat_path_quoting() {
        assert_eq!(quote_concat_path("/tmp/a.mp4"), "'/tmp/a.mp4'");
        assert_eq!(quote_concat_path("/tmp/it's.mp4"), "'/tmp/it'\\''s.mp4'");
    }
}

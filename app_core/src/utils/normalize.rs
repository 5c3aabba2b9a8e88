/// Normalize whitespace by:
/// - mapping all Unicode whitespace (incl. tabs/newlines) to a single ASCII space
/// - collapsing runs of spaces to a single space
/// - trimming leading/trailing spaces
pub fn normalize_ws(input: impl Into<String>) -> String {
    let mapped: String = input
        .into()
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    let mut out = String::with_capacity(mapped.len());
    let mut last_space = false;
    for ch in mapped.chars() {
        if ch == ' ' {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(ch);
            last_space = false;
        }
    }

    out.trim().to_string()
}

/// Canonical alias form: whitespace-normalized and lowercased.
/// Every alias stored on a player and every alias lookup goes through this.
pub fn normalize_alias(input: impl Into<String>) -> String {
    normalize_ws(input).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_trims_and_collapses() {
        assert_eq!(normalize_ws("  hello  "), "hello");
        assert_eq!(normalize_ws("a   b\t\tc"), "a b c");
        assert_eq!(normalize_ws("a\n\nb"), "a b");
    }

    #[test]
    fn ws_maps_unicode_whitespace_to_ascii_space() {
        let input = "\u{00A0}foo\u{2002}\u{2003}bar\u{2009}baz\u{00A0}";
        assert_eq!(normalize_ws(input), "foo bar baz");
    }

    #[test]
    fn ws_is_idempotent() {
        let once = normalize_ws("  a   \n  b\t\tc  ");
        assert_eq!(once, normalize_ws(&once));
    }

    #[test]
    fn ws_empty_and_whitespace_only_become_empty_string() {
        assert_eq!(normalize_ws(""), "");
        assert_eq!(normalize_ws(" \t\n\u{00A0}"), "");
    }

    #[test]
    fn alias_form_is_lowercase() {
        assert_eq!(normalize_alias("  MIOM |  SFaT "), "miom | sfat");
        assert_eq!(normalize_alias("Mango"), "mango");
    }
}

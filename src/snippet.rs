/// Render the context window around one match.
///
/// Works in characters: `offset` is the char offset of `term` in `line`.
/// Tabs become spaces and trailing whitespace is dropped before the window
/// `[offset - context, offset + len(term) + context]` is cut. The match is
/// bracketed and a truncated side gets a `...` marker.
pub fn render_snippet(line: &str, offset: usize, term: &str, context: usize) -> String {
    let line = line.replace('\t', " ");
    let chars: Vec<char> = line.trim_end().chars().collect();
    let len = chars.len();
    let term_len = term.chars().count();

    let start = offset.saturating_sub(context);
    let match_end = offset.saturating_add(term_len);
    let end = match_end.saturating_add(context).min(len);

    let slice = |from: usize, to: usize| -> String {
        let from = from.min(len);
        let to = to.min(len).max(from);
        chars[from..to].iter().collect()
    };

    let left = if start > 0 { "..." } else { "" };
    let right = if end < len { "..." } else { "" };
    let out = format!(
        "{left}{}[{}]{}{right}",
        slice(start, offset),
        slice(offset, match_end),
        slice(match_end, end),
    );
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_both_sides_truncated() {
        let line = "天地玄黃宇宙洪荒日月盈昃辰宿列張";
        assert_eq!(render_snippet(line, 6, "洪荒", 2), "...宇宙[洪荒]日月...");
    }

    #[test]
    fn test_snippet_whole_line_fits() {
        assert_eq!(render_snippet("子曰學而時習之", 2, "學而", 30), "子曰[學而]時習之");
    }

    #[test]
    fn test_snippet_at_line_start() {
        assert_eq!(render_snippet("學而時習之", 0, "學而", 1), "[學而]時...");
    }

    #[test]
    fn test_snippet_zero_context() {
        assert_eq!(render_snippet("子曰學而時習之", 2, "學而", 0), "...[學而]...");
    }

    #[test]
    fn test_snippet_tabs_and_trailing_space() {
        assert_eq!(render_snippet("甲\t乙丙  \t ", 3, "丙", 5), "甲 乙[丙]");
    }

    #[test]
    fn test_snippet_trims_leading_space() {
        assert_eq!(render_snippet("   道", 3, "道", 5), "[道]");
    }

    #[test]
    fn test_snippet_offset_past_end_does_not_panic() {
        assert_eq!(render_snippet("甲乙", 10, "丙", 1), "...[]");
    }
}

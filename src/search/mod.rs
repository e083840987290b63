/// Characters shown for a note body when there is nothing to highlight.
pub(crate) const PREVIEW_CHARS: usize = 70;

/// Characters kept on each side of the first match.
pub(crate) const MATCH_RADIUS: usize = 35;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Segment {
    Plain(String),
    Highlight(String),
}

fn chars_eq_ci(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Non-overlapping, case-insensitive match positions (in chars).
fn find_all(hay: &[char], needle: &[char]) -> Vec<usize> {
    let mut out = vec![];
    if needle.is_empty() || needle.len() > hay.len() {
        return out;
    }

    let mut i = 0;
    while i + needle.len() <= hay.len() {
        let hit = hay[i..i + needle.len()]
            .iter()
            .zip(needle)
            .all(|(a, b)| chars_eq_ci(*a, *b));
        if hit {
            out.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    out
}

fn push_plain(out: &mut Vec<Segment>, s: &str) {
    if s.is_empty() {
        return;
    }
    if let Some(Segment::Plain(last)) = out.last_mut() {
        last.push_str(s);
    } else {
        out.push(Segment::Plain(s.to_string()));
    }
}

fn segments_in(
    chars: &[char],
    matches: &[usize],
    qlen: usize,
    start: usize,
    end: usize,
    out: &mut Vec<Segment>,
) {
    let mut cursor = start;
    for &m in matches.iter().filter(|&&m| m >= start && m + qlen <= end) {
        push_plain(out, &chars[cursor..m].iter().collect::<String>());
        out.push(Segment::Highlight(chars[m..m + qlen].iter().collect()));
        cursor = m + qlen;
    }
    push_plain(out, &chars[cursor..end].iter().collect::<String>());
}

/// Every occurrence of `query` in `text` marked, nothing truncated. Used for titles.
pub(crate) fn highlight_segments(text: &str, query: &str) -> Vec<Segment> {
    let chars: Vec<char> = text.chars().collect();
    let needle: Vec<char> = query.trim().chars().collect();
    let matches = find_all(&chars, &needle);

    let mut out = vec![];
    segments_in(&chars, &matches, needle.len(), 0, chars.len(), &mut out);
    out
}

/// Body preview for a note card.
///
/// Without a query (or without a match) this is the first [`PREVIEW_CHARS`] characters.
/// With a match it is the window of `radius` characters around the first match, with
/// ellipses where the text was cut and every occurrence inside the window highlighted.
pub(crate) fn preview_segments(text: &str, query: &str, radius: usize) -> Vec<Segment> {
    let chars: Vec<char> = text.chars().collect();
    let needle: Vec<char> = query.trim().chars().collect();
    let matches = find_all(&chars, &needle);

    let mut out = vec![];
    let Some(&first) = matches.first() else {
        let end = chars.len().min(PREVIEW_CHARS);
        push_plain(&mut out, &chars[..end].iter().collect::<String>());
        if end < chars.len() {
            push_plain(&mut out, "...");
        }
        return out;
    };

    let start = first.saturating_sub(radius);
    let end = chars.len().min(first + radius).max(first + needle.len());

    if start > 0 {
        push_plain(&mut out, "...");
    }
    segments_in(&chars, &matches, needle.len(), start, end, &mut out);
    if end < chars.len() {
        push_plain(&mut out, "...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> Segment {
        Segment::Plain(s.to_string())
    }

    fn hl(s: &str) -> Segment {
        Segment::Highlight(s.to_string())
    }

    #[test]
    fn test_preview_without_query_truncates() {
        let long = "x".repeat(100);
        let segs = preview_segments(&long, "", MATCH_RADIUS);
        assert_eq!(segs, vec![plain(&format!("{}...", "x".repeat(70)))]);

        assert_eq!(preview_segments("short", "", MATCH_RADIUS), vec![plain("short")]);
        assert!(preview_segments("", "", MATCH_RADIUS).is_empty());
    }

    #[test]
    fn test_preview_no_match_falls_back_to_head() {
        assert_eq!(
            preview_segments("nothing here", "zebra", MATCH_RADIUS),
            vec![plain("nothing here")]
        );
    }

    #[test]
    fn test_preview_windows_around_first_match() {
        let text = format!("{}Needle{}", "a".repeat(50), "b".repeat(50));
        let segs = preview_segments(&text, "needle", 10);
        assert_eq!(
            segs,
            vec![
                plain(&format!("...{}", "a".repeat(10))),
                hl("Needle"),
                plain("bbbb..."),
            ]
        );
    }

    #[test]
    fn test_preview_highlights_all_matches_in_window() {
        let segs = preview_segments("cat and CAT", "cat", 35);
        assert_eq!(segs, vec![hl("cat"), plain(" and "), hl("CAT")]);
    }

    #[test]
    fn test_preview_is_char_boundary_safe() {
        let text = "héllo wörld, ünïcode façade";
        let segs = preview_segments(text, "FAÇADE", 5);
        assert_eq!(segs, vec![plain("...code "), hl("façade")]);
    }

    #[test]
    fn test_highlight_segments_for_titles() {
        assert_eq!(
            highlight_segments("Daily Standup notes", "standup"),
            vec![plain("Daily "), hl("Standup"), plain(" notes")]
        );
        assert_eq!(highlight_segments("Title", ""), vec![plain("Title")]);
    }
}

//! Separator-driven splitting into indivisible units.

use unicode_segmentation::UnicodeSegmentation;

/// Separators in priority order. The empty separator splits between
/// grapheme clusters.
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ".", " ", ""];

/// Split `text` into consecutive units of at most `limit` characters.
///
/// The units cover `text` exactly and in order. A unit longer than `limit`
/// is only produced when no remaining separator occurs inside it.
pub(crate) fn split_units<'a>(text: &'a str, separators: &[String], limit: usize) -> Vec<&'a str> {
    let mut units = Vec::new();
    collect_units(text, separators, limit, &mut units);
    units
}

fn collect_units<'a>(text: &'a str, separators: &[String], limit: usize, out: &mut Vec<&'a str>) {
    if text.is_empty() {
        return;
    }
    if char_len(text) <= limit {
        out.push(text);
        return;
    }

    let Some(idx) = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep.as_str()))
    else {
        out.push(text);
        return;
    };

    let separator = separators[idx].as_str();
    if separator.is_empty() {
        out.extend(text.graphemes(true));
        return;
    }

    let finer = &separators[idx + 1..];
    for piece in text.split_inclusive(separator) {
        if char_len(piece) <= limit {
            out.push(piece);
        } else {
            collect_units(piece, finer, limit, out);
        }
    }
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index `n` characters before `end`, clamped to the start of `text`.
pub(crate) fn back_chars(text: &str, end: usize, n: usize) -> usize {
    if n == 0 {
        return end;
    }
    text[..end]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

/// Whether a chunk may start at byte `pos`: the document start, or just
/// after an occurrence of a non-empty separator that touches whitespace.
pub(crate) fn is_unit_boundary(text: &str, pos: usize, separators: &[String]) -> bool {
    pos == 0
        || separators
            .iter()
            .filter(|sep| !sep.is_empty())
            .any(|sep| text[..pos].ends_with(sep.as_str()) && at_token_edge(text, pos))
}

/// Latest boundary in `lo..=hi`, trying separators in priority order.
pub(crate) fn boundary_before(text: &str, lo: usize, hi: usize, separators: &[String]) -> Option<usize> {
    separators
        .iter()
        .filter(|sep| !sep.is_empty())
        .find_map(|sep| {
            text[..hi]
                .rmatch_indices(sep.as_str())
                .map(|(idx, m)| idx + m.len())
                .take_while(|&pos| pos >= lo)
                .find(|&pos| at_token_edge(text, pos))
        })
}

/// Earliest boundary in `lo+1..=hi` for any separator.
pub(crate) fn boundary_after(text: &str, lo: usize, hi: usize, separators: &[String]) -> Option<usize> {
    separators
        .iter()
        .filter(|sep| !sep.is_empty())
        .filter_map(|sep| {
            text[lo..hi]
                .match_indices(sep.as_str())
                .map(|(idx, m)| lo + idx + m.len())
                .find(|&pos| at_token_edge(text, pos))
        })
        .min()
}

/// A separator match ending at `pos` does not sit inside a token like `$5.00`.
fn at_token_edge(text: &str, pos: usize) -> bool {
    let before = text[..pos].chars().next_back();
    let after = text[pos..].chars().next();
    before.map_or(true, char::is_whitespace) || after.map_or(true, char::is_whitespace)
}

//! Text primitives used by window layout.
//!
//! Widths are display columns (via `unicode-width`), which equal character
//! counts for plain ASCII text.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Horizontal placement of a line inside a window's interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Display width of a string in terminal columns.
pub fn text_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Strip leading and trailing spaces.
///
/// Returns the trimmed slice and the number of characters removed.
pub fn trim(line: &str) -> (&str, usize) {
    let trimmed = line.trim_matches(' ');
    let removed = line.chars().count() - trimmed.chars().count();
    (trimmed, removed)
}

/// Surround `s` with `count` spaces on both sides.
pub fn pad(s: &str, count: usize) -> String {
    let margin = " ".repeat(count);
    format!("{margin}{s}{margin}")
}

/// Width of the widest line.
pub fn longest_line<S: AsRef<str>>(lines: &[S]) -> usize {
    lines
        .iter()
        .map(|line| text_width(line.as_ref()))
        .max()
        .unwrap_or(0)
}

/// Greedy word wrap.
///
/// Each output line is filled up to `max_width` columns. The break goes at
/// the last space at or before the width boundary (the space itself is
/// dropped); when the range holds no space the line is hard-cut at the
/// boundary. A line that already fits is returned untouched, which makes
/// wrapping idempotent.
pub fn wrap(line: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 || text_width(line) <= max_width {
        return vec![line.to_string()];
    }

    let chars: Vec<char> = line.chars().collect();
    let mut out = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        // first index past the widest prefix that still fits
        let mut boundary = start;
        let mut used = 0;
        while boundary < chars.len() {
            let w = char_width(chars[boundary]);
            if used + w > max_width {
                break;
            }
            used += w;
            boundary += 1;
        }

        if boundary == chars.len() {
            out.push(chars[start..].iter().collect());
            break;
        }

        // a space sitting exactly on the boundary still counts
        let space = (start + 1..=boundary).rev().find(|&i| chars[i] == ' ');

        match space {
            Some(i) => {
                let mut end = i;
                while end > start && chars[end - 1] == ' ' {
                    end -= 1;
                }
                if end == start {
                    end = i;
                }
                out.push(chars[start..end].iter().collect());
                start = i + 1;
                // the next line never starts with the rest of a space run
                while start < chars.len() && chars[start] == ' ' {
                    start += 1;
                }
            }
            None => {
                // a glyph wider than the whole line still has to advance
                let cut = boundary.max(start + 1);
                out.push(chars[start..cut].iter().collect());
                start = cut;
            }
        }
    }

    out
}

/// Left offset for a line of `content` columns inside `available` columns.
pub fn spacing(alignment: Alignment, available: usize, content: usize) -> usize {
    let free = available.saturating_sub(content);
    match alignment {
        Alignment::Left => 0,
        Alignment::Center => free / 2,
        Alignment::Right => free,
    }
}

/// Longest prefix of `s` that fits in `max_width` columns.
pub fn clip(s: &str, max_width: usize) -> &str {
    let mut used = 0;
    for (idx, ch) in s.char_indices() {
        let w = char_width(ch);
        if used + w > max_width {
            return &s[..idx];
        }
        used += w;
    }
    s
}

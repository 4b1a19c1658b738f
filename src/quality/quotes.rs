use once_cell::sync::Lazy;
use regex::Regex;

/// Any of these flips the inside-quote state, whatever its direction.
pub const QUOTE_GLYPHS: [char; 6] = ['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

static FIRST_PERSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bI\b").expect("first person pattern compiles"));

pub fn is_quote_glyph(ch: char) -> bool {
    QUOTE_GLYPHS.contains(&ch)
}

/// Drops every quoted span (glyphs included). Each removed span becomes a single space.
pub fn strip_quoted(text: &str) -> String {
    let mut remainder = String::with_capacity(text.len());
    let mut inside = false;

    for ch in text.chars() {
        if is_quote_glyph(ch) {
            if !inside {
                remainder.push(' ');
            }
            inside = !inside;
            continue;
        }
        if !inside {
            remainder.push(ch);
        }
    }

    remainder
}

pub fn contains_unquoted_first_person(text: &str) -> bool {
    FIRST_PERSON_RE.is_match(&strip_quoted(text))
}

pub mod config;
pub mod dedup;
pub mod error;
pub mod feed;
pub mod generator;
pub mod pipeline;
pub mod quality;
pub mod style;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

pub use error::PipelineError;

pub const DEFAULT_LINE_LIMIT: usize = 230;

pub const EMOJI_PALETTE: [&str; 18] = [
    "✅", "💬", "📌", "✍️", "🚀", "🧠", "💼", "⏱️", "📈", "🤝", "🔎", "📣", "🗂️", "🧩", "🎯", "⚡", "🔥",
    "🌟",
];

// Widest palette entry is a base glyph plus a variation selector, plus the joining space.
const EMOJI_SLOT_WIDTH: usize = 3;

pub(crate) static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:you|them|q|a):|\b(?:in this thread|see below)\b")
        .expect("marker pattern compiles")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://|\bwww\.)\S+").expect("url pattern compiles")
});

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\w+").expect("hashtag pattern compiles"));

pub fn is_emoji(ch: char) -> bool {
    let code = ch as u32;
    if (0x1F3FB..=0x1F3FF).contains(&code) {
        return false;
    }
    matches!(
        code,
        0x1F300..=0x1FAFF | 0x1F1E6..=0x1F1FF | 0x2600..=0x27BF | 0x2300..=0x23FF | 0x2B00..=0x2BFF
    )
}

pub fn count_emojis(text: &str) -> usize {
    text.chars().filter(|ch| is_emoji(*ch)).count()
}

/// Strips dialogue/meta markers, links and hashtags, then collapses whitespace.
pub fn sanitize_line(raw: &str) -> String {
    let stripped = MARKER_RE.replace_all(raw, "");
    let stripped = URL_RE.replace_all(&stripped, "");
    let stripped = HASHTAG_RE.replace_all(&stripped, "");
    collapse_whitespace(&stripped)
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn add_minimum_emojis<R: Rng + ?Sized>(line: &str, min_emojis: usize, rng: &mut R) -> String {
    let have = count_emojis(line);
    if have >= min_emojis {
        return line.to_string();
    }

    let mut palette = EMOJI_PALETTE.to_vec();
    palette.shuffle(rng);
    let mut picks = palette.into_iter().cycle().take(min_emojis - have);

    let mut parts: Vec<&str> = Vec::new();
    if let Some(first) = picks.next() {
        parts.push(first);
    }
    if !line.is_empty() {
        parts.push(line);
    }
    parts.extend(picks);
    parts.join(" ")
}

/// Cuts to at most `limit` characters, backing off to the last space and appending an ellipsis.
pub fn smart_truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }

    let cut: String = text.chars().take(limit - 1).collect();
    let kept = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", kept.trim_end())
}

/// Sanitizes, truncates and pads `raw` so the result fits `limit` characters.
pub fn fit_x_line<R: Rng + ?Sized>(
    raw: &str,
    min_emojis: usize,
    limit: usize,
    rng: &mut R,
) -> String {
    // Padding never takes more than half the line.
    let min_emojis = min_emojis.min(limit / (2 * EMOJI_SLOT_WIDTH));
    let clean = sanitize_line(raw);
    let mut body = smart_truncate(&clean, limit);
    if count_emojis(&body) < min_emojis {
        let reserve = min_emojis * EMOJI_SLOT_WIDTH;
        body = smart_truncate(&clean, limit - reserve);
    }
    if body.is_empty() {
        return body;
    }
    add_minimum_emojis(&body, min_emojis, rng)
}

pub fn normalize_text(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}

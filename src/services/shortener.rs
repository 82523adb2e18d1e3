//! Course display-name shortening service
//!
//! Canvas course titles are long and inconsistently formatted
//! ("BIOL-101 Introduction to Biology (Section 42)") while the dashboard
//! needs compact, visually stable labels. Shortening is an ordered
//! cascade of rules; extracting a course code ends the cascade early,
//! every other rule transforms and hands off to the next.

use regex::Regex;

/// Longest display name before truncation kicks in
const MAX_DISPLAY_LEN: usize = 16;

/// Tokens that carry no identifying information in a course title
const FILLER_WORDS: [&str; 6] = [
    "introduction",
    "intro",
    "beginning",
    "fundamentals",
    "basic",
    "advanced",
];

/// Shorten a verbose course title into a compact display name.
///
/// Pure and deterministic; same input always yields the same output.
/// Empty or whitespace-only input returns an empty string.
///
/// `"BIOL-101 Introduction to Biology (Section 42)"` becomes
/// `"BIOL 101"`; `"Introduction to Biology - 101"` becomes `"BIO 101"`.
pub fn shorten(title: &str) -> String {
    let name = strip_section_suffix(title);
    if name.is_empty() {
        return String::new();
    }

    // A recognizable course code beats any descriptive remainder.
    if let Some(code) = extract_course_code(&name) {
        return code;
    }

    let tokens = truncate_second_token(drop_fillers(&name));
    cap_length(tokens.join(" ").trim().to_string())
}

/// Rule 1: drop a parenthesized suffix and any trailing letter-prefixed
/// section/term code (" - A41", " - SP24"). Bare trailing numbers stay,
/// because those are usually the course number itself.
fn strip_section_suffix(title: &str) -> String {
    let name = title.trim();
    let name = name.split('(').next().unwrap_or(name).trim();
    let name = name.trim_matches(|c| c == ' ' || c == '-');

    let re = Regex::new(r"\s*-\s*[A-Za-z][A-Za-z0-9]{0,3}\b.*$").expect("valid regex");
    re.replace(name, "").trim().to_string()
}

/// Rule 2: extract a course code and discard the rest of the title.
///
/// Two shapes are recognized, tried in order:
/// - compact: 2-5 letters, optional single space/hyphen, 1-3 digits and
///   an optional trailing letter ("BIOL-101", "CS 50", "PSYCH 210B");
/// - spaced subject-number ("Biology - 101"), where the code letters are
///   the subject word's first three characters.
fn extract_course_code(name: &str) -> Option<String> {
    let compact = Regex::new(r"([A-Za-z]{2,5})[- ]?(\d{1,3}[A-Za-z]?)\b").expect("valid regex");
    if let Some(caps) = compact.captures(name) {
        return Some(format!(
            "{} {}",
            caps[1].to_uppercase(),
            caps[2].to_uppercase()
        ));
    }

    let spaced = Regex::new(r"([A-Za-z]{2,})\s+-\s+(\d{1,3}[A-Za-z]?)\b").expect("valid regex");
    if let Some(caps) = spaced.captures(name) {
        let letters: String = caps[1].chars().take(3).collect();
        return Some(format!(
            "{} {}",
            letters.to_uppercase(),
            caps[2].to_uppercase()
        ));
    }

    None
}

/// Rule 3: drop filler vocabulary and keep at most the first two
/// surviving tokens. If filtering removed everything, fall back to the
/// first two original tokens.
fn drop_fillers(name: &str) -> Vec<String> {
    let trim_punct =
        |w: &str| -> String {
            w.trim_matches(|c: char| matches!(c, ',' | '.' | ':' | '-'))
                .to_string()
        };

    let words: Vec<&str> = name.split_whitespace().collect();
    let cleaned: Vec<String> = words
        .iter()
        .filter(|w| !FILLER_WORDS.contains(&trim_punct(w).to_lowercase().as_str()))
        .map(|w| trim_punct(w))
        .collect();

    let kept = if cleaned.is_empty() {
        words.iter().map(|w| w.to_string()).collect()
    } else {
        cleaned
    };
    kept.into_iter().take(2).collect()
}

/// Rule 4: with exactly two tokens and a long second one, abbreviate the
/// second to four characters plus a period ("Chemistry" -> "Chem.").
fn truncate_second_token(mut tokens: Vec<String>) -> Vec<String> {
    if tokens.len() == 2 && tokens[1].chars().count() > 6 {
        let cut: String = tokens[1].chars().take(4).collect();
        tokens[1] = format!("{}.", cut.trim_end_matches('.'));
    }
    tokens
}

/// Rule 5: hard cap with an ellipsis marker.
fn cap_length(result: String) -> String {
    if result.chars().count() > MAX_DISPLAY_LEN {
        let cut: String = result.chars().take(MAX_DISPLAY_LEN).collect();
        format!("{}…", cut.trim_end())
    } else {
        result
    }
}

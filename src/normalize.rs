//! Canonical client-name normalization.
//!
//! Project and client names in the billing service are noisy: the same
//! real-world client shows up as `"Acme Hours '25 Pack #1"`, `"Acme Pack
//! 2"`, and `"Acme"` depending on who created the project. Both feeds
//! (time report and budget report) are keyed on these display names, so
//! the normalized output here is the merge key for the whole pipeline.
//!
//! The algorithm is ordered and must stay reproducible end to end:
//! identical inputs normalize identically regardless of which feed they
//! arrive on, and normalization is idempotent.

use std::sync::OnceLock;

use regex::Regex;

/// Sentinel returned for names that are empty or collapse to nothing.
pub const UNKNOWN_CLIENT: &str = "Unknown Client";

/// Split keywords, scanned in this fixed order. The first keyword found
/// anywhere in the working string truncates it; scanning stops there.
/// List order (not position in the string) is the tie-break when several
/// keywords are present, and changing it changes canonical identities.
const SPLIT_KEYWORDS: &[&str] = &[
    "hours", "Hours", "HOURS", "pack", "Pack", "PACK", "'25", "'24", "'23", "'22", "'21", "'20",
    "'26", "'27", "'28", "'29", "'30",
];

// Compile-once regex patterns via OnceLock.

/// Noise patterns stripped first, in priority order. Each match becomes a
/// single space so adjacent words are not glued together.
fn noise_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\s*'[0-9]{2}\s*",         // year tags: '25, '24, ...
            r"(?i)\s*Pack\s*#?\d*\s*",  // "Pack #1", "Pack 2"
            r"(?i)\s*\bPt\s*\d*\s*",    // "Pt 1"
            r"(?i)\s*\bPart\s*\d*\s*",  // "Part 2"
            r"(?i)\s*\bHours\b\s*",     // bare "Hours" as a whole word
            r"(?i)\s*\bPack\b\s*",
            r"(?i)\s*\bPt\b\s*",
            r"(?i)\s*\bPart\b\s*",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("noise pattern compiles"))
        .collect()
    })
}

fn re_whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn re_digits_only() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9\s]+$").unwrap())
}

fn re_trailing_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+\d+$").unwrap())
}

fn re_trailing_parens() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+\([^)]*\)$").unwrap())
}

fn re_trailing_dash() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+-\s*$").unwrap())
}

/// Map a noisy display name to its canonical client name.
///
/// Total and pure: never fails, never allocates surprises into the key
/// space. Empty or all-noise input yields [`UNKNOWN_CLIENT`].
pub fn normalize_client_name(display_name: &str) -> String {
    if display_name.is_empty() {
        return UNKNOWN_CLIENT.to_string();
    }

    // 1. Strip noise patterns in priority order.
    let mut name = display_name.to_string();
    for pattern in noise_patterns() {
        name = pattern.replace_all(&name, " ").into_owned();
    }

    // 2. Truncate at the first split keyword found; first keyword in the
    //    list wins, then stop.
    for keyword in SPLIT_KEYWORDS {
        if let Some(idx) = name.find(keyword) {
            name.truncate(idx);
            break;
        }
    }

    // 3. Collapse whitespace, trim, and clear digits-only leftovers.
    let mut name = re_whitespace_run()
        .replace_all(&name, " ")
        .trim()
        .to_string();
    if re_digits_only().is_match(&name) {
        name.clear();
    }

    // 4. Strip trailing number, parenthesized group, and dash, each
    //    anchored to the end of the string.
    name = re_trailing_number().replace(&name, "").into_owned();
    name = re_trailing_parens().replace(&name, "").into_owned();
    name = re_trailing_dash().replace(&name, "").into_owned();

    let name = name.trim();
    if name.is_empty() {
        UNKNOWN_CLIENT.to_string()
    } else {
        name.to_string()
    }
}

//! Heuristics applied to extracted text: evidence category, time markers,
//! source domains

use lazy_static::lazy_static;
use plutarch_domain::{EvidenceType, TimeSpan};
use regex::Regex;

lazy_static! {
    // Career-timeline years
    static ref MARKER_YEAR: Regex = Regex::new(r"\b(1[89]\d{2}|20[0-2]\d)\b").unwrap();

    // Birth years, wider window
    static ref FACT_YEAR: Regex = Regex::new(r"\b(1[6-9]\d{2}|20\d{2})\b").unwrap();

    // "b. 1950", "(b.1950)"
    static ref BORN_ABBREV: Regex = Regex::new(r"\bb\.\s*\d").unwrap();
}

const ONGOING_WORDS: [&str; 4] = ["present", "current", "ongoing", "since"];

/// Classify how directly a quote supports a fact
///
/// # Examples
///
/// ```
/// use plutarch_domain::EvidenceType;
/// use plutarch_extractor::classify_evidence_type;
///
/// assert_eq!(classify_evidence_type("Date of birth: 3 May 1950"), EvidenceType::ExplicitField);
/// assert_eq!(classify_evidence_type("She was born in Lyon in 1950"), EvidenceType::Narrative);
/// assert_eq!(classify_evidence_type("Categories: 1950 births"), EvidenceType::CategoryOnly);
/// ```
pub fn classify_evidence_type(quote: &str) -> EvidenceType {
    let t = quote.to_lowercase();
    if t.contains("date of birth") {
        return EvidenceType::ExplicitField;
    }
    if t.contains("born") || t.contains("née") || t.contains("né ") || BORN_ABBREV.is_match(&t) {
        return EvidenceType::Narrative;
    }
    if t.contains(" births") || (t.contains("births") && t.contains("category")) {
        return EvidenceType::CategoryOnly;
    }
    EvidenceType::Other
}

/// Resolve a free-text time marker into a span
///
/// - no year: unknown
/// - one year with "present", "current", "ongoing" or "since": open-ended
/// - one year otherwise: a point
/// - two or more years: first to last
pub fn normalize_time_marker(marker: &str) -> TimeSpan {
    let years: Vec<i32> = MARKER_YEAR
        .find_iter(marker)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    match years.as_slice() {
        [] => TimeSpan::unknown(),
        [year] => {
            let lower = marker.to_lowercase();
            if ONGOING_WORDS.iter().any(|w| lower.contains(w)) {
                TimeSpan::open(*year)
            } else {
                TimeSpan::point(*year)
            }
        }
        [first, .., last] => TimeSpan::range(*first, *last),
    }
}

/// First plausible birth year mentioned in `text`
pub fn find_year(text: &str) -> Option<i32> {
    FACT_YEAR
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// Independent-source domain for a URL: the host without a leading `www.`
///
/// Input that does not parse as a URL is returned lowercased and trimmed.
///
/// # Examples
///
/// ```
/// use plutarch_extractor::source_domain;
///
/// assert_eq!(source_domain("https://www.who.int/about"), "who.int");
/// assert_eq!(source_domain("en.wikipedia.org"), "en.wikipedia.org");
/// ```
pub fn source_domain(url: &str) -> String {
    let host = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| url.trim().to_string());
    let host = host.to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

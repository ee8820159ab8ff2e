//! Pattern heuristics for text that no provider structured for us.
//!
//! Medicine names are found two ways, line by line:
//!
//! 1. words ending in a common drug-class suffix (`-cillin`, `-mycin`,
//!    `-prazole`, `-sartan`, ...), with the strength that follows them if any;
//! 2. otherwise, lines mentioning a dosage unit (`mg`, `mcg`, `tablet`,
//!    `capsule`) together with a digit, trimmed to the part up to the first
//!    strength.

use std::sync::LazyLock;

use regex::Regex;

/// Drug-class suffixes recognised by the fallback. Matching is on whole
/// words, so `prazole` and `zole` capture the same span.
pub const DRUG_SUFFIXES: &[&str] = &[
    "cillin", "mycin", "prazole", "zole", "pril", "sartan", "statin", "olol", "dipine", "formin",
    "cycline", "oxacin",
];

static DRUG_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    let suffixes = DRUG_SUFFIXES.join("|");
    Regex::new(&format!(
        r"(?i)\b[a-z]+(?:{suffixes})\b(?:\s*\d+(?:\.\d+)?\s*(?:mg|mcg|g|ml|iu)\b)?"
    ))
    .expect("valid regex")
});

static DOSAGE_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:mg|mcg|tablets?|capsules?)\b|\d(?:mg|mcg)\b").expect("valid regex")
});

static STRENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+(?:\.\d+)?\s*(?:mg|mcg|g|ml|iu)\b").expect("valid regex")
});

static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:\d+[.)]\s*|[-*•]\s*)?(?:(?:tab|cap|tablet|capsule|syp|inj)\b\.?\s*)?")
        .expect("valid regex")
});

static PRESCRIPTION_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)℞|\brx\b|\bprescription\b|\bdr\.|\bdoctor\b|\bpatient\b|\bsig\b|\brefills?\b|\bclinic\b|\bhospital\b|\bmbbs\b",
    )
    .expect("valid regex")
});

const MAX_NAME_LEN: usize = 60;

/// Result of running the heuristics over a block of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAnalysis {
    pub medicine_names: Vec<String>,
    pub is_prescription: bool,
}

/// Extract medicine names and decide whether `text` reads like a prescription.
#[must_use]
pub fn analyze_text(text: &str) -> TextAnalysis {
    let medicine_names = extract_medicine_names(text);
    let is_prescription = !medicine_names.is_empty() || looks_like_prescription(text);
    TextAnalysis {
        medicine_names,
        is_prescription,
    }
}

/// `true` if `text` contains any of the usual prescription markers.
#[must_use]
pub fn looks_like_prescription(text: &str) -> bool {
    PRESCRIPTION_KEYWORD_RE.is_match(text)
}

/// Scan `text` line by line for medicine names. Order of first appearance is
/// kept; duplicates (case-insensitive) are dropped.
#[must_use]
pub fn extract_medicine_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |candidate: &str| {
        let candidate = collapse_whitespace(candidate);
        if candidate.is_empty()
            || names
                .iter()
                .any(|n| n.eq_ignore_ascii_case(candidate.as_str()))
        {
            return;
        }
        names.push(candidate);
    };

    for line in text.lines() {
        let mut matched = false;
        for m in DRUG_NAME_RE.find_iter(line) {
            push(m.as_str());
            matched = true;
        }
        if matched {
            continue;
        }
        if let Some(name) = dosage_line_name(line) {
            push(&name);
        }
    }

    names
}

/// For a line mentioning a dosage unit and a digit, the medicine-looking
/// prefix of the line up to and including the first strength.
fn dosage_line_name(line: &str) -> Option<String> {
    if !DOSAGE_UNIT_RE.is_match(line) || !line.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let rest = LIST_MARKER_RE.replace(line, "");
    let rest = rest.trim();
    // Instructions such as "2 tablets daily" start with a number, not a name.
    if !rest.chars().next().is_some_and(char::is_alphabetic) {
        return None;
    }

    let candidate = match STRENGTH_RE.find(rest) {
        Some(m) => &rest[..m.end()],
        None => rest,
    };
    if candidate.chars().filter(|c| c.is_alphabetic()).count() < 3 {
        return None;
    }

    let truncated: String = candidate.chars().take(MAX_NAME_LEN).collect();
    Some(truncated.trim().to_string())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Expansion of a raw bracket alias into the set of strings it might be
//! known by: tags with sponsor/crew prefixes, pool labels and stray
//! punctuation stripped in the ways bracket exports mangle them.

use regex::Regex;
use std::sync::LazyLock;

static SPECIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("special char pattern"));
// matches pool labels like '1 1 slox'
static POOL_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\s+[0-9]+\s+(.+)$").expect("numeric pool pattern"));
// matches pool labels like 'p1s1 slox'
static POOL_LABELED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.[0-9]+.[0-9]+\s+(.+)$").expect("labeled pool pattern"));

/// Generate the deduplicated similar-alias set for a raw alias.
///
/// Inputs shorter than the pool-label anchors simply contribute no capture;
/// empty derivations are dropped.
pub fn similar_aliases(alias: &str) -> Vec<String> {
    let lower = alias.to_lowercase();

    let mut candidates: Vec<String> = vec![
        lower.clone(),
        lower.chars().filter(|c| !c.is_whitespace()).collect(),
        SPECIAL_CHARS.replace_all(&lower, "").into_owned(),
    ];

    // everything after the last special character; strips crew/sponsor tags
    if let Some(last) = SPECIAL_CHARS.find_iter(&lower).last() {
        candidates.push(lower[last.end()..].trim().to_string());
    }

    for pattern in [&POOL_NUMERIC, &POOL_LABELED] {
        if let Some(caps) = pattern.captures(&lower) {
            candidates.push(caps[1].trim().to_string());
        }
    }

    // all trailing word suffixes of the alias
    let words: Vec<&str> = lower.split_whitespace().collect();
    for i in 0..words.len() {
        candidates.push(words[i..].join(" "));
    }

    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !candidate.is_empty() && !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

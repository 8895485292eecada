//! Dotted-integer version comparison.

use std::cmp::Ordering;

/// Compare two dotted versions (`"1.4.10"` vs `"1.5"`).
///
/// The shorter version is zero-padded to the longer one's length and the
/// segments are compared positionwise. Non-numeric segments (including
/// pre-release suffixes such as `3-beta`) count their leading digits only.
#[must_use]
pub fn compare_versions(actual: &str, expected: &str) -> Ordering {
    let a = segments(actual);
    let b = segments(expected);
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn segments(version: &str) -> Vec<u64> {
    let version = version.trim().trim_start_matches(['v', 'V']);
    if version.is_empty() {
        return Vec::new();
    }
    version
        .split('.')
        .map(|segment| {
            let digits: String = segment.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

//! Tolerant semantic-version parsing.
//!
//! Operators and upstream release tags write versions in several shapes:
//! `1.4.9`, `v1.4.9`, `1.4`, `19.03.13`. Table lookups always use the exact
//! original string; parsing is only for minimum-version gating and URL
//! template selection, so it accepts the common variations strict semver
//! rejects.

use semver::Version;

/// Parse a version string, tolerating a leading `v`, shortened forms
/// (`1.4` -> `1.4.0`), and leading zeroes in components (`19.03.13` ->
/// `19.3.13`).
///
/// # Errors
///
/// Returns the underlying semver error when the string cannot be coerced
/// into a valid version.
pub fn parse_tolerant(version: &str) -> Result<Version, semver::Error> {
    let trimmed = version.trim();
    let bare = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

    match Version::parse(bare) {
        Ok(v) => Ok(v),
        Err(err) => {
            let split = bare.find(['-', '+']).unwrap_or(bare.len());
            let (core, rest) = bare.split_at(split);
            if core.is_empty() {
                return Err(err);
            }

            let mut segments: Vec<String> = core
                .split('.')
                .map(|seg| {
                    if seg.len() > 1 && seg.chars().all(|c| c.is_ascii_digit()) {
                        let stripped = seg.trim_start_matches('0');
                        if stripped.is_empty() { "0" } else { stripped }.to_string()
                    } else {
                        seg.to_string()
                    }
                })
                .collect();
            while segments.len() < 3 {
                segments.push("0".to_string());
            }

            Version::parse(&format!("{}{rest}", segments.join(".")))
        }
    }
}

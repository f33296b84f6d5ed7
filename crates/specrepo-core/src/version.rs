//! Lenient semantic-version parsing
//!
//! Spec repositories are older than strict semver and routinely declare
//! versions like `999.0` or `0.35.0.rc2`. Those are normalized into a
//! [`semver::Version`] so they order the same way everywhere:
//!
//! - missing components are zero-padded (`1.2` -> `1.2.0`)
//! - a leading `v` is ignored
//! - numeric segments past the third become build metadata, which still
//!   orders after the plain release (`1.0.0.1` -> `1.0.0+1`)
//! - other dotted segments after the numeric core become a pre-release
//!   (`0.35.0.rc2` -> `0.35.0-rc2`)

use semver::Version;
use serde::{Deserialize, Deserializer};

use crate::error::{CoreError, Result};

/// Parse a version string, accepting the lenient forms found in spec repositories
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    if let Ok(version) = Version::parse(trimmed) {
        return Ok(version);
    }

    let candidate = normalize(trimmed).unwrap_or_else(|| trimmed.to_string());
    Version::parse(&candidate).map_err(|source| CoreError::InvalidVersion {
        input: input.to_string(),
        source,
    })
}

/// Text of a YAML scalar holding a version.
///
/// Unquoted versions such as `999.0` or `2` arrive as numbers.
pub fn version_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Serde helper for version fields that may be written as strings or numbers
pub fn deserialize_version_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    version_text(&value)
        .ok_or_else(|| serde::de::Error::custom("expected a version string or number"))
}

/// Rewrite a lenient version into strict semver syntax.
///
/// Returns `None` when there is no numeric component to anchor on.
fn normalize(input: &str) -> Option<String> {
    let (main, build) = match input.split_once('+') {
        Some((main, build)) => (main, Some(build)),
        None => (input, None),
    };
    let (core, pre) = match main.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (main, None),
    };

    let mut numbers: Vec<u64> = Vec::with_capacity(3);
    let mut revision: Vec<&str> = Vec::new();
    let mut extra: Vec<&str> = Vec::new();

    for part in core.split('.') {
        let numeric = !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if extra.is_empty() && numeric {
            if numbers.len() < 3 {
                numbers.push(part.parse().ok()?);
            } else {
                revision.push(part.trim_start_matches('0'));
            }
        } else {
            extra.push(part);
        }
    }

    if numbers.is_empty() {
        return None;
    }
    numbers.resize(3, 0);

    let mut out = format!("{}.{}.{}", numbers[0], numbers[1], numbers[2]);

    extra.extend(pre);
    if !extra.is_empty() {
        out.push('-');
        out.push_str(&extra.join("."));
    }
    // Build identifiers compare numerically, so `1.0.0.10` stays above `1.0.0.9`
    let revision = revision.into_iter().map(|part| if part.is_empty() { "0" } else { part });
    let build: Vec<&str> = revision.chain(build).collect();
    if !build.is_empty() {
        out.push('+');
        out.push_str(&build.join("."));
    }

    Some(out)
}

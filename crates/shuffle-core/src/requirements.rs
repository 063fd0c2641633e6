//! pip requirement constraints derived from selected versions.

use crate::error::{Result, ShuffleError};

/// Axes whose string values are version pins, in install order.
///
/// `protobuf` also accepts the `cpp-3` backend flag, and `ideep` is
/// installed as `ideep4py`.
pub const VERSIONED_AXES: &[&str] = &[
    "setuptools",
    "pip",
    "cython",
    "numpy",
    "scipy",
    "h5py",
    "theano",
    "protobuf",
    "ideep",
    "pillow",
];

/// Parse a dotted version into its integer components.
pub fn parse_version(version: &str) -> Result<Vec<u64>> {
    version
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| ShuffleError::InvalidVersion(version.to_string()))
        })
        .collect()
}

/// Upper-bound constraint admitting `version` and anything below the next
/// value of its last component: `("numpy", "1.9")` gives `numpy<1.10`.
pub fn make_require(name: &str, version: &str) -> Result<String> {
    let mut parts = parse_version(version)?;
    if let Some(last) = parts.last_mut() {
        *last = last
            .checked_add(1)
            .ok_or_else(|| ShuffleError::InvalidVersion(version.to_string()))?;
    }
    let next = parts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    Ok(format!("{name}<{next}"))
}

/// Package name at the start of a requirement string.
///
/// `"numpy<1.10"` and `"numpy [extra]>=1.9"` both name `numpy`.
pub fn requirement_name(requirement: &str) -> &str {
    let end = requirement
        .find(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | ';' | '[' | '@' | ' '))
        .unwrap_or(requirement.len());
    &requirement[..end]
}

/// Split `requirements` into (entries for `name`, everything else).
pub fn partition_requirements(
    name: &str,
    requirements: Vec<String>,
) -> (Vec<String>, Vec<String>) {
    requirements
        .into_iter()
        .partition(|req| requirement_name(req) == name)
}

/// Replace any existing entries for `name` with `requirement`.
pub fn overwrite_requires_version(requires: &mut Vec<String>, name: &str, requirement: String) {
    requires.retain(|req| requirement_name(req) != name);
    requires.push(requirement);
}

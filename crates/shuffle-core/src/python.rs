//! Interpreter version lookup for base images.
//!
//! The validator only needs `base image -> Python version`. Where that
//! answer comes from is pluggable through [`PythonVersionLookup`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ShuffleError;

/// A 2- or 3-component interpreter version.
///
/// Ordering is tuple ordering, so `3.5 < 3.5.0 < 3.5.2 < 3.6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl PythonVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch: Some(patch),
        }
    }

    pub const fn minor_only(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: None,
        }
    }

    /// `(major, minor)` prefix, the granularity most rules branch on.
    pub const fn major_minor(&self) -> (u32, u32) {
        (self.major, self.minor)
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

impl FromStr for PythonVersion {
    type Err = ShuffleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ShuffleError::InvalidVersion(s.to_string());
        let parts = s
            .split('.')
            .map(|p| p.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [major, minor] => Ok(Self::minor_only(*major, *minor)),
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for PythonVersion {
    type Error = ShuffleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PythonVersion> for String {
    fn from(v: PythonVersion) -> Self {
        v.to_string()
    }
}

/// Resolves the interpreter version shipped by a base image.
pub trait PythonVersionLookup {
    fn python_version(&self, base: &str) -> Option<PythonVersion>;
}

impl<F> PythonVersionLookup for F
where
    F: Fn(&str) -> Option<PythonVersion>,
{
    fn python_version(&self, base: &str) -> Option<PythonVersion> {
        self(base)
    }
}

/// Table of known base images and their interpreter versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseImageTable {
    versions: BTreeMap<String, PythonVersion>,
}

impl BaseImageTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Base images provided by the image build pipeline.
    pub fn builtin() -> Self {
        Self::empty()
            .with("ubuntu14_py27", PythonVersion::new(2, 7, 6))
            .with("ubuntu14_py34", PythonVersion::new(3, 4, 3))
            .with("ubuntu14_py35", PythonVersion::new(3, 5, 1))
            .with("ubuntu16_py27", PythonVersion::new(2, 7, 12))
            .with("ubuntu16_py35", PythonVersion::new(3, 5, 2))
            .with("ubuntu16_py36", PythonVersion::new(3, 6, 8))
            .with("ubuntu16_py37", PythonVersion::new(3, 7, 2))
            .with("ubuntu18_py27", PythonVersion::new(2, 7, 15))
            .with("ubuntu18_py36", PythonVersion::new(3, 6, 7))
            .with("ubuntu18_py37", PythonVersion::new(3, 7, 2))
            .with("centos6_py27", PythonVersion::new(2, 7, 15))
            .with("centos7_py27", PythonVersion::new(2, 7, 5))
            .with("centos7_py34", PythonVersion::new(3, 4, 9))
            .with("centos7_py36", PythonVersion::new(3, 6, 8))
    }

    /// Add or override one base image (builder pattern).
    pub fn with(mut self, base: &str, version: PythonVersion) -> Self {
        self.versions.insert(base.to_string(), version);
        self
    }

    /// Overlay entries from another table; entries in `other` win.
    pub fn extend(&mut self, other: &BaseImageTable) {
        for (base, version) in &other.versions {
            self.versions.insert(base.clone(), *version);
        }
    }

    pub fn bases(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }
}

impl PythonVersionLookup for BaseImageTable {
    fn python_version(&self, base: &str) -> Option<PythonVersion> {
        self.versions.get(base).copied()
    }
}

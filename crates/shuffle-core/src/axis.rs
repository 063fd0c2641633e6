//! Axis definitions and candidate combinations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Axis holding the base image name.
pub const BASE_AXIS: &str = "base";

/// Axis holding the NumPy version.
pub const NUMPY_AXIS: &str = "numpy";

/// Axis holding the `(cuda, cudnn, nccl)` triple.
pub const CUDA_AXIS: &str = "cuda_cudnn_nccl";

/// Sentinel used inside the CUDA triple for a disabled component.
pub const NONE_COMPONENT: &str = "none";

/// A single candidate value of an axis.
///
/// JSON form is untagged: `null`, `true`, `"1.9"`, `["cuda80", "cudnn6", "none"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    /// Axis left unset for this round.
    None,
    /// Presence flag.
    Flag(bool),
    /// Version or named choice.
    Str(String),
    /// Compound value such as the CUDA/cuDNN/NCCL triple.
    Tuple(Vec<String>),
}

impl AxisValue {
    /// Build a string value.
    pub fn str(s: impl Into<String>) -> Self {
        AxisValue::Str(s.into())
    }

    /// Build a tuple value from its parts.
    pub fn tuple<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AxisValue::Tuple(parts.into_iter().map(Into::into).collect())
    }

    /// Whether the value counts as "present" for presence checks.
    pub fn is_truthy(&self) -> bool {
        match self {
            AxisValue::None => false,
            AxisValue::Flag(b) => *b,
            AxisValue::Str(s) => !s.is_empty(),
            AxisValue::Tuple(parts) => !parts.is_empty(),
        }
    }

    /// The string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AxisValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The string payload when it can serve as a version pin.
    pub fn as_version(&self) -> Option<&str> {
        self.as_str().filter(|s| !s.is_empty())
    }

    /// Split a 3-part tuple into its components.
    pub fn as_triple(&self) -> Option<(&str, &str, &str)> {
        match self {
            AxisValue::Tuple(parts) if parts.len() == 3 => {
                Some((&parts[0], &parts[1], &parts[2]))
            }
            _ => None,
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::None => write!(f, "null"),
            AxisValue::Flag(b) => write!(f, "{b}"),
            AxisValue::Str(s) => write!(f, "{s}"),
            AxisValue::Tuple(parts) => write!(f, "({})", parts.join(", ")),
        }
    }
}

impl From<&str> for AxisValue {
    fn from(s: &str) -> Self {
        AxisValue::Str(s.to_string())
    }
}

impl From<bool> for AxisValue {
    fn from(b: bool) -> Self {
        AxisValue::Flag(b)
    }
}

/// A named dependency dimension with its candidate values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    pub name: String,
    pub candidates: Vec<AxisValue>,
}

/// Axis name to candidate list, iterated in lexicographic name order.
///
/// Duplicate candidates collapse to their first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<AxisValue>>")]
#[serde(into = "BTreeMap<String, Vec<AxisValue>>")]
pub struct AxisSet {
    axes: BTreeMap<String, Vec<AxisValue>>,
}

impl AxisSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an axis (builder pattern).
    pub fn with_axis<I, V>(mut self, name: &str, candidates: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AxisValue>,
    {
        self.insert(name, candidates.into_iter().map(Into::into).collect());
        self
    }

    /// Add or replace an axis.
    pub fn insert(&mut self, name: &str, candidates: Vec<AxisValue>) {
        self.axes.insert(name.to_string(), dedup(candidates));
    }

    pub fn get(&self, name: &str) -> Option<&[AxisValue]> {
        self.axes.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.axes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Axes in draw order.
    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        self.axes.iter().map(|(name, candidates)| Axis {
            name: name.clone(),
            candidates: candidates.clone(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, Vec<AxisValue>>> for AxisSet {
    fn from(raw: BTreeMap<String, Vec<AxisValue>>) -> Self {
        let axes = raw.into_iter().map(|(k, v)| (k, dedup(v))).collect();
        Self { axes }
    }
}

impl From<AxisSet> for BTreeMap<String, Vec<AxisValue>> {
    fn from(set: AxisSet) -> Self {
        set.axes
    }
}

fn dedup(candidates: Vec<AxisValue>) -> Vec<AxisValue> {
    let mut out: Vec<AxisValue> = Vec::with_capacity(candidates.len());
    for value in candidates {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// One selected value per axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Combination {
    values: BTreeMap<String, AxisValue>,
}

impl Combination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an axis value (builder pattern).
    pub fn with(mut self, axis: &str, value: impl Into<AxisValue>) -> Self {
        self.insert(axis, value.into());
        self
    }

    pub fn insert(&mut self, axis: &str, value: AxisValue) {
        self.values.insert(axis.to_string(), value);
    }

    pub fn get(&self, axis: &str) -> Option<&AxisValue> {
        self.values.get(axis)
    }

    /// String value of an axis; `None` when missing or not a string.
    pub fn get_str(&self, axis: &str) -> Option<&str> {
        self.get(axis).and_then(AxisValue::as_str)
    }

    /// Whether the axis is present and truthy.
    pub fn is_set(&self, axis: &str) -> bool {
        self.get(axis).is_some_and(AxisValue::is_truthy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AxisValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

//! Seeded round-robin selection over shuffled axes.
//!
//! Every axis replays its candidates forever in per-cycle shuffled order.
//! One value is pulled from every axis per round, and the first round that
//! passes validation wins.
//!
//! # Reproducibility
//!
//! Each selection run owns one [`ChaCha8Rng`] seeded from the caller's seed.
//! ChaCha output is platform independent, so the same axes and seed yield
//! the same sequence of rounds everywhere.
//!
//! # Termination
//!
//! [`select`] has no round cap. If the rules reject every combination it
//! keeps logging rejections forever; callers that need a bound use
//! [`select_within`].

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::axis::{Axis, AxisSet, AxisValue, Combination, BASE_AXIS, CUDA_AXIS, NUMPY_AXIS};
use crate::error::{Result, ShuffleError};
use crate::obs;
use crate::python::PythonVersionLookup;
use crate::requirements::{parse_version, VERSIONED_AXES};
use crate::validator::{evaluate_combination, Verdict};

/// Infinite shuffled replay of one axis.
///
/// Each cycle starts again from the declared candidate order and is shuffled
/// when the axis is first pulled and whenever the previous cycle runs out.
#[derive(Debug, Clone)]
pub struct ShuffledCycle {
    axis: Axis,
    order: Vec<usize>,
    cursor: usize,
}

impl ShuffledCycle {
    pub fn new(axis: Axis) -> Self {
        let len = axis.candidates.len();
        Self {
            axis,
            order: Vec::with_capacity(len),
            cursor: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.axis.name
    }

    /// Next candidate, reshuffling on exhaustion. `None` only for an empty axis.
    pub fn next_value(&mut self, rng: &mut ChaCha8Rng) -> Option<&AxisValue> {
        if self.axis.candidates.is_empty() {
            return None;
        }
        if self.cursor >= self.order.len() {
            self.order.clear();
            self.order.extend(0..self.axis.candidates.len());
            self.order.shuffle(rng);
            self.cursor = 0;
        }
        let idx = self.order[self.cursor];
        self.cursor += 1;
        self.axis.candidates.get(idx)
    }
}

/// Infinite iterator of candidate combinations for one seed.
pub struct ShuffleRounds {
    rng: ChaCha8Rng,
    cycles: Vec<ShuffledCycle>,
}

impl ShuffleRounds {
    pub fn new(axes: &AxisSet, seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            cycles: axes.axes().map(ShuffledCycle::new).collect(),
        }
    }
}

impl Iterator for ShuffleRounds {
    type Item = Combination;

    /// Always `Some` unless an axis is empty.
    fn next(&mut self) -> Option<Combination> {
        let mut combo = Combination::new();
        for cycle in &mut self.cycles {
            let value = cycle.next_value(&mut self.rng)?.clone();
            combo.insert(&cycle.axis.name, value);
        }
        Some(combo)
    }
}

/// Reject axis sets that can never produce a well-formed combination.
///
/// Checks the required axes and their value types, that no axis is empty,
/// that every base image is known to `lookup`, and that every version pin
/// parses.
pub fn check_axes(axes: &AxisSet, lookup: &dyn PythonVersionLookup) -> Result<()> {
    for required in [BASE_AXIS, NUMPY_AXIS, CUDA_AXIS] {
        if !axes.contains(required) {
            return Err(ShuffleError::MissingAxis(required.to_string()));
        }
    }

    for axis in axes.axes() {
        if axis.candidates.is_empty() {
            return Err(ShuffleError::EmptyAxis(axis.name));
        }
        for value in &axis.candidates {
            check_value(&axis.name, value, lookup)?;
        }
    }
    Ok(())
}

fn check_value(axis: &str, value: &AxisValue, lookup: &dyn PythonVersionLookup) -> Result<()> {
    let invalid = |expected| ShuffleError::InvalidAxisValue {
        axis: axis.to_string(),
        value: value.to_string(),
        expected,
    };

    match axis {
        BASE_AXIS => {
            let base = value.as_str().ok_or_else(|| invalid("a base image name"))?;
            if lookup.python_version(base).is_none() {
                return Err(ShuffleError::UnknownBaseImage(base.to_string()));
            }
        }
        NUMPY_AXIS => {
            let numpy = value.as_str().ok_or_else(|| invalid("a version string"))?;
            parse_version(numpy)?;
        }
        CUDA_AXIS => {
            value
                .as_triple()
                .ok_or_else(|| invalid("a 3-part (cuda, cudnn, nccl) tuple"))?;
        }
        "protobuf" if value.as_str() == Some("cpp-3") => {}
        _ if VERSIONED_AXES.contains(&axis) => {
            if let Some(version) = value.as_version() {
                parse_version(version)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Select the first valid combination for `seed`.
///
/// Every rejected round is logged with its reason. Does not return if no
/// combination of `axes` is valid.
pub fn select(axes: &AxisSet, seed: u64, lookup: &dyn PythonVersionLookup) -> Result<Combination> {
    check_axes(axes, lookup)?;
    first_valid(ShuffleRounds::new(axes, seed), lookup)
}

/// Like [`select`], giving up after `max_rounds` rejected rounds.
pub fn select_within(
    axes: &AxisSet,
    seed: u64,
    lookup: &dyn PythonVersionLookup,
    max_rounds: u64,
) -> Result<Combination> {
    check_axes(axes, lookup)?;
    let limit = usize::try_from(max_rounds).unwrap_or(usize::MAX);
    first_valid(ShuffleRounds::new(axes, seed).take(limit), lookup)
}

fn first_valid(
    rounds: impl Iterator<Item = Combination>,
    lookup: &dyn PythonVersionLookup,
) -> Result<Combination> {
    let mut tried = 0u64;
    for combo in rounds {
        match evaluate_combination(&combo, lookup) {
            Verdict::Accepted => {
                obs::emit_combination_accepted(tried, &combo);
                return Ok(combo);
            }
            Verdict::Rejected(rejection) => {
                obs::emit_combination_skipped(tried, &rejection.reason, &combo);
            }
        }
        tried += 1;
    }
    Err(ShuffleError::Exhausted { rounds: tried })
}

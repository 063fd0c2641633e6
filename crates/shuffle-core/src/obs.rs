//! Structured log events for the selection lifecycle.
//!
//! Every rejected round, the accepted round, the chosen parameters and the
//! built configuration are emitted at `info!` level. Field names are stable
//! enough to grep, but the lines are diagnostics, not an API.

use tracing::{debug, info, warn};

use crate::axis::Combination;
use crate::conf::Configuration;

/// Emit event: a round was rejected by a rule.
pub fn emit_combination_skipped(round: u64, reason: &str, combo: &Combination) {
    info!(
        event = "shuffle.skipped",
        round = round,
        reason = %reason,
        combination = %combo,
        "Skipping invalid shuffle combination ({}): {}",
        reason,
        combo
    );
}

/// Emit event: a round passed every rule.
pub fn emit_combination_accepted(round: u64, combo: &Combination) {
    info!(event = "shuffle.accepted", round = round, combination = %combo);
}

/// Emit event: the selected parameters, one line per axis.
pub fn emit_shuffle_parameters(seed: u64, params: &Combination) {
    info!(event = "shuffle.parameters", seed = seed, axes = params.len());
    for (axis, value) in params.iter() {
        info!(event = "shuffle.parameter", seed = seed, axis = %axis, value = %value);
    }
}

/// Emit event: configuration derived from the accepted combination.
pub fn emit_configuration_built(seed: u64, conf: &Configuration) {
    info!(
        event = "conf.built",
        seed = seed,
        requires = ?conf.requires,
        base = ?conf.base,
        cuda = ?conf.cuda,
        cudnn = ?conf.cudnn,
        nccl = ?conf.nccl,
        protobuf_cpp = ?conf.protobuf_cpp
    );
    match conf.digest() {
        Ok(digest) => debug!(event = "conf.digest", seed = seed, digest = %digest),
        Err(e) => warn!(event = "conf.digest_error", seed = seed, error = %e),
    }
}

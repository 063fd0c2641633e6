//! Shuffle Matrix Core Library
//!
//! Picks one reproducible, valid combination of dependency versions for a
//! CI container image and turns it into pip requirement pins:
//! - [`shuffle`]: seeded per-axis shuffled round-robin selection
//! - [`validator`]: ordered compatibility rules, first failure wins
//! - [`conf`]: requirement constraints and image parameters
//! - [`matrix`]: axis definitions loaded from JSON

pub mod axis;
pub mod conf;
pub mod error;
pub mod matrix;
pub mod obs;
pub mod python;
pub mod requirements;
pub mod shuffle;
pub mod telemetry;
pub mod validator;

pub use axis::{Axis, AxisSet, AxisValue, Combination, BASE_AXIS, CUDA_AXIS, NUMPY_AXIS};
pub use conf::{make_conf, make_shuffle_conf, make_shuffle_conf_within, Configuration};
pub use error::{Result, ShuffleError};
pub use matrix::MatrixFile;
pub use python::{BaseImageTable, PythonVersion, PythonVersionLookup};
pub use requirements::{
    make_require, overwrite_requires_version, parse_version, partition_requirements,
    requirement_name,
};
pub use shuffle::{check_axes, select, select_within, ShuffleRounds, ShuffledCycle};
pub use telemetry::init_tracing;
pub use validator::{evaluate_combination, is_ideep_supported, CompatRule, Rejection, Verdict};

/// Shuffle Matrix version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Compatibility validator for candidate combinations.
//!
//! Evaluates a [`Combination`] against the ordered [`CompatRule`] list and
//! produces a [`Verdict`]. Rules overlap, so order matters: the first rule
//! that fails decides the verdict and later rules are not evaluated.

use serde::{Deserialize, Serialize};

use crate::axis::{AxisValue, Combination, BASE_AXIS, CUDA_AXIS, NONE_COMPONENT, NUMPY_AXIS};
use crate::python::{PythonVersion, PythonVersionLookup};

/// NumPy releases older than 1.16.
const LEGACY_NUMPY: &[&str] = &["1.9", "1.10", "1.11", "1.12", "1.13", "1.14", "1.15"];

/// A single compatibility rule that can reject a combination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompatRule {
    /// Precondition: `base`, `numpy` and a 3-part `cuda_cudnn_nccl` are set.
    RequiredAxes,
    /// NumPy 1.9 segfaults together with h5py.
    NumpyH5py,
    /// NumPy must support the base image's Python.
    NumpyPython,
    /// SciPy must support the base image's Python.
    ScipyPython,
    /// iDeep platform, interpreter and NumPy requirements.
    Ideep,
    /// Old SciPy and Theano need a legacy NumPy.
    LegacyNumpyLibraries,
    /// protobuf cpp-3 does not build on centos6.
    ProtobufCentos6,
    /// NCCL is unavailable on centos6.
    NcclCentos6,
    /// CUDA major version must support the base distribution.
    CudaDistribution,
}

impl CompatRule {
    /// Evaluation order after the [`CompatRule::RequiredAxes`] precondition.
    pub const ORDERED: [CompatRule; 8] = [
        CompatRule::NumpyH5py,
        CompatRule::NumpyPython,
        CompatRule::ScipyPython,
        CompatRule::Ideep,
        CompatRule::LegacyNumpyLibraries,
        CompatRule::ProtobufCentos6,
        CompatRule::NcclCentos6,
        CompatRule::CudaDistribution,
    ];
}

/// A failed rule with its reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rejection {
    pub rule: CompatRule,
    pub reason: String,
}

/// Outcome of validating one combination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Rejected(Rejection),
}

impl Verdict {
    pub fn accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// Rejection reason; `Some` iff rejected.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(r) => Some(&r.reason),
        }
    }

    pub fn rule(&self) -> Option<CompatRule> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(r) => Some(r.rule),
        }
    }
}

/// Fields of a combination the rules need, resolved once.
struct RuleContext<'a> {
    combo: &'a Combination,
    base: &'a str,
    numpy: &'a str,
    cuda: &'a str,
    nccl: &'a str,
    python: Option<PythonVersion>,
}

impl<'a> RuleContext<'a> {
    fn new(combo: &'a Combination, lookup: &dyn PythonVersionLookup) -> Result<Self, String> {
        let base = combo
            .get_str(BASE_AXIS)
            .ok_or_else(|| format!("axis '{BASE_AXIS}' must be a string"))?;
        let numpy = combo
            .get_str(NUMPY_AXIS)
            .ok_or_else(|| format!("axis '{NUMPY_AXIS}' must be a string"))?;
        let (cuda, _cudnn, nccl) = combo
            .get(CUDA_AXIS)
            .and_then(AxisValue::as_triple)
            .ok_or_else(|| format!("axis '{CUDA_AXIS}' must be a 3-part tuple"))?;

        Ok(Self {
            combo,
            base,
            numpy,
            cuda,
            nccl,
            python: lookup.python_version(base),
        })
    }

    fn opt_str(&self, axis: &str) -> Option<&'a str> {
        self.combo.get_str(axis)
    }

    fn numpy_in(&self, versions: &[&str]) -> bool {
        versions.contains(&self.numpy)
    }

    fn base_contains(&self, family: &str) -> bool {
        self.base.contains(family)
    }

    fn base_starts_with_any(&self, families: &[&str]) -> bool {
        families.iter().any(|f| self.base.starts_with(f))
    }
}

/// Evaluate a combination against every rule in order.
pub fn evaluate_combination(combo: &Combination, lookup: &dyn PythonVersionLookup) -> Verdict {
    let ctx = match RuleContext::new(combo, lookup) {
        Ok(ctx) => ctx,
        Err(reason) => {
            return Verdict::Rejected(Rejection {
                rule: CompatRule::RequiredAxes,
                reason,
            })
        }
    };

    CompatRule::ORDERED
        .iter()
        .find_map(|rule| {
            check_rule(*rule, &ctx).map(|reason| Rejection {
                rule: *rule,
                reason,
            })
        })
        .map_or(Verdict::Accepted, Verdict::Rejected)
}

/// Whether iDeep ships wheels for this interpreter.
pub fn is_ideep_supported(python: PythonVersion) -> bool {
    match python.major_minor() {
        (2, _) => python >= PythonVersion::new(2, 7, 6),
        (3, 5) => python >= PythonVersion::new(3, 5, 2),
        (3, 6) | (3, 7) => true,
        _ => false,
    }
}

fn check_rule(rule: CompatRule, ctx: &RuleContext) -> Option<String> {
    match rule {
        CompatRule::RequiredAxes => None,
        CompatRule::NumpyH5py => {
            if ctx.numpy == "1.9" && ctx.combo.is_set("h5py") {
                Some("NumPy 1.9 incompatible with h5py".to_string())
            } else {
                None
            }
        }
        CompatRule::NumpyPython => {
            let Some(python) = ctx.python else {
                return Some(format!(
                    "no interpreter version known for base image {}",
                    ctx.base
                ));
            };
            let unsupported: &[&str] = match python.major_minor() {
                (3, 5) => &["1.9", "1.10"],
                (3, 6) => &["1.9", "1.10", "1.11"],
                (3, 7) => &["1.9", "1.10", "1.11", "1.12", "1.13"],
                _ => &[],
            };
            if ctx.numpy_in(unsupported) {
                Some(format!(
                    "NumPy {} does not support Python {}.{}",
                    ctx.numpy, python.major, python.minor
                ))
            } else {
                None
            }
        }
        CompatRule::ScipyPython => {
            let python = ctx.python?;
            let scipy = ctx.opt_str("scipy")?;
            let unsupported: &[&str] = match python.major_minor() {
                (3, 6) => &["0.18"],
                (3, 7) => &["0.18", "0.19"],
                _ => &[],
            };
            if unsupported.contains(&scipy) {
                Some(format!(
                    "SciPy {} does not support Python {}.{}",
                    scipy, python.major, python.minor
                ))
            } else {
                None
            }
        }
        CompatRule::Ideep => {
            if !ctx.combo.is_set("ideep") {
                return None;
            }
            let python = ctx.python?;
            if ctx.base_contains("centos6")
                || ctx.base_contains("ubuntu14")
                || !is_ideep_supported(python)
            {
                Some(format!("iDeep not supported on {}", ctx.base))
            } else if python.major_minor() >= (3, 7) {
                if ctx.numpy_in(LEGACY_NUMPY) {
                    Some(format!(
                        "iDeep not supported on Python {}.{} with NumPy {}",
                        python.major, python.minor, ctx.numpy
                    ))
                } else {
                    None
                }
            } else if ctx.numpy_in(&LEGACY_NUMPY[..4]) {
                Some(format!("iDeep not supported on NumPy {}", ctx.numpy))
            } else {
                None
            }
        }
        CompatRule::LegacyNumpyLibraries => {
            if ctx.numpy_in(LEGACY_NUMPY) {
                return None;
            }
            match (ctx.opt_str("scipy"), ctx.opt_str("theano")) {
                (Some(scipy @ ("0.18" | "0.19")), _) => Some(format!(
                    "SciPy {} does not support NumPy {}",
                    scipy, ctx.numpy
                )),
                (_, Some(theano @ ("0.8" | "0.9"))) => Some(format!(
                    "Theano {} does not support NumPy {}",
                    theano, ctx.numpy
                )),
                _ => None,
            }
        }
        CompatRule::ProtobufCentos6 => {
            if ctx.base_contains("centos6") && ctx.opt_str("protobuf") == Some("cpp-3") {
                Some(format!("protobuf cpp-3 not supported on {}", ctx.base))
            } else {
                None
            }
        }
        CompatRule::NcclCentos6 => {
            // https://docs.nvidia.com/deeplearning/sdk/nccl-install-guide/index.html#rhel_centos
            if ctx.base_contains("centos6") && ctx.nccl != NONE_COMPONENT {
                Some(format!("NCCL {} is not supported on {}", ctx.nccl, ctx.base))
            } else {
                None
            }
        }
        CompatRule::CudaDistribution => {
            let (label, families): (&str, &[&str]) = match ctx.cuda {
                "cuda80" => ("8.0", &["ubuntu14", "ubuntu16", "centos6", "centos7"]),
                "cuda90" | "cuda91" | "cuda92" => ("9.x", &["ubuntu16", "centos6", "centos7"]),
                "cuda100" | "cuda101" => (
                    "10.x",
                    &["ubuntu14", "ubuntu16", "ubuntu18", "centos6", "centos7"],
                ),
                _ => return None,
            };
            if ctx.base_starts_with_any(families) {
                None
            } else {
                Some(format!("CUDA {} is not supported on {}", label, ctx.base))
            }
        }
    }
}

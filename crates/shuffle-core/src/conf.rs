//! Image build configuration derived from an accepted combination.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::axis::{AxisSet, AxisValue, Combination, BASE_AXIS, CUDA_AXIS};
use crate::error::Result;
use crate::obs;
use crate::python::PythonVersionLookup;
use crate::requirements::{make_require, overwrite_requires_version};
use crate::shuffle;

/// Marker value telling the image build to compile protobuf with the C++ backend.
pub const PROTOBUF_CPP_3: &str = "protobuf-cpp-3";

/// Dependency pins and image parameters handed to the image build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// pip requirement strings, one entry per package.
    pub requires: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuda: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cudnn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nccl: Option<String>,

    #[serde(
        rename = "protobuf-cpp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub protobuf_cpp: Option<String>,
}

impl Configuration {
    /// SHA-256 hex digest of the canonical JSON form.
    ///
    /// Equal configurations share a digest, so it can key image tags.
    pub fn digest(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Pin `axis` to the upper bound of its selected version, if any.
    fn append_require(&mut self, params: &Combination, axis: &str) -> Result<()> {
        self.append_require_as(params, axis, axis)
    }

    fn append_require_as(&mut self, params: &Combination, axis: &str, package: &str) -> Result<()> {
        if let Some(version) = params.get(axis).and_then(AxisValue::as_version) {
            let requirement = make_require(package, version)?;
            overwrite_requires_version(&mut self.requires, package, requirement);
        }
        Ok(())
    }
}

/// Build the configuration for an accepted combination.
///
/// Flags carry no version pin; only string values are turned into
/// constraints.
pub fn make_conf(params: &Combination) -> Result<Configuration> {
    let mut conf = Configuration {
        base: params.get_str(BASE_AXIS).map(str::to_string),
        ..Configuration::default()
    };
    if let Some((cuda, cudnn, nccl)) = params.get(CUDA_AXIS).and_then(AxisValue::as_triple) {
        conf.cuda = Some(cuda.to_string());
        conf.cudnn = Some(cudnn.to_string());
        conf.nccl = Some(nccl.to_string());
    }

    conf.append_require(params, "setuptools")?;
    conf.append_require(params, "pip")?;
    conf.append_require(params, "cython")?;
    conf.append_require(params, "numpy")?;
    conf.append_require(params, "scipy")?;

    // h5py's setup script imports NumPy, so it must come after it.
    conf.append_require(params, "h5py")?;

    conf.append_require(params, "theano")?;

    if params.get_str("protobuf") == Some("cpp-3") {
        conf.protobuf_cpp = Some(PROTOBUF_CPP_3.to_string());
    } else {
        conf.append_require(params, "protobuf")?;
    }

    conf.append_require_as(params, "ideep", "ideep4py")?;
    conf.append_require(params, "pillow")?;

    if params.get("wheel") == Some(&AxisValue::Flag(true)) {
        conf.requires.push("wheel".to_string());
    }

    Ok(conf)
}

/// Select a valid combination for `seed` and build its configuration.
///
/// Logs the selected parameters and the resulting configuration.
pub fn make_shuffle_conf(
    axes: &AxisSet,
    seed: u64,
    lookup: &dyn PythonVersionLookup,
) -> Result<Configuration> {
    let params = shuffle::select(axes, seed, lookup)?;
    conf_for(&params, seed)
}

/// Like [`make_shuffle_conf`], giving up after `max_rounds` rejected rounds.
pub fn make_shuffle_conf_within(
    axes: &AxisSet,
    seed: u64,
    lookup: &dyn PythonVersionLookup,
    max_rounds: u64,
) -> Result<Configuration> {
    let params = shuffle::select_within(axes, seed, lookup, max_rounds)?;
    conf_for(&params, seed)
}

fn conf_for(params: &Combination, seed: u64) -> Result<Configuration> {
    obs::emit_shuffle_parameters(seed, params);
    let conf = make_conf(params)?;
    obs::emit_configuration_built(seed, &conf);
    Ok(conf)
}

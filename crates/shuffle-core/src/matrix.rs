//! Matrix file loading.
//!
//! A matrix file declares the axes to shuffle and, optionally, interpreter
//! versions for base images the built-in table does not know:
//!
//! ```json
//! {
//!   "axes": {
//!     "base": ["ubuntu16_py35", "centos7_py27"],
//!     "numpy": ["1.15", "1.16"],
//!     "cuda_cudnn_nccl": [["none", "none", "none"]]
//!   },
//!   "python_versions": { "ubuntu20_py38": "3.8.10" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::axis::{AxisSet, AxisValue, BASE_AXIS, CUDA_AXIS, NUMPY_AXIS};
use crate::error::Result;
use crate::python::BaseImageTable;

/// Axis definitions plus interpreter-version overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixFile {
    pub axes: AxisSet,

    #[serde(default, skip_serializing_if = "is_empty_table")]
    pub python_versions: BaseImageTable,
}

fn is_empty_table(table: &BaseImageTable) -> bool {
    table.bases().next().is_none()
}

impl MatrixFile {
    /// Read a matrix from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// The built-in base-image table overlaid with this file's overrides.
    pub fn lookup(&self) -> BaseImageTable {
        let mut table = BaseImageTable::builtin();
        table.extend(&self.python_versions);
        table
    }

    /// Default CI matrix used when no file is given.
    pub fn builtin() -> Self {
        let axes = AxisSet::new()
            .with_axis(
                BASE_AXIS,
                [
                    "ubuntu14_py27",
                    "ubuntu14_py34",
                    "ubuntu16_py27",
                    "ubuntu16_py35",
                    "ubuntu16_py36",
                    "ubuntu16_py37",
                    "ubuntu18_py36",
                    "centos6_py27",
                    "centos7_py27",
                    "centos7_py34",
                ],
            )
            .with_axis(
                CUDA_AXIS,
                [
                    ["none", "none", "none"],
                    ["cuda80", "cudnn5-cuda8", "none"],
                    ["cuda80", "cudnn6-cuda8", "nccl1.3.4"],
                    ["cuda90", "cudnn7-cuda9", "nccl2.0-cuda9"],
                    ["cuda91", "cudnn7-cuda91", "nccl2.2-cuda91"],
                    ["cuda92", "cudnn71-cuda92", "nccl2.2-cuda92"],
                    ["cuda100", "cudnn73-cuda100", "nccl2.3-cuda100"],
                    ["cuda101", "cudnn75-cuda101", "nccl2.4-cuda101"],
                ]
                .map(AxisValue::tuple),
            )
            .with_axis(
                NUMPY_AXIS,
                ["1.9", "1.10", "1.11", "1.12", "1.13", "1.14", "1.15", "1.16"],
            )
            .with_axis("scipy", optional(&["0.18", "0.19", "1.0", "1.1", "1.2"]))
            .with_axis("h5py", optional(&["2.5", "2.6", "2.7", "2.8", "2.9"]))
            .with_axis("theano", optional(&["0.8", "0.9", "1.0"]))
            .with_axis("protobuf", ["2", "3", "cpp-3"])
            .with_axis("ideep", optional(&["1.0", "2.0"]))
            .with_axis("pillow", optional(&["3.4", "4.0", "4.1", "5.4", "6.0"]))
            .with_axis("wheel", [false, true]);

        Self {
            axes,
            python_versions: BaseImageTable::empty(),
        }
    }
}

/// Versions plus an "unset" candidate.
fn optional(versions: &[&str]) -> Vec<AxisValue> {
    std::iter::once(AxisValue::None)
        .chain(versions.iter().map(|v| AxisValue::str(*v)))
        .collect()
}

use shuffle_core::{
    evaluate_combination, AxisValue, BaseImageTable, Combination, CompatRule, PythonVersion,
    BASE_AXIS, CUDA_AXIS, NUMPY_AXIS,
};

fn table() -> BaseImageTable {
    BaseImageTable::builtin()
        .with("centos6_py36", PythonVersion::new(3, 6, 8))
        .with("ubuntu18_py38", PythonVersion::new(3, 8, 0))
}

fn combo(base: &str, numpy: &str) -> Combination {
    combo_cuda(base, numpy, ["none", "none", "none"])
}

fn combo_cuda(base: &str, numpy: &str, cuda: [&str; 3]) -> Combination {
    Combination::new()
        .with(BASE_AXIS, base)
        .with(NUMPY_AXIS, numpy)
        .with(CUDA_AXIS, AxisValue::tuple(cuda))
}

fn rejected_by(c: &Combination) -> Option<CompatRule> {
    evaluate_combination(c, &table()).rule()
}

fn reason(c: &Combination) -> String {
    evaluate_combination(c, &table())
        .reason()
        .unwrap_or_default()
        .to_string()
}

// ── Rule 1: NumPy / h5py ────────────────────────────────────────────────

#[test]
fn numpy19_with_h5py_rejected() {
    let c = combo("ubuntu16_py27", "1.9").with("h5py", "2.6");
    assert_eq!(rejected_by(&c), Some(CompatRule::NumpyH5py));
    assert_eq!(reason(&c), "NumPy 1.9 incompatible with h5py");
}

#[test]
fn numpy19_with_unset_h5py_accepted() {
    let c = combo("ubuntu16_py27", "1.9").with("h5py", AxisValue::None);
    assert!(evaluate_combination(&c, &table()).accepted());

    let c = combo("ubuntu16_py27", "1.9").with("h5py", false);
    assert!(evaluate_combination(&c, &table()).accepted());
}

// ── Rules 2 and 3: interpreter support ──────────────────────────────────

#[test]
fn numpy_python35_floor() {
    for numpy in ["1.9", "1.10"] {
        let c = combo("ubuntu16_py35", numpy);
        assert_eq!(rejected_by(&c), Some(CompatRule::NumpyPython));
        assert_eq!(reason(&c), format!("NumPy {numpy} does not support Python 3.5"));
    }
    assert!(rejected_by(&combo("ubuntu16_py35", "1.11")).is_none());
}

#[test]
fn numpy_python36_floor() {
    assert_eq!(
        rejected_by(&combo("ubuntu16_py36", "1.11")),
        Some(CompatRule::NumpyPython)
    );
    assert!(rejected_by(&combo("ubuntu16_py36", "1.12")).is_none());
}

#[test]
fn numpy_python37_floor() {
    assert_eq!(
        rejected_by(&combo("ubuntu16_py37", "1.13")),
        Some(CompatRule::NumpyPython)
    );
    assert!(rejected_by(&combo("ubuntu16_py37", "1.14")).is_none());
}

#[test]
fn python27_has_no_numpy_floor() {
    assert!(rejected_by(&combo("ubuntu14_py27", "1.9")).is_none());
}

#[test]
fn scipy_python_floors() {
    let c = combo("ubuntu16_py36", "1.14").with("scipy", "0.18");
    assert_eq!(rejected_by(&c), Some(CompatRule::ScipyPython));
    assert_eq!(reason(&c), "SciPy 0.18 does not support Python 3.6");

    let c = combo("ubuntu16_py36", "1.14").with("scipy", "0.19");
    assert!(rejected_by(&c).is_none());

    let c = combo("ubuntu16_py37", "1.14").with("scipy", "0.19");
    assert_eq!(reason(&c), "SciPy 0.19 does not support Python 3.7");

    let c = combo("ubuntu16_py35", "1.14").with("scipy", "0.18");
    assert!(rejected_by(&c).is_none());
}

#[test]
fn numpy_rule_wins_over_scipy_rule() {
    let c = combo("ubuntu16_py37", "1.12").with("scipy", "0.18");
    assert_eq!(rejected_by(&c), Some(CompatRule::NumpyPython));
}

// ── Rule 4: iDeep ───────────────────────────────────────────────────────

#[test]
fn ideep_rejected_on_legacy_distributions() {
    for base in ["centos6_py27", "ubuntu14_py27"] {
        let c = combo(base, "1.16").with("ideep", "2.0");
        assert_eq!(rejected_by(&c), Some(CompatRule::Ideep));
        assert_eq!(reason(&c), format!("iDeep not supported on {base}"));
    }
}

#[test]
fn ideep_rejected_on_unsupported_interpreter() {
    for base in ["centos7_py27", "centos7_py34", "ubuntu18_py38"] {
        let c = combo(base, "1.16").with("ideep", "2.0");
        assert_eq!(rejected_by(&c), Some(CompatRule::Ideep), "{base}");
    }
}

#[test]
fn ideep_numpy_floor_below_python37() {
    let c = combo("ubuntu16_py35", "1.12").with("ideep", "1.0");
    assert_eq!(rejected_by(&c), Some(CompatRule::Ideep));
    assert!(reason(&c).contains("1.12"));

    let c = combo("ubuntu16_py35", "1.13").with("ideep", "1.0");
    assert!(rejected_by(&c).is_none());
}

#[test]
fn ideep_numpy_floor_from_python37() {
    let c = combo("ubuntu16_py37", "1.15").with("ideep", "2.0");
    assert_eq!(rejected_by(&c), Some(CompatRule::Ideep));
    assert!(reason(&c).contains("3.7"));

    let c = combo("ubuntu16_py37", "1.16").with("ideep", "2.0");
    assert!(rejected_by(&c).is_none());
}

#[test]
fn unset_ideep_skips_rule() {
    let c = combo("centos6_py27", "1.12").with("ideep", AxisValue::None);
    assert!(rejected_by(&c).is_none());
}

// ── Rule 5: legacy NumPy libraries ──────────────────────────────────────

#[test]
fn old_scipy_needs_legacy_numpy() {
    let c = combo("ubuntu16_py27", "1.16").with("scipy", "0.19");
    assert_eq!(rejected_by(&c), Some(CompatRule::LegacyNumpyLibraries));
    assert_eq!(reason(&c), "SciPy 0.19 does not support NumPy 1.16");

    let c = combo("ubuntu16_py27", "1.15").with("scipy", "0.19");
    assert!(rejected_by(&c).is_none());
}

#[test]
fn old_theano_needs_legacy_numpy() {
    let c = combo("ubuntu16_py27", "1.16").with("theano", "0.9");
    assert_eq!(rejected_by(&c), Some(CompatRule::LegacyNumpyLibraries));
    assert_eq!(reason(&c), "Theano 0.9 does not support NumPy 1.16");

    let c = combo("ubuntu16_py27", "1.16").with("theano", "1.0");
    assert!(rejected_by(&c).is_none());
}

#[test]
fn scipy_reported_before_theano() {
    let c = combo("ubuntu16_py27", "1.16")
        .with("scipy", "0.18")
        .with("theano", "0.8");
    assert!(reason(&c).starts_with("SciPy"));
}

// ── Rules 6 and 7: centos6 ──────────────────────────────────────────────

#[test]
fn protobuf_cpp3_rejected_on_centos6() {
    let c = combo("centos6_py27", "1.16").with("protobuf", "cpp-3");
    assert_eq!(rejected_by(&c), Some(CompatRule::ProtobufCentos6));

    let c = combo("centos7_py27", "1.16").with("protobuf", "cpp-3");
    assert!(rejected_by(&c).is_none());
}

#[test]
fn nccl_always_rejected_on_centos6() {
    let numpys = ["1.9", "1.10", "1.11", "1.12", "1.13", "1.14", "1.15", "1.16"];
    let cudas = [
        ["none", "none", "nccl2.0"],
        ["cuda80", "cudnn6-cuda8", "nccl1.3.4"],
        ["cuda90", "cudnn7-cuda9", "nccl2.0-cuda9"],
        ["cuda101", "cudnn75-cuda101", "nccl2.4-cuda101"],
    ];
    for numpy in numpys {
        for cuda in cudas {
            let c = combo_cuda("centos6_py27", numpy, cuda);
            assert_eq!(rejected_by(&c), Some(CompatRule::NcclCentos6), "{c}");
            let r = reason(&c);
            assert!(r.contains("NCCL") && r.contains("centos6"), "{r}");
        }
    }
}

#[test]
fn centos6_without_nccl_accepted() {
    let c = combo_cuda("centos6_py27", "1.16", ["cuda80", "cudnn6-cuda8", "none"]);
    assert!(evaluate_combination(&c, &table()).accepted());
}

// ── Rule 8: CUDA / distribution ─────────────────────────────────────────

#[test]
fn cuda80_distribution_allow_list() {
    let cuda = ["cuda80", "cudnn6-cuda8", "none"];
    assert!(rejected_by(&combo_cuda("ubuntu14_py27", "1.16", cuda)).is_none());
    let c = combo_cuda("ubuntu18_py36", "1.16", cuda);
    assert_eq!(rejected_by(&c), Some(CompatRule::CudaDistribution));
    assert_eq!(reason(&c), "CUDA 8.0 is not supported on ubuntu18_py36");
}

#[test]
fn cuda9_distribution_allow_list() {
    for cuda in ["cuda90", "cuda91", "cuda92"] {
        let c = combo_cuda("ubuntu14_py27", "1.16", [cuda, "cudnn7", "none"]);
        assert_eq!(reason(&c), "CUDA 9.x is not supported on ubuntu14_py27");
        let c = combo_cuda("ubuntu16_py35", "1.16", [cuda, "cudnn7", "none"]);
        assert!(rejected_by(&c).is_none());
    }
}

#[test]
fn cuda10_distribution_allow_list() {
    for base in ["ubuntu14_py27", "ubuntu18_py36", "centos7_py34"] {
        let c = combo_cuda(base, "1.16", ["cuda100", "cudnn73-cuda100", "none"]);
        assert!(rejected_by(&c).is_none(), "{base}");
    }
    let lookup = BaseImageTable::empty().with("debian9_py35", PythonVersion::new(3, 5, 3));
    let c = combo_cuda("debian9_py35", "1.16", ["cuda101", "cudnn75-cuda101", "none"]);
    assert_eq!(
        evaluate_combination(&c, &lookup).reason(),
        Some("CUDA 10.x is not supported on debian9_py35")
    );
}

#[test]
fn unknown_cuda_version_unrestricted() {
    let c = combo_cuda("ubuntu18_py36", "1.16", ["cuda110", "cudnn8", "none"]);
    assert!(rejected_by(&c).is_none());
}

// ── Precedence ──────────────────────────────────────────────────────────

#[test]
fn scipy_python_rule_reported_before_nccl_rule() {
    let c = combo_cuda("centos6_py36", "1.14", ["cuda80", "cudnn6-cuda8", "nccl1.3.4"])
        .with("scipy", "0.18");

    // Each conflict alone trips its own rule.
    let scipy_only = combo("centos6_py36", "1.14").with("scipy", "0.18");
    assert_eq!(rejected_by(&scipy_only), Some(CompatRule::ScipyPython));
    let nccl_only = combo_cuda("centos6_py36", "1.14", ["cuda80", "cudnn6-cuda8", "nccl1.3.4"]);
    assert_eq!(rejected_by(&nccl_only), Some(CompatRule::NcclCentos6));

    assert_eq!(rejected_by(&c), Some(CompatRule::ScipyPython));
    assert_eq!(reason(&c), "SciPy 0.18 does not support Python 3.6");
}

#[test]
fn accepted_verdict_has_no_reason() {
    let verdict = evaluate_combination(&combo("ubuntu16_py36", "1.16"), &table());
    assert!(verdict.accepted());
    assert_eq!(verdict.reason(), None);
    assert_eq!(verdict.rule(), None);
}

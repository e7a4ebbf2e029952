use crate::{CoreError, CoreResult};

/// Floating point type used throughout the workspace.
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Weighted relative L2 error of `obtained` against `expected`, in percent.
///
/// Rows whose expected value is exactly zero are skipped. A column with no
/// non-zero expected row has no reference to compare against and fails.
pub fn weighted_relative_l2_percent(
    obtained: &[Real],
    expected: &[Real],
    weights: &[Real],
) -> CoreResult<Real> {
    if obtained.len() != expected.len() {
        return Err(CoreError::ShapeMismatch {
            what: "obtained vs expected rows",
            expected: expected.len(),
            got: obtained.len(),
        });
    }
    if weights.len() != expected.len() {
        return Err(CoreError::ShapeMismatch {
            what: "weights vs expected rows",
            expected: expected.len(),
            got: weights.len(),
        });
    }

    let mut up = 0.0;
    let mut down = 0.0;
    let mut referenced = false;
    for ((o, e), w) in obtained.iter().zip(expected).zip(weights) {
        if *e != 0.0 {
            up += w * (1.0 - o / e).powi(2);
            down += w;
            referenced = true;
        }
    }

    if !referenced {
        return Err(CoreError::NoReference {
            what: "reference column",
        });
    }
    ensure_finite((up / down).sqrt() * 100.0, "relative L2 error")
}

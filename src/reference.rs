//! Common-average reference as a projection operator.
//!
//! The average reference of `C` channels is the linear operator
//!
//! ```text
//!   P = I − (1/C) · 1 1ᵀ        (C × C, symmetric, idempotent)
//! ```
//!
//! applied to every epoch as `X ← P · X` (`X` is `[C, T]`), which is the same
//! as `x[c, t] -= mean(x[:, t])`.
//!
//! Projectors are first *registered* on a tensor (inactive) and later
//! *applied*: every inactive projector is composed into one matrix, that
//! matrix is applied once per epoch, and the projectors are marked active so
//! a second application is a no-op.
use ndarray::{s, Array2, Axis};

use crate::epoch::EpochTensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectorKind {
    AverageReference,
}

impl ProjectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectorKind::AverageReference => "average_reference",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "average_reference" => Some(ProjectorKind::AverageReference),
            _ => None,
        }
    }
}

/// A linear projection over channels, registered on an [`EpochTensor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    pub kind: ProjectorKind,
    /// `true` once the projection has been applied to the data.
    pub active: bool,
}

impl Projector {
    pub fn average_reference() -> Self {
        Self { kind: ProjectorKind::AverageReference, active: false }
    }

    /// `[C, C]` matrix of this projection.
    pub fn operator(&self, n_channels: usize) -> Array2<f64> {
        match self.kind {
            ProjectorKind::AverageReference => {
                let mut p = Array2::<f64>::eye(n_channels);
                if n_channels > 0 {
                    p -= 1.0 / n_channels as f64;
                }
                p
            }
        }
    }
}

/// Product of the operators of every inactive projector, or `None` if
/// nothing is pending.
pub fn compose(projectors: &[Projector], n_channels: usize) -> Option<Array2<f64>> {
    projectors
        .iter()
        .filter(|p| !p.active)
        .map(|p| p.operator(n_channels))
        .reduce(|acc, op| op.dot(&acc))
}

/// Apply all pending projectors of `tensor` in place and mark them active.
///
/// Returns the number of projectors applied.
pub fn apply_projections(tensor: &mut EpochTensor) -> usize {
    let n_ch = tensor.n_channels();
    let Some(op) = compose(&tensor.projectors, n_ch) else {
        return 0;
    };
    for e in 0..tensor.n_epochs() {
        let projected = op.dot(&tensor.data.slice(s![e, .., ..]));
        tensor.data.slice_mut(s![e, .., ..]).assign(&projected);
    }
    let mut applied = 0;
    for p in tensor.projectors.iter_mut().filter(|p| !p.active) {
        p.active = true;
        applied += 1;
    }
    applied
}

/// Register an average-reference projector on a copy of `tensor` and apply
/// it.  The input is not modified.
pub fn set_average_reference(tensor: &EpochTensor) -> EpochTensor {
    let mut out = tensor.clone();
    out.projectors.push(Projector::average_reference());
    apply_projections(&mut out);
    out
}

/// Direct form on one `[C, T]` block: subtract the per-sample channel mean.
pub fn average_reference_inplace(data: &mut Array2<f64>) {
    let Some(means) = data.mean_axis(Axis(0)) else {
        return;
    };
    for mut row in data.rows_mut() {
        row -= &means;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_is_idempotent() {
        let p = Projector::average_reference().operator(5);
        let pp = p.dot(&p);
        for (a, b) in p.iter().zip(pp.iter()) {
            approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn operator_matches_direct_form() {
        let x = Array2::from_shape_fn((4, 64), |(c, t)| ((c * 5 + t * 3) as f64).sin() + c as f64);
        let projected = Projector::average_reference().operator(4).dot(&x);
        let mut direct = x.clone();
        average_reference_inplace(&mut direct);
        for (a, b) in projected.iter().zip(direct.iter()) {
            approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn reference_of_constant_gives_zero() {
        let mut data = Array2::from_elem((4, 100), 5.0);
        average_reference_inplace(&mut data);
        for &v in data.iter() {
            approx::assert_abs_diff_eq!(v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn nothing_pending_composes_to_none() {
        let mut p = Projector::average_reference();
        p.active = true;
        assert!(compose(&[p], 3).is_none());
    }

    #[test]
    fn kind_names_round_trip() {
        let k = ProjectorKind::AverageReference;
        assert_eq!(ProjectorKind::parse(k.as_str()), Some(k));
        assert_eq!(ProjectorKind::parse("ssp"), None);
    }
}

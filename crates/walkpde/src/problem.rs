//! Source and boundary data.
//!
//! `f` and `g` are pure functions of a point. Any `Fn(P) -> f64 + Sync`
//! closure qualifies; `Zero` marks the Laplace case so the walks can skip the
//! source integral altogether.

/// A scalar function of a point, evaluable anywhere.
pub trait ScalarField<P>: Sync {
    fn value(&self, p: P) -> f64;

    /// True only if `value` is identically zero.
    #[inline]
    fn vanishes(&self) -> bool {
        false
    }
}

impl<P, F> ScalarField<P> for F
where
    F: Fn(P) -> f64 + Sync,
{
    #[inline]
    fn value(&self, p: P) -> f64 {
        self(p)
    }
}

/// The identically-zero source `f ≡ 0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Zero;

impl<P> ScalarField<P> for Zero {
    #[inline]
    fn value(&self, _p: P) -> f64 {
        0.0
    }

    #[inline]
    fn vanishes(&self) -> bool {
        true
    }
}

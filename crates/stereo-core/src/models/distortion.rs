use nalgebra::{Matrix2, RealField, Vector2};
use serde::{Deserialize, Serialize};

use crate::Real;

/// Number of refinement steps used when inverting the distortion map.
///
/// Five Jacobian steps stay below 0.1 px over a full wide-angle sensor. The
/// residual step needs a milder field (long lenses, or near the image centre)
/// for the same accuracy.
pub const DEFAULT_UNDISTORT_ITERS: u32 = 5;

/// Update rule used by the iterative undistortion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndistortSolver {
    /// Subtract the forward-projection residual from the estimate.
    ///
    /// A Newton step with the identity as Jacobian. Barely contracts at the
    /// corners of wide-angle lenses.
    ResidualStep,
    /// Newton step with the analytic 2×2 Jacobian of the forward map.
    ///
    /// Falls back to [`UndistortSolver::ResidualStep`] for an iteration whose
    /// Jacobian is singular.
    #[default]
    Jacobian,
}

/// Controls the fixed-budget inverse of a distortion model.
///
/// The iteration count is unconditional: no convergence test is performed and
/// no failure is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndistortOptions {
    /// Number of refinement steps; `0` selects [`DEFAULT_UNDISTORT_ITERS`].
    pub iters: u32,
    /// Update rule applied at each step.
    pub solver: UndistortSolver,
}

impl Default for UndistortOptions {
    fn default() -> Self {
        Self {
            iters: DEFAULT_UNDISTORT_ITERS,
            solver: UndistortSolver::Jacobian,
        }
    }
}

impl UndistortOptions {
    /// Effective iteration count.
    pub fn iters_or_default(&self) -> u32 {
        if self.iters == 0 {
            DEFAULT_UNDISTORT_ITERS
        } else {
            self.iters
        }
    }
}

/// Lens distortion acting on normalized image coordinates.
pub trait DistortionModel<S: RealField + Copy> {
    /// Map ideal normalized coordinates to distorted normalized coordinates.
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S>;

    /// Invert [`DistortionModel::distort`] with the given options.
    fn undistort_with(&self, n_dist: &Vector2<S>, opts: &UndistortOptions) -> Vector2<S>;

    /// Invert [`DistortionModel::distort`] with default options.
    fn undistort(&self, n_dist: &Vector2<S>) -> Vector2<S> {
        self.undistort_with(n_dist, &UndistortOptions::default())
    }
}

/// Brown-Conrady radial (`k1`, `k2`, `k3`) and tangential (`p1`, `p2`) distortion.
///
/// Canonical coefficient order is `[k1, k2, k3, p1, p2]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BrownConrady5<S: RealField> {
    pub k1: S,
    pub k2: S,
    pub k3: S,
    pub p1: S,
    pub p2: S,
}

impl BrownConrady5<Real> {
    /// Build from a coefficient slice in `[k1, k2, k3, p1, p2]` order.
    ///
    /// Missing trailing coefficients default to zero, extra ones are ignored.
    pub fn from_coefficients(coeffs: &[Real]) -> Self {
        let mut c = [0.0; 5];
        for (dst, src) in c.iter_mut().zip(coeffs) {
            *dst = *src;
        }
        Self {
            k1: c[0],
            k2: c[1],
            k3: c[2],
            p1: c[3],
            p2: c[4],
        }
    }

    /// Coefficients in `[k1, k2, k3, p1, p2]` order.
    pub fn coefficients(&self) -> [Real; 5] {
        [self.k1, self.k2, self.k3, self.p1, self.p2]
    }

    /// True when every coefficient is exactly zero.
    pub fn is_identity(&self) -> bool {
        self.coefficients().iter().all(|c| *c == 0.0)
    }
}

impl<S: RealField + Copy> BrownConrady5<S> {
    fn distort_impl(&self, x: S, y: S) -> (S, S) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let radial = S::one() + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;

        let two = S::one() + S::one();
        let xy = x * y;

        let x_tan = two * self.p1 * xy + self.p2 * (r2 + two * x * x);
        let y_tan = self.p1 * (r2 + two * y * y) + two * self.p2 * xy;

        (x * radial + x_tan, y * radial + y_tan)
    }

    /// Jacobian of the forward map at `(x, y)`.
    fn jacobian(&self, x: S, y: S) -> Matrix2<S> {
        let two = S::one() + S::one();
        let three = two + S::one();
        let six = three + three;

        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let radial = S::one() + self.k1 * r2 + self.k2 * r4 + self.k3 * r4 * r2;
        // d(radial)/d(r2)
        let d_radial = self.k1 + two * self.k2 * r2 + three * self.k3 * r4;

        let xy = x * y;
        let dxd_dx = radial + two * x * x * d_radial + two * self.p1 * y + six * self.p2 * x;
        let dxd_dy = two * xy * d_radial + two * self.p1 * x + two * self.p2 * y;
        let dyd_dx = two * xy * d_radial + two * self.p1 * x + two * self.p2 * y;
        let dyd_dy = radial + two * y * y * d_radial + six * self.p1 * y + two * self.p2 * x;

        Matrix2::new(dxd_dx, dxd_dy, dyd_dx, dyd_dy)
    }
}

impl<S: RealField + Copy> DistortionModel<S> for BrownConrady5<S> {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S> {
        let (xd, yd) = self.distort_impl(n_undist.x, n_undist.y);
        Vector2::new(xd, yd)
    }

    fn undistort_with(&self, n_dist: &Vector2<S>, opts: &UndistortOptions) -> Vector2<S> {
        let mut est = *n_dist;

        for _ in 0..opts.iters_or_default() {
            let (xd, yd) = self.distort_impl(est.x, est.y);
            let residual = Vector2::new(xd - n_dist.x, yd - n_dist.y);

            let step = match opts.solver {
                UndistortSolver::ResidualStep => residual,
                UndistortSolver::Jacobian => self
                    .jacobian(est.x, est.y)
                    .try_inverse()
                    .map(|j_inv| j_inv * residual)
                    .unwrap_or(residual),
            };
            est -= step;
        }
        est
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec2;

    fn wide_lens() -> BrownConrady5<Real> {
        BrownConrady5 {
            k1: -0.2,
            k2: 0.05,
            k3: 0.0,
            p1: 0.001,
            p2: -0.0005,
        }
    }

    #[test]
    fn from_coefficients_pads_and_truncates() {
        let short = BrownConrady5::from_coefficients(&[0.1, 0.2]);
        assert_eq!(short.coefficients(), [0.1, 0.2, 0.0, 0.0, 0.0]);

        let long = BrownConrady5::from_coefficients(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(long.coefficients(), [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn forward_matches_closed_form() {
        let d = BrownConrady5 {
            k1: 0.1,
            k2: 0.01,
            k3: 0.001,
            p1: 0.002,
            p2: 0.003,
        };
        let (x, y) = (0.3, -0.2);
        let r2: Real = x * x + y * y;
        let radial = 1.0 + 0.1 * r2 + 0.01 * r2.powi(2) + 0.001 * r2.powi(3);
        let dx = 2.0 * 0.002 * x * y + 0.003 * (r2 + 2.0 * x * x);
        let dy = 0.002 * (r2 + 2.0 * y * y) + 2.0 * 0.003 * x * y;

        let out = d.distort(&Vec2::new(x, y));
        assert!((out.x - (x * radial + dx)).abs() < 1e-15);
        assert!((out.y - (y * radial + dy)).abs() < 1e-15);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let d = wide_lens();
        let (x, y) = (0.25, -0.4);
        let h = 1e-7;
        let j = d.jacobian(x, y);

        let f = |x: Real, y: Real| d.distort(&Vec2::new(x, y));
        let ddx = (f(x + h, y) - f(x - h, y)) / (2.0 * h);
        let ddy = (f(x, y + h) - f(x, y - h)) / (2.0 * h);

        assert!((j[(0, 0)] - ddx.x).abs() < 1e-6);
        assert!((j[(1, 0)] - ddx.y).abs() < 1e-6);
        assert!((j[(0, 1)] - ddy.x).abs() < 1e-6);
        assert!((j[(1, 1)] - ddy.y).abs() < 1e-6);
    }

    #[test]
    fn jacobian_solver_converges_faster() {
        let d = wide_lens();
        let ideal = Vec2::new(0.45, -0.3);
        let distorted = d.distort(&ideal);

        let opts = |solver| UndistortOptions { iters: 4, solver };
        let residual_err = (d.undistort_with(&distorted, &opts(UndistortSolver::ResidualStep))
            - ideal)
            .norm();
        let jacobian_err =
            (d.undistort_with(&distorted, &opts(UndistortSolver::Jacobian)) - ideal).norm();

        assert!(jacobian_err < 1e-8, "jacobian err={jacobian_err}");
        assert!(jacobian_err <= residual_err);
    }

    #[test]
    fn zero_iters_uses_default_budget() {
        let opts = UndistortOptions {
            iters: 0,
            solver: UndistortSolver::ResidualStep,
        };
        assert_eq!(opts.iters_or_default(), DEFAULT_UNDISTORT_ITERS);
    }

    /// Plain residual-step loop, unrolled by hand.
    fn residual_steps(d: &BrownConrady5<Real>, n_dist: &Vec2, steps: u32) -> Vec2 {
        let mut est = *n_dist;
        for _ in 0..steps {
            est -= d.distort(&est) - n_dist;
        }
        est
    }

    #[test]
    fn pathological_coefficients_run_exactly_the_budget() {
        let d = BrownConrady5 {
            k1: 2.0,
            k2: -3.0,
            k3: 1.5,
            p1: 0.3,
            p2: -0.3,
        };
        let n = Vec2::new(0.6, -0.5);

        let mut outputs = Vec::new();
        for iters in 1..=DEFAULT_UNDISTORT_ITERS {
            let opts = UndistortOptions {
                iters,
                solver: UndistortSolver::ResidualStep,
            };
            let out = d.undistort_with(&n, &opts);
            let expected = residual_steps(&d, &n, iters);
            assert_eq!(out.x.to_bits(), expected.x.to_bits(), "iters={iters}");
            assert_eq!(out.y.to_bits(), expected.y.to_bits(), "iters={iters}");
            outputs.push(out);
        }
        // Not converged: every extra step still moves the estimate.
        assert!(outputs.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: UndistortOptions =
            serde_json::from_str(r#"{ "solver": "residual_step" }"#).unwrap();
        assert_eq!(opts.iters, DEFAULT_UNDISTORT_ITERS);
        assert_eq!(opts.solver, UndistortSolver::ResidualStep);

        let opts: UndistortOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, UndistortOptions::default());
        assert_eq!(opts.solver, UndistortSolver::Jacobian);
    }
}

use nalgebra::{DMatrix, DVector};

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Approximates the Jacobian of `f: R^n -> R^m` at `x` with central differences of step `h`.
pub fn approximate_jacobian_fd(
    mut f: impl FnMut(&DVector<f64>) -> DVector<f64>,
    x: &DVector<f64>,
    h: f64,
) -> DMatrix<f64> {
    let mut x_perturbed = x.clone();
    let columns: Vec<_> = (0..x.len())
        .map(|i| {
            let x_i = x[i];
            x_perturbed[i] = x_i + h;
            let f_plus = f(&x_perturbed);
            x_perturbed[i] = x_i - h;
            let f_minus = f(&x_perturbed);
            x_perturbed[i] = x_i;
            (f_plus - f_minus) / (2.0 * h)
        })
        .collect();
    DMatrix::from_columns(&columns)
}

/// Approximates the derivative of a matrix-valued function of one variable with central
/// differences of step `h`.
pub fn approximate_derivative_fd(mut f: impl FnMut(f64) -> DMatrix<f64>, x: f64, h: f64) -> DMatrix<f64> {
    (f(x + h) - f(x - h)) / (2.0 * h)
}

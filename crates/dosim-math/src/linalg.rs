//! 3×3 dense solves for the saturation-model normal equations.
//!
//! The fit has three parameters, so a pivoted Gaussian elimination is
//! the whole story; no general factorization machinery is warranted.

/// Pivot magnitudes below this are treated as singular.
const SINGULAR_EPS: f64 = 1e-300;

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when the matrix is numerically singular. The columns
/// of the normal equations span wildly different scales (count rates up
/// to 1e5 against a unit offset column), which pivoting absorbs fine in
/// f64.
pub fn solve3(a: [[f64; 3]; 3], b: [f64; 3]) -> Option<[f64; 3]> {
    let mut m = a;
    let mut rhs = b;

    for k in 0..3 {
        // Partial pivot: largest remaining entry in column k.
        let mut pivot_row = k;
        let mut pivot_mag = m[k][k].abs();
        for r in (k + 1)..3 {
            if m[r][k].abs() > pivot_mag {
                pivot_mag = m[r][k].abs();
                pivot_row = r;
            }
        }
        if !pivot_mag.is_finite() || pivot_mag < SINGULAR_EPS {
            return None;
        }
        if pivot_row != k {
            m.swap(k, pivot_row);
            rhs.swap(k, pivot_row);
        }

        for r in (k + 1)..3 {
            let factor = m[r][k] / m[k][k];
            for c in k..3 {
                m[r][c] -= factor * m[k][c];
            }
            rhs[r] -= factor * rhs[k];
        }
    }

    let mut x = [0.0; 3];
    for k in (0..3).rev() {
        let mut sum = rhs[k];
        for c in (k + 1)..3 {
            sum -= m[k][c] * x[c];
        }
        if m[k][k].abs() < SINGULAR_EPS {
            return None;
        }
        x[k] = sum / m[k][k];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// Invert a 3×3 matrix by solving against the identity columns.
///
/// Returns `None` when the matrix is numerically singular.
pub fn invert3(a: [[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let mut inv = [[0.0; 3]; 3];
    for (j, unit) in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
        .into_iter()
        .enumerate()
    {
        let col = solve3(a, unit)?;
        for i in 0..3 {
            inv[i][j] = col[i];
        }
    }
    Some(inv)
}

/// `a * v` for a 3×3 matrix and a 3-vector.
pub fn mat3_mul_vec(a: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for i in 0..3 {
        out[i] = a[i][0] * v[0] + a[i][1] * v[1] + a[i][2] * v[2];
    }
    out
}

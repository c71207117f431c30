/// Absolute tolerance used when the caller has no preference.
pub const DEFAULT_ABS_TOL: f64 = 1.49e-8;

/// Recursion limit per interval. Reaching it accepts the current estimate.
pub const MAX_DEPTH: u32 = 50;

/// Adaptive Simpson quadrature of `f` over `[a, b]`.
///
/// A reversed interval gives the negated integral.
pub fn adaptive_simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, tol: f64) -> f64 {
    if a == b {
        return 0.0;
    }
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    let whole = simpson(a, b, fa, fm, fb);
    refine(&f, a, b, fa, fm, fb, whole, tol, MAX_DEPTH)
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn refine<F: Fn(f64) -> f64>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tol: f64,
    depth: u32,
) -> f64 {
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;

    if depth == 0 || delta.abs() <= 15.0 * tol {
        return left + right + delta / 15.0;
    }
    refine(f, a, m, fa, flm, fm, left, 0.5 * tol, depth - 1)
        + refine(f, m, b, fm, frm, fb, right, 0.5 * tol, depth - 1)
}

/// Integrate over `[a, b]`, splitting at every breakpoint strictly inside
/// the interval. Each piece gets a share of `tol` proportional to its width.
pub fn integrate_piecewise<F: Fn(f64) -> f64>(
    f: F,
    breakpoints: &[f64],
    a: f64,
    b: f64,
    tol: f64,
) -> f64 {
    if a > b {
        return -integrate_piecewise(f, breakpoints, b, a, tol);
    }
    let width = b - a;
    if width == 0.0 {
        return 0.0;
    }

    let mut edges = vec![a];
    edges.extend(breakpoints.iter().copied().filter(|&k| a < k && k < b));
    edges.push(b);

    edges
        .windows(2)
        .map(|w| adaptive_simpson(&f, w[0], w[1], tol * (w[1] - w[0]) / width))
        .sum()
}

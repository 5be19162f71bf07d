//! Derivative-free Nelder-Mead minimization.
//!
//! The objective is any closure over a parameter slice. An optional constraint
//! strategy repairs every newly created vertex in place before it is scored,
//! which is how bounded searches keep their candidates inside the feasible
//! region without penalty terms.

/// Reflection coefficient.
const ALPHA: f64 = 1.0;
/// Contraction coefficient.
const BETA: f64 = 0.5;
/// Expansion coefficient.
const GAMMA: f64 = 2.0;

/// Repairs a candidate vertex in place.
pub type Constraint<'a> = &'a dyn Fn(&mut [f64]);

/// Stopping rule and initial simplex size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimplexOptions {
    /// Converged when the standard deviation of the vertex values drops below this.
    pub epsilon: f64,
    /// Edge length of the initial simplex.
    pub scale: f64,
    pub max_iterations: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimplexResult {
    /// Iterations run; equals `max_iterations` when not converged.
    pub iterations: usize,
    pub converged: bool,
    /// Objective value at the returned point.
    pub value: f64,
}

fn repair(v: &mut [f64], constraint: Option<Constraint<'_>>) {
    if let Some(c) = constraint {
        c(v);
    }
}

/// Minimizes `f` starting from `start`, which receives the best vertex found.
pub fn minimize<F>(
    f: F,
    start: &mut [f64],
    options: &SimplexOptions,
    constraint: Option<Constraint<'_>>,
) -> SimplexResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = start.len();
    if n == 0 {
        return SimplexResult {
            iterations: 0,
            converged: true,
            value: f(start),
        };
    }

    // regular simplex with edge length `scale` around the start point
    let nf = n as f64;
    let root = (nf + 1.0).sqrt();
    let pn = options.scale * (root - 1.0 + nf) / (nf * std::f64::consts::SQRT_2);
    let qn = options.scale * (root - 1.0) / (nf * std::f64::consts::SQRT_2);

    let mut v: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    v.push(start.to_vec());
    for i in 0..n {
        let mut vertex = start.to_vec();
        for (j, x) in vertex.iter_mut().enumerate() {
            *x += if i == j { pn } else { qn };
        }
        v.push(vertex);
    }
    for vertex in v.iter_mut() {
        repair(vertex, constraint);
    }
    let mut fv: Vec<f64> = v.iter().map(|x| f(x)).collect();

    let mut centroid = vec![0.0; n];
    let mut vr = vec![0.0; n];
    let mut ve = vec![0.0; n];
    let mut vc = vec![0.0; n];

    let mut iterations = 0;
    let mut converged = false;
    while iterations < options.max_iterations {
        iterations += 1;

        let (best, second, worst) = rank(&fv);

        for (j, c) in centroid.iter_mut().enumerate() {
            *c = v
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != worst)
                .map(|(_, x)| x[j])
                .sum::<f64>()
                / nf;
        }

        for j in 0..n {
            vr[j] = centroid[j] + ALPHA * (centroid[j] - v[worst][j]);
        }
        repair(&mut vr, constraint);
        let fr = f(&vr);

        if fr < fv[second] && fr >= fv[best] {
            v[worst].copy_from_slice(&vr);
            fv[worst] = fr;
        } else if fr < fv[best] {
            for j in 0..n {
                ve[j] = centroid[j] + GAMMA * (vr[j] - centroid[j]);
            }
            repair(&mut ve, constraint);
            let fe = f(&ve);
            if fe < fr {
                v[worst].copy_from_slice(&ve);
                fv[worst] = fe;
            } else {
                v[worst].copy_from_slice(&vr);
                fv[worst] = fr;
            }
        } else {
            // contraction, outside when the reflection improved on the worst vertex
            let outside = fr < fv[worst];
            for j in 0..n {
                vc[j] = if outside {
                    centroid[j] + BETA * (vr[j] - centroid[j])
                } else {
                    centroid[j] - BETA * (centroid[j] - v[worst][j])
                };
            }
            repair(&mut vc, constraint);
            let fc = f(&vc);
            let accept = if outside { fc <= fr } else { fc < fv[worst] };
            if accept {
                v[worst].copy_from_slice(&vc);
                fv[worst] = fc;
            } else {
                let anchor = v[best].clone();
                for (i, vertex) in v.iter_mut().enumerate() {
                    if i == best {
                        continue;
                    }
                    for (x, a) in vertex.iter_mut().zip(anchor.iter()) {
                        *x = a + (*x - a) * 0.5;
                    }
                    repair(vertex, constraint);
                    fv[i] = f(vertex);
                }
            }
        }

        let mean = fv.iter().sum::<f64>() / (nf + 1.0);
        let spread = (fv.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (nf + 1.0)).sqrt();
        if spread < options.epsilon {
            converged = true;
            break;
        }
    }

    let (best, _, _) = rank(&fv);
    start.copy_from_slice(&v[best]);
    SimplexResult {
        iterations,
        converged,
        value: fv[best],
    }
}

/// Indices of the best, second worst and worst vertex.
fn rank(fv: &[f64]) -> (usize, usize, usize) {
    let mut best = 0;
    let mut worst = 0;
    for (i, &x) in fv.iter().enumerate() {
        if x < fv[best] {
            best = i;
        }
        if x > fv[worst] {
            worst = i;
        }
    }
    let mut second = best;
    for (i, &x) in fv.iter().enumerate() {
        if i != worst && x >= fv[second] {
            second = i;
        }
    }
    (best, second, worst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(max_iterations: usize) -> SimplexOptions {
        SimplexOptions {
            epsilon: 1e-10,
            scale: 1.0,
            max_iterations,
        }
    }

    #[test]
    fn finds_quadratic_minimum() {
        let f = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2) + 0.5;
        let mut p = [0.0, 0.0];
        let res = minimize(f, &mut p, &options(1000), None);
        assert!(res.converged);
        assert!((p[0] - 3.0).abs() < 1e-3, "{p:?}");
        assert!((p[1] + 1.0).abs() < 1e-3, "{p:?}");
        assert!((res.value - 0.5).abs() < 1e-6);
    }

    #[test]
    fn reports_missing_convergence() {
        let f = |x: &[f64]| (x[0] - 100.0).powi(2);
        let mut p = [0.0];
        let res = minimize(f, &mut p, &options(3), None);
        assert!(!res.converged);
        assert_eq!(res.iterations, 3);
    }

    #[test]
    fn constraint_keeps_vertices_feasible() {
        let fold = |x: &mut [f64]| x[0] = x[0].abs();
        let f = |x: &[f64]| {
            assert!(x[0] >= 0.0, "objective saw infeasible {x:?}");
            (x[0] - 2.0).powi(2)
        };
        let mut p = [0.1];
        let res = minimize(f, &mut p, &SimplexOptions { scale: 3.0, ..options(500) }, Some(&fold));
        assert!(res.converged);
        assert!((p[0] - 2.0).abs() < 1e-3, "{p:?}");
    }
}

//! Degree distributions and index sampling.
//!
//! The CDFs here drive code-block composition: choose a degree `d` from a
//! distribution, then pick `d` source blocks uniformly and XOR them into one
//! code block. CDFs are one-based: the probability of degree 1 is `cdf[1]`.

use std::collections::HashSet;

use crate::mersenne::Source;

/// CDF of the ideal soliton distribution over `1..=n`.
pub fn soliton_distribution(n: usize) -> Vec<f64> {
    let mut cdf = vec![0.0; n + 1];
    cdf[1] = 1.0 / n as f64;
    for i in 2..=n {
        cdf[i] = cdf[i - 1] + 1.0 / (i as f64 * (i - 1) as f64);
    }
    cdf
}

/// CDF of the robust soliton distribution over `1..=n`.
///
/// Adds the spike correction to the ideal soliton pdf before normalizing:
/// `1/(i*m)` for `i < m` and `ln(n/(m*delta))/m` at `i == m`.
pub fn robust_soliton_distribution(n: usize, m: usize, delta: f64) -> Vec<f64> {
    let mut pdf = vec![0.0; n + 1];

    pdf[1] = 1.0 / n as f64 + 1.0 / m as f64;
    let mut total = pdf[1];
    for i in 2..=n {
        pdf[i] = 1.0 / (i as f64 * (i - 1) as f64);
        if i < m {
            pdf[i] += 1.0 / (i as f64 * m as f64);
        }
        if i == m {
            pdf[i] += (n as f64 / (m as f64 * delta)).ln() / m as f64;
        }
        total += pdf[i];
    }

    let mut cdf = vec![0.0; n + 1];
    for i in 1..=n {
        cdf[i] = cdf[i - 1] + pdf[i] / total;
    }
    cdf
}

/// CDF of the soliton-like distribution for Online codes, after Maymounkov
/// and Mazieres ("Rateless Codes and Big Downloads").
///
/// `epsilon` is the overage factor required to reconstruct the message. The
/// support is `1..=F` with `F = ceil(ln(eps^2/4) / ln(1 - eps/2))`.
pub fn online_soliton_distribution(epsilon: f64) -> Vec<f64> {
    let f = (epsilon * epsilon / 4.0).ln() / (1.0 - epsilon / 2.0).ln();
    let f = f.ceil();

    let mut cdf = vec![0.0; f as usize + 1];
    let rho = 1.0 - ((1.0 + 1.0 / f) / (1.0 + epsilon));
    cdf[1] = rho;

    for i in 2..=f as usize {
        let rho_i = ((1.0 - rho) * f) / ((f - 1.0) * (i - 1) as f64 * i as f64);
        cdf[i] = cdf[i - 1] + rho_i;
    }

    cdf
}

/// Draws a degree from the CDF: the smallest `i` with `cdf[i] > r` for a
/// uniform `r`, saturating at `cdf.len() - 1`.
///
/// When the search lands on an entry exactly equal to `r` the next index is
/// returned; published index vectors depend on that exact behavior.
pub fn pick_degree(random: &mut dyn Source, cdf: &[f64]) -> usize {
    let r = random.uniform();
    let d = cdf.partition_point(|&c| c < r);
    if d < cdf.len() && cdf[d] > r {
        return d;
    }
    if d < cdf.len() - 1 {
        d + 1
    } else {
        cdf.len() - 1
    }
}

/// Picks `num` distinct values from `[0, max)` uniformly, sorted ascending.
///
/// If `num >= max` every index is returned without touching the generator.
pub fn sample_uniform(random: &mut dyn Source, num: usize, max: usize) -> Vec<usize> {
    if num >= max {
        return (0..max).collect();
    }

    let mut picks = Vec::with_capacity(num);
    let mut seen = HashSet::new();
    for _ in 0..num {
        let mut p = random.int_n(max as i64) as usize;
        while seen.contains(&p) {
            p = random.int_n(max as i64) as usize;
        }
        picks.push(p);
        seen.insert(p);
    }
    picks.sort_unstable();
    picks
}

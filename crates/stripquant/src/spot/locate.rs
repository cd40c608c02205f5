//! Spot localization: k-means over mask pixel coordinates.
//!
//! Seeding is k-means++ (D² weighted) with several restarts; the restart with
//! the lowest within-cluster sum of squares is kept. The RNG is seeded from
//! the config, so results are reproducible.

use rand::prelude::*;

use crate::config::ClusterConfig;
use crate::error::{AssayError, Result};

/// Result of the best clustering restart.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SpotClusters {
    /// Cluster centroids `[x, y]`, order unspecified.
    pub centers: Vec<[f64; 2]>,
    /// Number of points assigned to each centroid.
    pub sizes: Vec<usize>,
    /// Within-cluster sum of squared distances.
    pub compactness: f64,
    /// Lloyd iterations used by the winning restart.
    pub iterations: usize,
}

#[inline]
fn dist2(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

fn nearest(p: [f64; 2], centers: &[[f64; 2]]) -> (usize, f64) {
    let mut best = (0usize, f64::INFINITY);
    for (i, &c) in centers.iter().enumerate() {
        let d = dist2(p, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

/// k-means++ seeding: each new center is drawn with probability ∝ D².
fn seed_plus_plus(points: &[[f64; 2]], k: usize, rng: &mut impl Rng) -> Vec<[f64; 2]> {
    let n = points.len();
    let mut centers = Vec::with_capacity(k);
    centers.push(points[rng.gen_range(0..n)]);

    let mut d2: Vec<f64> = points.iter().map(|&p| dist2(p, centers[0])).collect();
    while centers.len() < k {
        let total: f64 = d2.iter().sum();
        let next = if total > 0.0 && total.is_finite() {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = d2.iter().rposition(|&w| w > 0.0).unwrap_or(n - 1);
            for (i, &w) in d2.iter().enumerate() {
                if target < w {
                    chosen = i;
                    break;
                }
                target -= w;
            }
            chosen
        } else {
            rng.gen_range(0..n)
        };
        let c = points[next];
        centers.push(c);
        for (d, &p) in d2.iter_mut().zip(points) {
            *d = d.min(dist2(p, c));
        }
    }
    centers
}

struct LloydOutcome {
    centers: Vec<[f64; 2]>,
    sizes: Vec<usize>,
    compactness: f64,
    iterations: usize,
    converged: bool,
}

fn lloyd(points: &[[f64; 2]], mut centers: Vec<[f64; 2]>, config: &ClusterConfig) -> LloydOutcome {
    let k = centers.len();
    let eps2 = config.epsilon * config.epsilon;
    let mut labels = vec![0usize; points.len()];
    let mut sizes = vec![0usize; k];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iters {
        iterations += 1;

        let mut sums = vec![[0.0f64; 2]; k];
        sizes.iter_mut().for_each(|s| *s = 0);
        for (label, &p) in labels.iter_mut().zip(points) {
            let (idx, _) = nearest(p, &centers);
            *label = idx;
            sums[idx][0] += p[0];
            sums[idx][1] += p[1];
            sizes[idx] += 1;
        }

        let mut max_shift2 = 0.0f64;
        for j in 0..k {
            let updated = if sizes[j] > 0 {
                let n = sizes[j] as f64;
                [sums[j][0] / n, sums[j][1] / n]
            } else {
                // Empty cluster: restart it at the point farthest from its center.
                let far = points
                    .iter()
                    .zip(&labels)
                    .map(|(&p, &l)| dist2(p, centers[l]))
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                points[far]
            };
            max_shift2 = max_shift2.max(dist2(updated, centers[j]));
            centers[j] = updated;
        }

        if max_shift2 <= eps2 {
            converged = true;
            break;
        }
    }

    let mut compactness = 0.0;
    sizes.iter_mut().for_each(|s| *s = 0);
    for &p in points {
        let (idx, d) = nearest(p, &centers);
        sizes[idx] += 1;
        compactness += d;
    }

    LloydOutcome {
        centers,
        sizes,
        compactness,
        iterations,
        converged,
    }
}

/// Partition `points` into `config.k` clusters and return their centroids.
///
/// Fails with [`AssayError::Segmentation`] when there are fewer points than
/// clusters. Overlapping spots are not detected: they yield centroids that
/// are valid means but do not correspond one-to-one with physical spots.
pub fn locate_spots(points: &[[f64; 2]], config: &ClusterConfig) -> Result<SpotClusters> {
    let k = config.k;
    if k == 0 || points.len() < k {
        return Err(AssayError::Segmentation {
            found: points.len(),
            needed: k.max(1),
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<LloydOutcome> = None;

    for attempt in 0..config.attempts.max(1) {
        let seeds = seed_plus_plus(points, k, &mut rng);
        let outcome = lloyd(points, seeds, config);
        if !outcome.converged {
            tracing::warn!(
                "k-means attempt {} hit the iteration cap ({}) without converging",
                attempt,
                config.max_iters
            );
        }
        tracing::trace!(
            "k-means attempt {}: compactness={:.3}, iterations={}",
            attempt,
            outcome.compactness,
            outcome.iterations
        );
        let better = match &best {
            Some(b) => outcome.compactness < b.compactness,
            None => true,
        };
        if better {
            best = Some(outcome);
        }
    }

    let best = best.ok_or(AssayError::Segmentation {
        found: points.len(),
        needed: k,
    })?;
    tracing::debug!(
        "k-means: {} clusters over {} points, compactness={:.3}",
        k,
        points.len(),
        best.compactness
    );

    Ok(SpotClusters {
        centers: best.centers,
        sizes: best.sizes,
        compactness: best.compactness,
        iterations: best.iterations,
    })
}

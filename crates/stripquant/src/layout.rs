//! Assignment of spot centers to sample roles.
//!
//! The card is a 3×3 grid read column-major from the top-left:
//!
//! ```text
//!            col 0   col 1    col 2
//!   row 0    C1*     QC1      C4
//!   row 1    C2      Tested   C5
//!   row 2    C3      QC2      C6
//! ```
//!
//! `C1*` is the blank calibrator. It carries no visible marker, so only
//! eight spots are clustered and C1 is extrapolated from its neighbors.
//! The grid resolver assumes the card is photographed close to this
//! orientation; rotation beyond a small skew is not detected.

use std::cmp::Ordering;

use crate::error::LayoutError;
use crate::roles::{RoleMap, SampleRole};

/// Spots with a visible marker.
pub const VISIBLE_SPOTS: usize = 8;

/// Visible roles in column-major grid order (C1 omitted).
const VISIBLE_ORDER: [SampleRole; VISIBLE_SPOTS] = [
    SampleRole::C2,
    SampleRole::C3,
    SampleRole::QC1,
    SampleRole::Tested,
    SampleRole::QC2,
    SampleRole::C4,
    SampleRole::C5,
    SampleRole::C6,
];

/// Visible members per column, left to right.
const COLUMN_SIZES: [usize; 3] = [2, 3, 3];

/// Pixel location of every role on the card.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpotLayout {
    /// Spot center `[x, y]` per role.
    pub points: RoleMap<[f64; 2]>,
    /// The role whose point was extrapolated rather than detected.
    pub extrapolated: SampleRole,
}

impl SpotLayout {
    pub fn point(&self, role: SampleRole) -> [f64; 2] {
        self.points[role]
    }

    pub fn is_extrapolated(&self, role: SampleRole) -> bool {
        self.extrapolated == role
    }
}

/// Maps unordered spot centers onto roles.
///
/// The grid heuristic is the default; template matching or other strategies
/// can be plugged into [`crate::Analyzer::analyze_with_resolver`].
pub trait LayoutResolver {
    fn resolve(&self, centers: &[[f64; 2]]) -> Result<SpotLayout, LayoutError>;
}

/// Sort-based resolver for the canonical card orientation.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridLayoutResolver {
    /// Two centers share a column when their x-difference is below this
    /// fraction of the minimum pairwise center distance.
    pub column_tolerance: f64,
}

impl Default for GridLayoutResolver {
    fn default() -> Self {
        Self {
            column_tolerance: 0.5,
        }
    }
}

/// Smallest pairwise distance; a proxy for one grid cell.
pub fn min_pairwise_distance(centers: &[[f64; 2]]) -> f64 {
    let mut best = f64::INFINITY;
    for i in 0..centers.len() {
        for j in (i + 1)..centers.len() {
            let dx = centers[i][0] - centers[j][0];
            let dy = centers[i][1] - centers[j][1];
            best = best.min((dx * dx + dy * dy).sqrt());
        }
    }
    best
}

fn cmp_xy(a: &[f64; 2], b: &[f64; 2]) -> Ordering {
    a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1]))
}

fn cmp_yx(a: &[f64; 2], b: &[f64; 2]) -> Ordering {
    a[1].total_cmp(&b[1]).then(a[0].total_cmp(&b[0]))
}

/// Group centers into columns, left to right, each sorted top to bottom.
fn group_columns(centers: &[[f64; 2]], tolerance_px: f64) -> Vec<Vec<[f64; 2]>> {
    let mut sorted = centers.to_vec();
    sorted.sort_by(cmp_xy);

    let mut columns: Vec<Vec<[f64; 2]>> = Vec::new();
    for p in sorted {
        let joins_last = columns.last().is_some_and(|col| {
            let mean_x = col.iter().map(|c| c[0]).sum::<f64>() / col.len() as f64;
            (p[0] - mean_x).abs() < tolerance_px
        });
        match columns.last_mut() {
            Some(col) if joins_last => col.push(p),
            _ => columns.push(vec![p]),
        }
    }
    for col in &mut columns {
        col.sort_by(cmp_yx);
    }
    columns
}

/// Parallelogram completion of the missing top-left corner.
///
/// Each estimate extends a grid edge one cell past its end point:
/// `c2 + (c2 - c3)` up the left column and `qc1 + (qc1 - c4)` along the top
/// row. The two are averaged to spread skew error.
pub fn extrapolate_corner(c2: [f64; 2], c3: [f64; 2], qc1: [f64; 2], c4: [f64; 2]) -> [f64; 2] {
    let from_column = [2.0 * c2[0] - c3[0], 2.0 * c2[1] - c3[1]];
    let from_row = [2.0 * qc1[0] - c4[0], 2.0 * qc1[1] - c4[1]];
    [
        0.5 * (from_column[0] + from_row[0]),
        0.5 * (from_column[1] + from_row[1]),
    ]
}

impl LayoutResolver for GridLayoutResolver {
    fn resolve(&self, centers: &[[f64; 2]]) -> Result<SpotLayout, LayoutError> {
        if centers.len() != VISIBLE_SPOTS {
            return Err(LayoutError::WrongSpotCount {
                expected: VISIBLE_SPOTS,
                got: centers.len(),
            });
        }
        let min_dist = min_pairwise_distance(centers);
        if !min_dist.is_finite() || min_dist <= f64::EPSILON {
            return Err(LayoutError::DegenerateSpacing { min_dist });
        }

        let columns = group_columns(centers, self.column_tolerance * min_dist);
        let sizes: Vec<usize> = columns.iter().map(Vec::len).collect();
        if sizes != COLUMN_SIZES {
            return Err(LayoutError::InconsistentColumns {
                got: sizes,
                expected: COLUMN_SIZES.to_vec(),
            });
        }

        let mut points = RoleMap::from_fn(|_| [f64::NAN; 2]);
        for (role, p) in VISIBLE_ORDER.iter().zip(columns.into_iter().flatten()) {
            points[*role] = p;
        }
        points[SampleRole::C1] = extrapolate_corner(
            points[SampleRole::C2],
            points[SampleRole::C3],
            points[SampleRole::QC1],
            points[SampleRole::C4],
        );

        tracing::debug!(
            "layout resolved: min_dist={:.2}px, C1 extrapolated at ({:.1}, {:.1})",
            min_dist,
            points[SampleRole::C1][0],
            points[SampleRole::C1][1]
        );

        Ok(SpotLayout {
            points,
            extrapolated: SampleRole::C1,
        })
    }
}

//! Sample roles on the test card and role-indexed containers.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Number of roles on a card.
pub const ROLE_COUNT: usize = 9;

/// Semantic identity of one spot on the card.
///
/// Discriminants give the fixed output order used by [`RoleMap`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum SampleRole {
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    QC1,
    QC2,
    Tested,
}

/// What a role is used for, with the level index where one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    /// Calibrator with increasing reference concentration, level `0..6`.
    Calibrator(usize),
    /// Quality-control spot, level `0..2`.
    QualityControl(usize),
    /// The unknown spot.
    Tested,
}

impl SampleRole {
    /// All roles in output order.
    pub const ALL: [SampleRole; ROLE_COUNT] = [
        Self::C1,
        Self::C2,
        Self::C3,
        Self::C4,
        Self::C5,
        Self::C6,
        Self::QC1,
        Self::QC2,
        Self::Tested,
    ];

    /// The six calibrators, lowest concentration first.
    pub const CALIBRATORS: [SampleRole; 6] =
        [Self::C1, Self::C2, Self::C3, Self::C4, Self::C5, Self::C6];

    /// The two quality-control roles.
    pub const QUALITY_CONTROLS: [SampleRole; 2] = [Self::QC1, Self::QC2];

    /// Position in output order.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn kind(self) -> RoleKind {
        match self {
            Self::C1 => RoleKind::Calibrator(0),
            Self::C2 => RoleKind::Calibrator(1),
            Self::C3 => RoleKind::Calibrator(2),
            Self::C4 => RoleKind::Calibrator(3),
            Self::C5 => RoleKind::Calibrator(4),
            Self::C6 => RoleKind::Calibrator(5),
            Self::QC1 => RoleKind::QualityControl(0),
            Self::QC2 => RoleKind::QualityControl(1),
            Self::Tested => RoleKind::Tested,
        }
    }

    /// Whether the role carries a known reference concentration.
    pub fn has_reference(self) -> bool {
        !matches!(self.kind(), RoleKind::Tested)
    }

    /// Whether the role takes part in the calibration fit.
    pub fn is_calibrator(self) -> bool {
        matches!(self.kind(), RoleKind::Calibrator(_))
    }
}

impl fmt::Display for SampleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::C1 => "C1",
            Self::C2 => "C2",
            Self::C3 => "C3",
            Self::C4 => "C4",
            Self::C5 => "C5",
            Self::C6 => "C6",
            Self::QC1 => "QC1",
            Self::QC2 => "QC2",
            Self::Tested => "Tested",
        };
        f.write_str(name)
    }
}

/// One value per role, stored in output order.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RoleMap<T>([T; ROLE_COUNT]);

impl<T> RoleMap<T> {
    /// Build by evaluating `f` once per role, in output order.
    pub fn from_fn(mut f: impl FnMut(SampleRole) -> T) -> Self {
        Self(SampleRole::ALL.map(&mut f))
    }

    /// Build by evaluating a fallible `f` once per role, stopping at the first error.
    pub fn try_from_fn<E>(mut f: impl FnMut(SampleRole) -> Result<T, E>) -> Result<Self, E>
    where
        T: Copy + Default,
    {
        let mut values = [T::default(); ROLE_COUNT];
        for role in SampleRole::ALL {
            values[role.index()] = f(role)?;
        }
        Ok(Self(values))
    }

    /// Iterate `(role, value)` pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (SampleRole, &T)> + '_ {
        SampleRole::ALL.into_iter().zip(self.0.iter())
    }

    /// Values in output order.
    pub fn values(&self) -> &[T; ROLE_COUNT] {
        &self.0
    }

    pub fn map<U>(&self, mut f: impl FnMut(SampleRole, &T) -> U) -> RoleMap<U> {
        RoleMap::from_fn(|role| f(role, &self.0[role.index()]))
    }
}

impl<T> Index<SampleRole> for RoleMap<T> {
    type Output = T;

    fn index(&self, role: SampleRole) -> &T {
        &self.0[role.index()]
    }
}

impl<T> IndexMut<SampleRole> for RoleMap<T> {
    fn index_mut(&mut self, role: SampleRole) -> &mut T {
        &mut self.0[role.index()]
    }
}

/// Mean grayscale intensity (0..=255) per role.
pub type IntensityMap = RoleMap<f64>;

/// Estimated concentration per role.
pub type ConcentrationMap = RoleMap<f64>;

/// Reference concentrations of a reagent kit.
///
/// Passed explicitly into calibration and QC so that kits with different
/// reference tables can share one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReferenceTable {
    /// C1..C6, increasing.
    pub calibrators: [f64; 6],
    /// QC1, QC2.
    pub quality_controls: [f64; 2],
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self {
            calibrators: [0.0, 5.0, 10.0, 20.0, 40.0, 80.0],
            quality_controls: [15.0, 60.0],
        }
    }
}

impl ReferenceTable {
    /// Reference concentration for `role`, `None` for the tested spot.
    pub fn reference(&self, role: SampleRole) -> Option<f64> {
        match role.kind() {
            RoleKind::Calibrator(level) => Some(self.calibrators[level]),
            RoleKind::QualityControl(level) => Some(self.quality_controls[level]),
            RoleKind::Tested => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_order_matches_discriminants() {
        for (i, role) in SampleRole::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
        }
        assert_eq!(SampleRole::Tested.index(), ROLE_COUNT - 1);
    }

    #[test]
    fn only_tested_lacks_reference() {
        let table = ReferenceTable::default();
        for role in SampleRole::ALL {
            assert_eq!(role.has_reference(), table.reference(role).is_some());
        }
        assert!(!SampleRole::Tested.has_reference());
        assert_eq!(table.reference(SampleRole::QC2), Some(60.0));
        assert_eq!(table.reference(SampleRole::C4), Some(20.0));
    }

    #[test]
    fn role_map_indexing_and_iteration() {
        let mut map = RoleMap::from_fn(|role| role.index() as f64);
        map[SampleRole::QC1] = 42.0;
        assert_eq!(map[SampleRole::QC1], 42.0);
        assert_eq!(map[SampleRole::C3], 2.0);
        let roles: Vec<SampleRole> = map.iter().map(|(r, _)| r).collect();
        assert_eq!(roles, SampleRole::ALL.to_vec());
    }

    #[test]
    fn role_map_try_from_fn_stops_on_error() {
        let out: Result<RoleMap<f64>, SampleRole> = RoleMap::try_from_fn(|role| {
            if role == SampleRole::C5 {
                Err(role)
            } else {
                Ok(1.0)
            }
        });
        assert_eq!(out, Err(SampleRole::C5));
    }

    #[test]
    fn role_map_serializes_as_array() {
        let map = RoleMap::from_fn(|role| role.index() as u32);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, "[0,1,2,3,4,5,6,7,8]");
    }
}

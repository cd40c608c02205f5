//! Stage wiring: preprocess -> segment -> locate -> layout -> sample ->
//! fit -> estimate.
//!
//! Algorithmic primitives live in `crate::spot`, `crate::layout`,
//! `crate::intensity` and `crate::calibration`; this layer owns call order
//! and data flow only.

mod preprocess;
mod result;
mod run;

pub use preprocess::blur_rgb;
pub use result::AssayResult;

pub(crate) use run::run;

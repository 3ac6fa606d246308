//! Closed-form stereo geometry on top of `stereo-core`.
//!
//! - [`triangulation`]: disparity to depth, with a defined sentinel for
//!   degenerate disparities.
//! - [`gsd`]: ground sample distance and surface area of pixel masks.

pub mod gsd;
pub mod triangulation;

pub use gsd::*;
pub use triangulation::*;

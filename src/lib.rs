//! Recognize a 4-pile, 13-row solitaire deal from one screen capture, let
//! the operator correct misreads, hand the grid to an external solver, and
//! replay the returned move sequence as pointer clicks.
//!
//! The pipeline is single-pass and synchronous: one capture is grabbed up
//! front and threaded immutably through the rough scan, grid inference,
//! per-cell resolution, correction, solving and replay. Matching cost
//! dominates everything else, and the crate leans on the matching
//! primitive's internal parallelism rather than running stages
//! concurrently.

pub mod automation;
pub mod capture;
pub mod config;
pub mod correct;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod matcher;
pub mod replay;
pub mod resolve;
pub mod scan;
pub mod solver;
pub mod tableau;
pub mod templates;

//! Timeline Model Module
//!
//! In-memory nonlinear-editing timeline model: tracks, clips, gaps,
//! transitions, media references, and effects. The MLT adapter constructs and
//! reads this shape; it carries no knowledge of the source format.

mod models;
pub use models::*;

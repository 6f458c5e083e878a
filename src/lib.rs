//! mltio
//!
//! Bidirectional converter between Kdenlive (MLT) XML projects and an
//! in-memory nonlinear-editing timeline model.
//!
//! Reading resolves the document's id-reference graph into an owned
//! [`Timeline`] of tracks, clips, gaps, transitions and effects, collecting a
//! warning for every lossy degradation. Writing produces a Kdenlive project
//! with a deduplicated media pool and the standard document scaffolding.
//!
//! ```no_run
//! use mltio::{read_from_string, write_to_string};
//!
//! # fn main() -> mltio::MltResult<()> {
//! let xml = std::fs::read_to_string("project.kdenlive").map_err(|e| {
//!     mltio::MltError::Xml(e.to_string())
//! })?;
//! let imported = read_from_string(&xml)?;
//! for warning in &imported.warnings {
//!     eprintln!("import: {warning}");
//! }
//! let exported = write_to_string(&imported.timeline)?;
//! println!("{}", exported.xml);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod mlt;
pub mod timeline;
pub mod types;

pub use error::{AdapterWarning, MltError, MltResult};
pub use mlt::{
    read_from_string, write_collection_to_string, write_to_string, ExportResult, ImportResult,
};
pub use timeline::{
    Clip, Effect, EffectMetadata, EffectName, MediaReference, Timeline, Track, TrackItem,
    TrackKind, Transition, TransitionKind, DEFAULT_FRAME_RATE,
};
pub use types::{FrameRatio, RationalTime, TimeRange};

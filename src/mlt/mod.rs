//! MLT (Kdenlive) Project Adapter
//!
//! Bidirectional conversion between Kdenlive's MLT XML dialect and the
//! timeline model:
//!
//! ```text
//!   XML text ──> document ──> reader ──> Timeline
//!   Timeline ──> writer ──> document ──> XML text
//!                   │
//!        timecode / keyframes / effects
//! ```
//!
//! [`document`] holds a parsed or under-construction XML tree as an element
//! arena with an id index. [`reader`] and [`writer`] walk it in opposite
//! directions, sharing the [`timecode`], [`keyframes`] and [`effects`]
//! codecs.

pub mod document;
pub mod effects;
pub mod keyframes;
pub mod reader;
pub mod timecode;
pub mod writer;

pub use reader::{read_from_string, ImportResult};
pub use writer::{write_collection_to_string, write_to_string, ExportResult};

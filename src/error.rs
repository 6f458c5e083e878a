//! Adapter Error Definitions
//!
//! Defines the error and warning types used throughout the converter.
//!
//! Structural problems that make the result meaningless abort with an
//! [`MltError`]; feature gaps that only degrade fidelity are reported as
//! [`AdapterWarning`]s and processing continues. The reader never fails on
//! unknown producer services, filters, or transitions; the writer never fails
//! on unsupported per-item features.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal converter error types
#[derive(Error, Debug)]
pub enum MltError {
    // =========================================================================
    // Structural Errors
    // =========================================================================
    #[error("project has no <profile> element")]
    MissingProfile,

    #[error("project has no global-feed tractor")]
    MissingMainTractor,

    #[error("unresolvable element reference: {0}")]
    UnresolvedReference(String),

    #[error("element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error("invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("element <{element}> is missing required property '{property}'")]
    MissingProperty { element: String, property: String },

    // =========================================================================
    // Value Errors
    // =========================================================================
    #[error("invalid timecode: '{0}'")]
    InvalidTimecode(String),

    // =========================================================================
    // Writer Errors
    // =========================================================================
    #[error("no timeline to export")]
    EmptyCollection,

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("XML error: {0}")]
    Xml(String),
}

/// Converter result type
pub type MltResult<T> = Result<T, MltError>;

// =============================================================================
// Warnings
// =============================================================================

/// Non-fatal degradations encountered during a read or write.
///
/// Every warning is also emitted through `tracing::warn!` at the point it is
/// detected; the collected list makes each degradation observable to the
/// caller without scraping logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterWarning {
    /// A filter's `kdenlive_id` is outside the supported effect table.
    UnknownEffect { id: String },
    /// A transition other than `wipe` was found and ignored.
    UnknownTransition { id: String },
    /// A producer's `mlt_service` is not a recognized media service;
    /// the clip was imported with a missing reference.
    UnknownService { service: String },
    /// A transition's `b_track` points outside the built track list.
    TransitionTrackOutOfRange { index: usize },
    /// More than one timeline was passed to the writer; only the first
    /// was exported.
    ExtraTimelines { ignored: usize },
    /// A clip carried effects, which the writer does not serialize yet.
    EffectsNotWritten { clip: String },
    /// A track carried a transition, which the writer does not serialize yet.
    TransitionsNotWritten,
    /// A clip had no resolvable media and was written against the
    /// placeholder producer.
    UnsupportedClipWritten { clip: String },
}

impl std::fmt::Display for AdapterWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEffect { id } => write!(f, "unknown effect id '{}', dropped", id),
            Self::UnknownTransition { id } => {
                write!(f, "unknown transition kind '{}', ignored", id)
            }
            Self::UnknownService { service } => {
                write!(f, "unknown media service '{}', clip has no reference", service)
            }
            Self::TransitionTrackOutOfRange { index } => {
                write!(f, "transition b_track {} is out of range, skipped", index)
            }
            Self::ExtraTimelines { ignored } => {
                write!(f, "only one timeline supported, ignored {} extra", ignored)
            }
            Self::EffectsNotWritten { clip } => {
                write!(f, "effects on clip '{}' were not serialized", clip)
            }
            Self::TransitionsNotWritten => write!(f, "transitions were not serialized"),
            Self::UnsupportedClipWritten { clip } => {
                write!(f, "clip '{}' has no usable media, wrote placeholder", clip)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Timeline Model Definitions
//!
//! Defines Timeline, Track, Clip and related types. Ownership is strictly
//! hierarchical: a Timeline owns its Tracks, a Track owns its items and their
//! nested media references and effects. Cross-references from the source
//! format are resolved into direct ownership during read and never survive it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{RationalTime, TimeRange};

/// Frame rate assumed when a timeline carries no timed items.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

// =============================================================================
// Timeline
// =============================================================================

/// Timeline (root container)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub name: String,
    /// Tracks in visual/audio order, first-to-last
    pub tracks: Vec<Track>,
}

impl Timeline {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tracks: vec![],
        }
    }

    /// Adds a track to the timeline
    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Iterates every clip across all tracks, in track order.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.iter().flat_map(|t| t.clips())
    }

    /// Project frame rate, taken from the first timed item.
    ///
    /// An empty timeline has no inherent rate; [`DEFAULT_FRAME_RATE`] is used.
    pub fn frame_rate(&self) -> f64 {
        self.tracks
            .iter()
            .flat_map(|t| t.items.iter())
            .find_map(TrackItem::rate)
            .unwrap_or(DEFAULT_FRAME_RATE)
    }
}

// =============================================================================
// Track
// =============================================================================

/// Track type/kind enumeration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Track (ordered items, earliest first)
///
/// Invariant: items fully and contiguously tile the track's span; gaps are
/// explicit [`TrackItem::Gap`] entries, never implied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub kind: TrackKind,
    pub items: Vec<TrackItem>,
}

impl Track {
    pub fn new(name: &str, kind: TrackKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            items: vec![],
        }
    }

    /// Creates a new video track
    pub fn new_video(name: &str) -> Self {
        Self::new(name, TrackKind::Video)
    }

    /// Creates a new audio track
    pub fn new_audio(name: &str) -> Self {
        Self::new(name, TrackKind::Audio)
    }

    /// Appends an item to the track
    pub fn add_item(&mut self, item: TrackItem) {
        self.items.push(item);
    }

    /// Iterates the clips on this track, skipping gaps and transitions.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.items.iter().filter_map(|item| match item {
            TrackItem::Clip(clip) => Some(clip),
            _ => None,
        })
    }

    /// Total duration: the concatenation of item durations.
    ///
    /// Transitions straddle cut points and contribute no duration.
    pub fn duration(&self) -> Option<RationalTime> {
        let mut total: Option<RationalTime> = None;
        for item in &self.items {
            let span = match item {
                TrackItem::Gap { duration } => *duration,
                TrackItem::Clip(clip) => clip.source_range.duration,
                TrackItem::Transition(_) => continue,
            };
            total = Some(match total {
                Some(t) => t + span,
                None => span,
            });
        }
        total
    }
}

// =============================================================================
// Track Items
// =============================================================================

/// A single slot on a track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackItem {
    /// Empty space with a duration and no content
    Gap { duration: RationalTime },
    Clip(Clip),
    Transition(Transition),
}

impl TrackItem {
    /// Frame rate carried by this item's timing, if any.
    pub fn rate(&self) -> Option<f64> {
        match self {
            TrackItem::Gap { duration } => Some(duration.rate),
            TrackItem::Clip(clip) => Some(clip.source_range.duration.rate),
            TrackItem::Transition(transition) => Some(transition.in_offset.rate),
        }
    }
}

/// Clip (a used portion of referenced media)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub name: String,
    /// The portion of the referenced media actually used
    pub source_range: TimeRange,
    pub media_reference: MediaReference,
    pub effects: Vec<Effect>,
}

/// Transition kind (only the SMPTE dissolve survives import)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    #[serde(rename = "SMPTE_Dissolve")]
    SmpteDissolve,
}

/// Transition straddling a cut point on its owning track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub kind: TransitionKind,
    pub in_offset: RationalTime,
    pub out_offset: RationalTime,
}

// =============================================================================
// Media References
// =============================================================================

/// What a clip's content points at
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaReference {
    /// Media addressed by URL/path
    External {
        target_url: String,
        /// Full usable span of the underlying media
        available_range: TimeRange,
    },
    /// Synthesized media (only `SolidColor` is produced)
    Generator {
        generator_kind: String,
        parameters: HashMap<String, String>,
        available_range: TimeRange,
    },
    /// Unresolved or unsupported source media
    Missing,
}

impl MediaReference {
    pub fn is_missing(&self) -> bool {
        matches!(self, MediaReference::Missing)
    }
}

// =============================================================================
// Effects
// =============================================================================

/// The fixed effect vocabulary the converter understands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectName {
    AudioFadeIn,
    AudioFadeOut,
    VideoFadeIn,
    VideoFadeOut,
    Volume,
    Brightness,
}

impl EffectName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AudioFadeIn => "audio_fade_in",
            Self::AudioFadeOut => "audio_fade_out",
            Self::VideoFadeIn => "video_fade_in",
            Self::VideoFadeOut => "video_fade_out",
            Self::Volume => "volume",
            Self::Brightness => "brightness",
        }
    }
}

/// Effect metadata: a single span for fades, a time-keyed value table for
/// animated parameters. Interpolation modes are not retained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectMetadata {
    Duration(RationalTime),
    Keyframes(Vec<(RationalTime, String)>),
}

/// An effect applied to a clip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub name: EffectName,
    pub metadata: EffectMetadata,
}

// =============================================================================
// Tests
// =============================================================================

//! Effect Mapping Table
//!
//! Maps the fixed vocabulary of recognized `kdenlive_id` filter identifiers
//! onto timeline effects. Fades carry one duration; level filters carry a
//! keyframe table. Everything outside the table is dropped by the caller.

use crate::error::MltResult;
use crate::mlt::document::Document;
use crate::mlt::keyframes::parse_keyframes;
use crate::mlt::timecode::parse_time;
use crate::timeline::{Effect, EffectMetadata, EffectName};

/// How a fade filter's duration is derived from its `in`/`out` attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FadeBasis {
    /// Duration is the span `out - in`.
    Span,
    /// Duration is the `out` value itself.
    Absolute,
}

#[derive(Clone, Copy, Debug)]
enum EffectSpec {
    Fade(EffectName, FadeBasis),
    Keyframed(EffectName),
}

/// The recognized filter identifiers. Fixed and intentionally small.
const EFFECT_TABLE: &[(&str, EffectSpec)] = &[
    ("fadein", EffectSpec::Fade(EffectName::AudioFadeIn, FadeBasis::Span)),
    ("fadeout", EffectSpec::Fade(EffectName::AudioFadeOut, FadeBasis::Span)),
    (
        "fade_from_black",
        EffectSpec::Fade(EffectName::VideoFadeIn, FadeBasis::Absolute),
    ),
    (
        "fade_to_black",
        EffectSpec::Fade(EffectName::VideoFadeOut, FadeBasis::Span),
    ),
    ("volume", EffectSpec::Keyframed(EffectName::Volume)),
    ("brightness", EffectSpec::Keyframed(EffectName::Brightness)),
];

/// Builds the effect for a `<filter>` element, or `None` when its
/// `kdenlive_id` is outside the table.
pub fn build_effect(
    doc: &Document,
    filter: usize,
    kdenlive_id: &str,
    rate: f64,
) -> MltResult<Option<Effect>> {
    let spec = EFFECT_TABLE
        .iter()
        .find(|(id, _)| *id == kdenlive_id)
        .map(|(_, spec)| spec);
    let spec = match spec {
        Some(spec) => spec,
        None => return Ok(None),
    };

    let effect = match *spec {
        EffectSpec::Fade(name, basis) => {
            let out = parse_time(doc.require_attr(filter, "out")?, rate)?;
            let duration = match basis {
                FadeBasis::Span => out - parse_time(doc.require_attr(filter, "in")?, rate)?,
                FadeBasis::Absolute => out,
            };
            Effect {
                name,
                metadata: EffectMetadata::Duration(duration),
            }
        }
        EffectSpec::Keyframed(name) => {
            // A filter without a level string still imports, as an empty table.
            let level = doc.property(filter, "level").unwrap_or("");
            Effect {
                name,
                metadata: EffectMetadata::Keyframes(parse_keyframes(level, rate)),
            }
        }
    };
    Ok(Some(effect))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RationalTime;

    fn filter_doc(xml: &str) -> (Document, usize) {
        let doc = Document::parse(xml).unwrap();
        let filter = doc.find_child(doc.root(), "filter").unwrap();
        (doc, filter)
    }

    #[test]
    fn test_audio_fade_in_uses_span() {
        let (doc, filter) = filter_doc(r#"<entry><filter in="10" out="35"/></entry>"#);
        let effect = build_effect(&doc, filter, "fadein", 25.0).unwrap().unwrap();
        assert_eq!(effect.name, EffectName::AudioFadeIn);
        assert_eq!(
            effect.metadata,
            EffectMetadata::Duration(RationalTime::new(25.0, 25.0))
        );
    }

    #[test]
    fn test_video_fade_in_uses_absolute_out() {
        let (doc, filter) = filter_doc(r#"<entry><filter in="10" out="35"/></entry>"#);
        let effect = build_effect(&doc, filter, "fade_from_black", 25.0)
            .unwrap()
            .unwrap();
        assert_eq!(effect.name, EffectName::VideoFadeIn);
        assert_eq!(
            effect.metadata,
            EffectMetadata::Duration(RationalTime::new(35.0, 25.0))
        );
    }

    #[test]
    fn test_video_fade_out_uses_span() {
        let (doc, filter) = filter_doc(r#"<entry><filter in="100" out="125"/></entry>"#);
        let effect = build_effect(&doc, filter, "fade_to_black", 25.0)
            .unwrap()
            .unwrap();
        assert_eq!(effect.name, EffectName::VideoFadeOut);
        assert_eq!(
            effect.metadata,
            EffectMetadata::Duration(RationalTime::new(25.0, 25.0))
        );
    }

    #[test]
    fn test_volume_collects_keyframes() {
        let (doc, filter) = filter_doc(
            r#"<entry><filter in="0" out="50">
                <property name="level">0=0;50=1</property>
            </filter></entry>"#,
        );
        let effect = build_effect(&doc, filter, "volume", 25.0).unwrap().unwrap();
        assert_eq!(effect.name, EffectName::Volume);
        assert_eq!(
            effect.metadata,
            EffectMetadata::Keyframes(vec![
                (RationalTime::new(0.0, 25.0), "0".to_string()),
                (RationalTime::new(50.0, 25.0), "1".to_string()),
            ])
        );
    }

    #[test]
    fn test_brightness_without_level_is_empty_table() {
        let (doc, filter) = filter_doc(r#"<entry><filter in="0" out="50"/></entry>"#);
        let effect = build_effect(&doc, filter, "brightness", 25.0)
            .unwrap()
            .unwrap();
        assert_eq!(effect.metadata, EffectMetadata::Keyframes(vec![]));
    }

    #[test]
    fn test_unknown_id_maps_to_none() {
        let (doc, filter) = filter_doc(r#"<entry><filter in="0" out="50"/></entry>"#);
        assert!(build_effect(&doc, filter, "obscure", 25.0).unwrap().is_none());
    }

    #[test]
    fn test_fade_missing_attribute_errors() {
        let (doc, filter) = filter_doc(r#"<entry><filter in="10"/></entry>"#);
        assert!(build_effect(&doc, filter, "fadein", 25.0).is_err());
    }
}

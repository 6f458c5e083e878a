//! MLT Project Reader
//!
//! Imports a Kdenlive (MLT) XML project into the timeline model. The
//! document's id-reference graph is walked top down: global-feed tractor,
//! per-track subtractors, their playlists, and finally the producers each
//! entry points at. Every reference is resolved into owned values; nothing of
//! the XML survives the call.
//!
//! Structural defects abort with an error. Unknown services, filters and
//! transitions degrade to warnings and the import continues.

use tracing::warn;

use crate::error::{AdapterWarning, MltError, MltResult};
use crate::mlt::document::Document;
use crate::mlt::effects::build_effect;
use crate::mlt::timecode::parse_time;
use crate::timeline::{
    Clip, MediaReference, Timeline, Track, TrackItem, TrackKind, Transition, TransitionKind,
};
use crate::types::TimeRange;

/// Name given to a project whose root carries no `name` attribute.
const DEFAULT_TIMELINE_NAME: &str = "Kdenlive imported timeline";

/// Producer services resolving to file-backed media.
const EXTERNAL_SERVICES: &[&str] = &["avformat", "avformat-novalidate", "qimage"];

/// An imported timeline plus the degradations met along the way.
#[derive(Debug)]
pub struct ImportResult {
    pub timeline: Timeline,
    pub warnings: Vec<AdapterWarning>,
}

/// Imports a Kdenlive XML project.
pub fn read_from_string(xml: &str) -> MltResult<ImportResult> {
    let doc = Document::parse(xml)?;
    let root = doc.root();

    let rate = profile_rate(&doc, root)?;
    let mut timeline = Timeline::new(doc.attr(root, "name").unwrap_or(DEFAULT_TIMELINE_NAME));
    let mut warnings = Vec::new();

    let maintractor = doc
        .children_with_tag(root, "tractor")
        .find(|&t| doc.attr(t, "global_feed") == Some("1"))
        .ok_or(MltError::MissingMainTractor)?;

    for maintrack in doc.children_with_tag(maintractor, "track") {
        let producer = doc.require_attr(maintrack, "producer")?;
        if producer == "black_track" {
            continue;
        }
        let subtractor = doc.resolve(producer)?;
        timeline.add_track(read_track(&doc, subtractor, rate, &mut warnings)?);
    }

    read_transitions(&doc, maintractor, rate, &mut timeline, &mut warnings)?;

    Ok(ImportResult { timeline, warnings })
}

/// Project frame rate from the `<profile>` header.
fn profile_rate(doc: &Document, root: usize) -> MltResult<f64> {
    let profile = doc
        .find_child(root, "profile")
        .ok_or(MltError::MissingProfile)?;
    let num = parse_rate_attr(doc, profile, doc.require_attr(profile, "frame_rate_num")?, "frame_rate_num")?;
    let den = parse_rate_attr(doc, profile, doc.attr(profile, "frame_rate_den").unwrap_or("1"), "frame_rate_den")?;
    if den == 0.0 {
        return Err(MltError::InvalidAttribute {
            element: "profile".to_string(),
            attribute: "frame_rate_den".to_string(),
            value: "0".to_string(),
        });
    }
    Ok(num / den)
}

fn parse_rate_attr(doc: &Document, profile: usize, value: &str, attribute: &str) -> MltResult<f64> {
    value.parse().map_err(|_| MltError::InvalidAttribute {
        element: doc.tag(profile).to_string(),
        attribute: attribute.to_string(),
        value: value.to_string(),
    })
}

// =============================================================================
// Tracks
// =============================================================================

/// Reads one timeline track from its subtractor.
///
/// A subtractor fronts two playlists; their contents are concatenated in
/// document order.
fn read_track(
    doc: &Document,
    subtractor: usize,
    rate: f64,
    warnings: &mut Vec<AdapterWarning>,
) -> MltResult<Track> {
    let name = doc.property(subtractor, "kdenlive:track_name").unwrap_or("");
    let kind = match doc.property(subtractor, "kdenlive:audio_track") {
        Some(flag) if !flag.is_empty() => TrackKind::Audio,
        _ => TrackKind::Video,
    };
    let mut track = Track::new(name, kind);

    for subtrack in doc.children_with_tag(subtractor, "track") {
        let playlist = doc.resolve(doc.require_attr(subtrack, "producer")?)?;
        for item in doc.children(playlist) {
            match doc.tag(item) {
                "blank" => {
                    let length = doc.require_attr(item, "length")?;
                    track.add_item(TrackItem::Gap {
                        duration: parse_time(length, rate)?,
                    });
                }
                "entry" => {
                    track.add_item(TrackItem::Clip(read_clip(doc, item, rate, warnings)?));
                }
                _ => {}
            }
        }
    }
    Ok(track)
}

// =============================================================================
// Clips
// =============================================================================

fn read_clip(
    doc: &Document,
    entry: usize,
    rate: f64,
    warnings: &mut Vec<AdapterWarning>,
) -> MltResult<Clip> {
    let producer = doc.resolve(doc.require_attr(entry, "producer")?)?;

    let available_range = attr_range(doc, producer, rate)?;
    let source_range = attr_range(doc, entry, rate)?;

    let service = doc.property(producer, "mlt_service").unwrap_or("");
    let media_reference = if EXTERNAL_SERVICES.contains(&service) {
        // The original download/proxy URL wins over the working resource.
        let url = doc
            .property(producer, "kdenlive:originalurl")
            .filter(|url| !url.is_empty())
            .or_else(|| doc.property(producer, "resource"))
            .unwrap_or("");
        MediaReference::External {
            target_url: url.to_string(),
            available_range,
        }
    } else if service == "color" {
        let color = doc.property(producer, "resource").unwrap_or("");
        MediaReference::Generator {
            generator_kind: "SolidColor".to_string(),
            parameters: [("color".to_string(), color.to_string())].into(),
            available_range,
        }
    } else {
        push_warning(
            warnings,
            AdapterWarning::UnknownService {
                service: service.to_string(),
            },
        );
        MediaReference::Missing
    };

    let mut clip = Clip {
        name: doc
            .property(producer, "kdenlive:clipname")
            .unwrap_or("")
            .to_string(),
        source_range,
        media_reference,
        effects: vec![],
    };

    for filter in doc.children_with_tag(entry, "filter") {
        let kdenlive_id = doc.property(filter, "kdenlive_id").unwrap_or("");
        match build_effect(doc, filter, kdenlive_id, rate)? {
            Some(effect) => clip.effects.push(effect),
            None => push_warning(
                warnings,
                AdapterWarning::UnknownEffect {
                    id: kdenlive_id.to_string(),
                },
            ),
        }
    }
    Ok(clip)
}

/// Reads an element's `in`/`out` attributes as a half-open range.
fn attr_range(doc: &Document, ix: usize, rate: f64) -> MltResult<TimeRange> {
    let start = parse_time(doc.require_attr(ix, "in")?, rate)?;
    let end = parse_time(doc.require_attr(ix, "out")?, rate)?;
    Ok(TimeRange::new(start, end - start))
}

// =============================================================================
// Transitions
// =============================================================================

/// Attaches the global-feed tractor's wipe transitions to their target tracks.
///
/// `b_track` counts from 1 past the black track, so it maps to track index
/// `b_track - 1`. Out-of-range targets are skipped with a warning.
fn read_transitions(
    doc: &Document,
    maintractor: usize,
    rate: f64,
    timeline: &mut Timeline,
    warnings: &mut Vec<AdapterWarning>,
) -> MltResult<()> {
    for transition in doc.children_with_tag(maintractor, "transition") {
        let kdenlive_id = doc.property(transition, "kdenlive_id").unwrap_or("");
        if kdenlive_id != "wipe" {
            push_warning(
                warnings,
                AdapterWarning::UnknownTransition {
                    id: kdenlive_id.to_string(),
                },
            );
            continue;
        }

        let b_track = doc
            .property(transition, "b_track")
            .ok_or_else(|| MltError::MissingProperty {
                element: "transition".to_string(),
                property: "b_track".to_string(),
            })?;
        let b_track: usize = b_track.parse().map_err(|_| MltError::InvalidAttribute {
            element: "transition".to_string(),
            attribute: "b_track".to_string(),
            value: b_track.to_string(),
        })?;
        if b_track == 0 || b_track > timeline.tracks.len() {
            push_warning(
                warnings,
                AdapterWarning::TransitionTrackOutOfRange { index: b_track },
            );
            continue;
        }

        let in_offset = parse_time(doc.require_attr(transition, "in")?, rate)?;
        let out_offset = parse_time(doc.require_attr(transition, "out")?, rate)?;
        timeline.tracks[b_track - 1].add_item(TrackItem::Transition(Transition {
            kind: TransitionKind::SmpteDissolve,
            in_offset,
            out_offset,
        }));
    }
    Ok(())
}

fn push_warning(warnings: &mut Vec<AdapterWarning>, warning: AdapterWarning) {
    warn!("{warning}");
    warnings.push(warning);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{EffectMetadata, EffectName};
    use crate::types::RationalTime;

    /// One video track with a gap, an avformat clip carrying a fade, and a
    /// color clip; one audio track; one wipe transition targeting track 1.
    const PROJECT: &str = r#"<mlt name="Sample project" version="6.16.0">
        <profile frame_rate_num="25" frame_rate_den="1" width="1920" height="1080"/>
        <producer id="producer0" in="0" out="249">
            <property name="mlt_service">avformat</property>
            <property name="resource">/proxy/a.mp4</property>
            <property name="kdenlive:originalurl">/media/a.mp4</property>
            <property name="kdenlive:clipname">clip a</property>
        </producer>
        <producer id="producer1" in="0" out="99">
            <property name="mlt_service">color</property>
            <property name="resource">0xff0000ff</property>
        </producer>
        <playlist id="playlist1_1">
            <blank length="50"/>
            <entry producer="producer0" in="0" out="100">
                <filter in="0" out="25">
                    <property name="kdenlive_id">fade_from_black</property>
                </filter>
            </entry>
            <entry producer="producer1" in="0" out="75"/>
        </playlist>
        <playlist id="playlist1_2"/>
        <tractor id="tractor1">
            <property name="kdenlive:track_name">Video 1</property>
            <track producer="playlist1_1" hide="audio"/>
            <track producer="playlist1_2" hide="audio"/>
        </tractor>
        <playlist id="playlist2_1">
            <entry producer="producer0" in="0" out="100"/>
        </playlist>
        <playlist id="playlist2_2"/>
        <tractor id="tractor2">
            <property name="kdenlive:track_name">Audio 1</property>
            <property name="kdenlive:audio_track">1</property>
            <track producer="playlist2_1" hide="video"/>
            <track producer="playlist2_2" hide="video"/>
        </tractor>
        <tractor global_feed="1">
            <track producer="black_track"/>
            <track producer="tractor1"/>
            <track producer="tractor2"/>
            <transition in="25" out="50">
                <property name="kdenlive_id">wipe</property>
                <property name="b_track">1</property>
            </transition>
        </tractor>
    </mlt>"#;

    #[test]
    fn test_read_tracks_and_kinds() {
        let result = read_from_string(PROJECT).unwrap();
        let timeline = &result.timeline;
        assert_eq!(timeline.name, "Sample project");
        assert_eq!(timeline.tracks.len(), 2);
        assert_eq!(timeline.tracks[0].name, "Video 1");
        assert_eq!(timeline.tracks[0].kind, TrackKind::Video);
        assert_eq!(timeline.tracks[1].name, "Audio 1");
        assert_eq!(timeline.tracks[1].kind, TrackKind::Audio);
        assert_eq!(timeline.frame_rate(), 25.0);
    }

    #[test]
    fn test_read_gap_and_clips() {
        let result = read_from_string(PROJECT).unwrap();
        let items = &result.timeline.tracks[0].items;

        assert_eq!(
            items[0],
            TrackItem::Gap {
                duration: RationalTime::new(50.0, 25.0)
            }
        );

        let TrackItem::Clip(clip) = &items[1] else {
            panic!("expected a clip");
        };
        assert_eq!(clip.name, "clip a");
        assert_eq!(clip.source_range.start_time, RationalTime::new(0.0, 25.0));
        assert_eq!(clip.source_range.duration, RationalTime::new(100.0, 25.0));
        let MediaReference::External {
            target_url,
            available_range,
        } = &clip.media_reference
        else {
            panic!("expected external media");
        };
        // originalurl wins over the proxy resource
        assert_eq!(target_url, "/media/a.mp4");
        assert_eq!(available_range.duration, RationalTime::new(249.0, 25.0));
    }

    #[test]
    fn test_read_color_generator() {
        let result = read_from_string(PROJECT).unwrap();
        let TrackItem::Clip(clip) = &result.timeline.tracks[0].items[2] else {
            panic!("expected a clip");
        };
        let MediaReference::Generator {
            generator_kind,
            parameters,
            ..
        } = &clip.media_reference
        else {
            panic!("expected generator media");
        };
        assert_eq!(generator_kind, "SolidColor");
        assert_eq!(parameters.get("color").map(String::as_str), Some("0xff0000ff"));
    }

    #[test]
    fn test_read_clip_effect() {
        let result = read_from_string(PROJECT).unwrap();
        let TrackItem::Clip(clip) = &result.timeline.tracks[0].items[1] else {
            panic!("expected a clip");
        };
        assert_eq!(clip.effects.len(), 1);
        assert_eq!(clip.effects[0].name, EffectName::VideoFadeIn);
        assert_eq!(
            clip.effects[0].metadata,
            EffectMetadata::Duration(RationalTime::new(25.0, 25.0))
        );
    }

    #[test]
    fn test_read_transition_on_target_track() {
        let result = read_from_string(PROJECT).unwrap();
        let track = &result.timeline.tracks[0];
        let Some(TrackItem::Transition(transition)) = track.items.last() else {
            panic!("expected a trailing transition");
        };
        assert_eq!(transition.kind, TransitionKind::SmpteDissolve);
        assert_eq!(transition.in_offset, RationalTime::new(25.0, 25.0));
        assert_eq!(transition.out_offset, RationalTime::new(50.0, 25.0));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_profile_is_fatal() {
        let xml = r#"<mlt><tractor global_feed="1"/></mlt>"#;
        assert!(matches!(
            read_from_string(xml),
            Err(MltError::MissingProfile)
        ));
    }

    #[test]
    fn test_missing_main_tractor_is_fatal() {
        let xml = r#"<mlt><profile frame_rate_num="25"/><tractor id="t1"/></mlt>"#;
        assert!(matches!(
            read_from_string(xml),
            Err(MltError::MissingMainTractor)
        ));
    }

    #[test]
    fn test_unresolved_track_reference_is_fatal() {
        let xml = r#"<mlt>
            <profile frame_rate_num="25"/>
            <tractor global_feed="1"><track producer="ghost"/></tractor>
        </mlt>"#;
        assert!(matches!(
            read_from_string(xml),
            Err(MltError::UnresolvedReference(_))
        ));
    }

    #[test]
    fn test_default_timeline_name_and_den() {
        let xml = r#"<mlt>
            <profile frame_rate_num="30"/>
            <tractor global_feed="1"><track producer="black_track"/></tractor>
        </mlt>"#;
        let result = read_from_string(xml).unwrap();
        assert_eq!(result.timeline.name, "Kdenlive imported timeline");
        assert!(result.timeline.tracks.is_empty());
    }

    #[test]
    fn test_unknown_service_degrades_to_missing() {
        let xml = r#"<mlt>
            <profile frame_rate_num="25"/>
            <producer id="p0" in="0" out="10">
                <property name="mlt_service">webvfx</property>
            </producer>
            <playlist id="pl1"><entry producer="p0" in="0" out="10"/></playlist>
            <tractor id="t1"><track producer="pl1"/></tractor>
            <tractor global_feed="1"><track producer="t1"/></tractor>
        </mlt>"#;
        let result = read_from_string(xml).unwrap();
        let TrackItem::Clip(clip) = &result.timeline.tracks[0].items[0] else {
            panic!("expected a clip");
        };
        assert!(clip.media_reference.is_missing());
        assert_eq!(
            result.warnings,
            vec![AdapterWarning::UnknownService {
                service: "webvfx".to_string()
            }]
        );
    }

    #[test]
    fn test_unknown_effect_warns_and_drops() {
        let xml = r#"<mlt>
            <profile frame_rate_num="25"/>
            <producer id="p0" in="0" out="10">
                <property name="mlt_service">avformat</property>
                <property name="resource">/media/a.mp4</property>
            </producer>
            <playlist id="pl1">
                <entry producer="p0" in="0" out="10">
                    <filter in="0" out="10">
                        <property name="kdenlive_id">obscure</property>
                    </filter>
                </entry>
            </playlist>
            <tractor id="t1"><track producer="pl1"/></tractor>
            <tractor global_feed="1"><track producer="t1"/></tractor>
        </mlt>"#;
        let result = read_from_string(xml).unwrap();
        let TrackItem::Clip(clip) = &result.timeline.tracks[0].items[0] else {
            panic!("expected a clip");
        };
        assert!(clip.effects.is_empty());
        assert_eq!(
            result.warnings,
            vec![AdapterWarning::UnknownEffect {
                id: "obscure".to_string()
            }]
        );
    }

    #[test]
    fn test_transition_out_of_range_warns() {
        let xml = r#"<mlt>
            <profile frame_rate_num="25"/>
            <tractor global_feed="1">
                <transition in="0" out="10">
                    <property name="kdenlive_id">wipe</property>
                    <property name="b_track">7</property>
                </transition>
            </tractor>
        </mlt>"#;
        let result = read_from_string(xml).unwrap();
        assert_eq!(
            result.warnings,
            vec![AdapterWarning::TransitionTrackOutOfRange { index: 7 }]
        );
    }

    #[test]
    fn test_unknown_transition_warns() {
        let xml = r#"<mlt>
            <profile frame_rate_num="25"/>
            <tractor global_feed="1">
                <transition in="0" out="10">
                    <property name="kdenlive_id">luma</property>
                </transition>
            </tractor>
        </mlt>"#;
        let result = read_from_string(xml).unwrap();
        assert_eq!(
            result.warnings,
            vec![AdapterWarning::UnknownTransition {
                id: "luma".to_string()
            }]
        );
    }

    #[test]
    fn test_timecode_attributes_accepted() {
        let xml = r#"<mlt>
            <profile frame_rate_num="25"/>
            <producer id="p0" in="00:00:00.000" out="00:00:10.000">
                <property name="mlt_service">avformat</property>
                <property name="resource">/media/a.mp4</property>
            </producer>
            <playlist id="pl1">
                <entry producer="p0" in="00:00:01.000" out="00:00:04.000"/>
            </playlist>
            <tractor id="t1"><track producer="pl1"/></tractor>
            <tractor global_feed="1"><track producer="t1"/></tractor>
        </mlt>"#;
        let result = read_from_string(xml).unwrap();
        let TrackItem::Clip(clip) = &result.timeline.tracks[0].items[0] else {
            panic!("expected a clip");
        };
        assert_eq!(clip.source_range.start_time, RationalTime::new(25.0, 25.0));
        assert_eq!(clip.source_range.duration, RationalTime::new(75.0, 25.0));
    }
}

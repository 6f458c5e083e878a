//! MLT Project Writer
//!
//! Exports a timeline to a Kdenlive (MLT) XML project. The output follows
//! Kdenlive's document shape: a fixed HD 1080p profile header, one producer
//! per unique media resource indexed in the `main_bin` playlist, a black
//! backdrop track, and per-track subtractors each fronting a pair of
//! playlists. Clip effects and transitions are not serialized yet; each
//! occurrence is reported as a warning.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use crate::error::{AdapterWarning, MltError, MltResult};
use crate::mlt::document::Document;
use crate::mlt::timecode::rate_to_ratio;
use crate::timeline::{MediaReference, Timeline, TrackItem, TrackKind};

/// Producer id for clips with no usable media.
const UNSUPPORTED_ID: &str = "unsupported";

/// File extensions served by `qimage` instead of `avformat`.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// The exported XML plus the degradations met along the way.
#[derive(Debug)]
pub struct ExportResult {
    pub xml: String,
    pub warnings: Vec<AdapterWarning>,
}

/// Exports one timeline as a Kdenlive XML project.
pub fn write_to_string(timeline: &Timeline) -> MltResult<ExportResult> {
    let mut warnings = Vec::new();
    let doc = build_document(timeline, &mut warnings)?;
    Ok(ExportResult {
        xml: doc.to_xml_string()?,
        warnings,
    })
}

/// Exports the first timeline of a collection, warning about the rest.
pub fn write_collection_to_string(timelines: &[Timeline]) -> MltResult<ExportResult> {
    let timeline = timelines.first().ok_or(MltError::EmptyCollection)?;
    let mut result = write_to_string(timeline)?;
    if timelines.len() > 1 {
        let warning = AdapterWarning::ExtraTimelines {
            ignored: timelines.len() - 1,
        };
        warn!("{warning}");
        result.warnings.push(warning);
    }
    Ok(result)
}

// =============================================================================
// Document Assembly
// =============================================================================

fn build_document(
    timeline: &Timeline,
    warnings: &mut Vec<AdapterWarning>,
) -> MltResult<Document> {
    let rate = timeline.frame_rate();

    let mut doc = Document::with_root("mlt");
    let root = doc.root();
    doc.set_attr(root, "version", "6.16.0");
    doc.set_attr(root, "title", &timeline.name);
    doc.set_attr(root, "LC_NUMERIC", "en_US.UTF-8");
    doc.set_attr(root, "producer", "main_bin");

    write_profile(&mut doc, root, rate);
    let media_ids = write_media_pool(&mut doc, root, timeline);
    write_black_track(&mut doc, root);

    // The global-feed tractor closes the document; it is built alongside the
    // tracks but attached last.
    let maintractor = doc.new_element("tractor");
    doc.set_attr(maintractor, "global_feed", "1");
    let backdrop = doc.add_child(maintractor, "track");
    doc.set_attr(backdrop, "producer", "black_track");

    for (number, track) in timeline.tracks.iter().enumerate() {
        write_track(
            &mut doc,
            root,
            maintractor,
            track,
            number + 1,
            &media_ids,
            warnings,
        );
    }
    doc.append(root, maintractor);
    Ok(doc)
}

fn write_profile(doc: &mut Document, root: usize, rate: f64) {
    let ratio = rate_to_ratio(rate);
    let profile = doc.add_child(root, "profile");
    doc.set_attr(profile, "description", &format!("HD 1080p {rate} fps"));
    doc.set_attr(profile, "frame_rate_num", &ratio.num.to_string());
    doc.set_attr(profile, "frame_rate_den", &ratio.den.to_string());
    doc.set_attr(profile, "width", "1920");
    doc.set_attr(profile, "height", "1080");
    doc.set_attr(profile, "display_aspect_num", "16");
    doc.set_attr(profile, "display_aspect_den", "9");
    doc.set_attr(profile, "sample_aspect_num", "1");
    doc.set_attr(profile, "sample_aspect_den", "1");
    doc.set_attr(profile, "colorspace", "709");
    doc.set_attr(profile, "progressive", "1");
}

/// Writes one producer per unique media resource plus the placeholder for
/// unsupported clips, and the `main_bin` playlist indexing them all.
///
/// Returns the resource-to-producer-id map used when writing entries.
fn write_media_pool(
    doc: &mut Document,
    root: usize,
    timeline: &Timeline,
) -> HashMap<String, String> {
    let main_bin = doc.new_element("playlist");
    doc.set_attr(main_bin, "id", "main_bin");
    doc.add_property(main_bin, "kdenlive:docproperties.decimalPoint", ".");
    doc.add_property(main_bin, "kdenlive:docproperties.version", "0.98");
    doc.add_property(main_bin, "xml_retain", "1");

    let mut media_ids: HashMap<String, String> = HashMap::new();
    for clip in timeline.clips() {
        let Some((service, resource)) = media_key(&clip.media_reference) else {
            continue;
        };
        if media_ids.contains_key(&resource) {
            continue;
        }
        let Some(available_range) = available_range(&clip.media_reference) else {
            continue;
        };

        let id = format!("producer{}", media_ids.len());
        let producer = doc.add_child(root, "producer");
        doc.set_attr(producer, "id", &id);
        doc.set_attr(
            producer,
            "in",
            &available_range.start_time.to_frames().to_string(),
        );
        doc.set_attr(
            producer,
            "out",
            &available_range.end_time_exclusive().to_frames().to_string(),
        );
        doc.add_property(producer, "mlt_service", service);
        doc.add_property(producer, "resource", &resource);
        if !clip.name.is_empty() {
            doc.add_property(producer, "kdenlive:clipname", &clip.name);
        }

        let entry = doc.add_child(main_bin, "entry");
        doc.set_attr(entry, "producer", &id);
        media_ids.insert(resource, id);
    }

    let unsupported = doc.add_child(root, "producer");
    doc.set_attr(unsupported, "id", UNSUPPORTED_ID);
    doc.add_property(unsupported, "mlt_service", "qtext");
    doc.add_property(unsupported, "family", "Courier");
    doc.add_property(unsupported, "fgcolour", "#ff808080");
    doc.add_property(unsupported, "bgcolour", "#00000000");
    doc.add_property(unsupported, "text", "Unsupported clip type");
    doc.add_property(unsupported, "kdenlive:clipname", "Unsupported clip type");
    let entry = doc.add_child(main_bin, "entry");
    doc.set_attr(entry, "producer", UNSUPPORTED_ID);

    doc.append(root, main_bin);
    media_ids
}

fn write_black_track(doc: &mut Document, root: usize) {
    let black = doc.add_child(root, "producer");
    doc.set_attr(black, "id", "black_track");
    doc.add_property(black, "resource", "black");
    doc.add_property(black, "mlt_service", "color");
}

/// Service and resource key for a media reference, when it has one.
///
/// External media keys on its URL, `qimage` for still images and `avformat`
/// otherwise. Solid-color generators key on the color value. Anything else
/// (including an empty key) has no producer and falls back to the
/// placeholder.
fn media_key(reference: &MediaReference) -> Option<(&'static str, String)> {
    let (service, resource) = match reference {
        MediaReference::External { target_url, .. } => {
            let extension = Path::new(target_url)
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase());
            let service = match extension {
                Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => "qimage",
                _ => "avformat",
            };
            (service, target_url.clone())
        }
        MediaReference::Generator {
            generator_kind,
            parameters,
            ..
        } if generator_kind == "SolidColor" => {
            ("color", parameters.get("color").cloned().unwrap_or_default())
        }
        _ => return None,
    };
    if resource.is_empty() {
        return None;
    }
    Some((service, resource))
}

fn available_range(reference: &MediaReference) -> Option<&crate::types::TimeRange> {
    match reference {
        MediaReference::External {
            available_range, ..
        }
        | MediaReference::Generator {
            available_range, ..
        } => Some(available_range),
        MediaReference::Missing => None,
    }
}

// =============================================================================
// Tracks
// =============================================================================

/// Writes one track: its two playlists, its subtractor, and its slot in the
/// global-feed tractor.
fn write_track(
    doc: &mut Document,
    root: usize,
    maintractor: usize,
    track: &crate::timeline::Track,
    number: usize,
    media_ids: &HashMap<String, String>,
    warnings: &mut Vec<AdapterWarning>,
) {
    let tractor_id = format!("tractor{number}");
    let slot = doc.add_child(maintractor, "track");
    doc.set_attr(slot, "producer", &tractor_id);

    let subtractor = doc.new_element("tractor");
    doc.set_attr(subtractor, "id", &tractor_id);
    doc.add_property(subtractor, "kdenlive:track_name", &track.name);

    // Video tracks mute their audio lane and vice versa.
    let hide = match track.kind {
        TrackKind::Video => "audio",
        TrackKind::Audio => "video",
    };
    let mut playlists = [0usize; 2];
    for (lane, slot) in playlists.iter_mut().enumerate() {
        let playlist_id = format!("playlist{number}_{}", lane + 1);
        let lane_track = doc.add_child(subtractor, "track");
        doc.set_attr(lane_track, "producer", &playlist_id);
        doc.set_attr(lane_track, "hide", hide);

        let playlist = doc.add_child(root, "playlist");
        doc.set_attr(playlist, "id", &playlist_id);
        *slot = playlist;
    }
    if track.kind == TrackKind::Audio {
        doc.add_property(subtractor, "kdenlive:audio_track", "1");
        for playlist in playlists {
            doc.add_property(playlist, "kdenlive:audio_track", "1");
        }
    }

    // All content lands on the first playlist; the second stays empty.
    let playlist = playlists[0];
    for item in &track.items {
        match item {
            TrackItem::Gap { duration } => {
                let blank = doc.add_child(playlist, "blank");
                doc.set_attr(blank, "length", &duration.to_frames().to_string());
            }
            TrackItem::Clip(clip) => {
                let producer_id = media_key(&clip.media_reference)
                    .and_then(|(_, resource)| media_ids.get(&resource))
                    .cloned();
                let producer_id = match producer_id {
                    Some(id) => id,
                    None => {
                        push_warning(
                            warnings,
                            AdapterWarning::UnsupportedClipWritten {
                                clip: clip.name.clone(),
                            },
                        );
                        UNSUPPORTED_ID.to_string()
                    }
                };
                let entry = doc.add_child(playlist, "entry");
                doc.set_attr(entry, "producer", &producer_id);
                doc.set_attr(
                    entry,
                    "in",
                    &clip.source_range.start_time.to_frames().to_string(),
                );
                doc.set_attr(
                    entry,
                    "out",
                    &clip.source_range.end_time_exclusive().to_frames().to_string(),
                );
                if !clip.effects.is_empty() {
                    push_warning(
                        warnings,
                        AdapterWarning::EffectsNotWritten {
                            clip: clip.name.clone(),
                        },
                    );
                }
            }
            TrackItem::Transition(_) => {
                push_warning(warnings, AdapterWarning::TransitionsNotWritten);
            }
        }
    }

    doc.append(root, subtractor);
}

fn push_warning(warnings: &mut Vec<AdapterWarning>, warning: AdapterWarning) {
    warn!("{warning}");
    warnings.push(warning);
}

// =============================================================================
// Tests
// =============================================================================

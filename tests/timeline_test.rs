//! Segment timing and chapter derivation across the builder and assembler.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;

use common::RecordingCompositor;
use reelforged::config::UploadConfig;
use reelforged::segment::{AudioAsset, ImageAsset, Segment, SegmentBuilder};
use reelforged::timeline::TimelineAssembler;
use reelforged::upload::UploadMetadata;
use reelforged_common::Topic;

fn segments(durations: &[f64], pad: f64) -> Vec<Segment> {
    let compositor = RecordingCompositor::default();
    let builder = SegmentBuilder::new(&compositor, pad);
    let image = Arc::new(ImageAsset::new("/images/default.jpg"));

    durations
        .iter()
        .zip(Topic::ALL)
        .map(|(d, topic)| {
            let audio = AudioAsset::new(format!("/tmp/{}_narration.mp3", topic.slug()), 10, *d);
            builder
                .build(topic, "text", Some(audio), Some(image.clone()))
                .unwrap()
        })
        .collect()
}

#[test]
fn example_durations_and_labels() {
    let built = segments(&[12.3, 8.0], 1.0);
    let durations: Vec<f64> = built.iter().map(Segment::duration).collect();
    assert_eq!(durations, vec![12.3 + 1.0, 8.0 + 1.0]);

    let timeline = TimelineAssembler::new().assemble(built).unwrap();
    let labels: Vec<String> = timeline.chapters().iter().map(|c| c.to_string()).collect();
    assert_eq!(labels, vec!["00:00 Aries", "00:13 Taurus"]);
}

#[test]
fn offsets_are_prefix_sums() {
    let durations = [3.7, 0.0, 61.25, 9.999, 0.5];
    let built = segments(&durations, 1.0);
    let timeline = TimelineAssembler::new().assemble(built).unwrap();

    assert_eq!(timeline.chapters().len(), timeline.segments().len());
    assert_eq!(timeline.chapters()[0].offset_seconds, 0.0);

    let mut expected = 0.0;
    for (chapter, segment) in timeline.chapters().iter().zip(timeline.segments()) {
        assert_eq!(chapter.offset_seconds, expected);
        assert_eq!(chapter.label, segment.topic().to_string());
        expected += segment.duration();
    }
    assert_eq!(timeline.total_duration(), expected);
}

#[test]
fn labels_truncate_but_offsets_keep_precision() {
    // 59.6 + 1.0 puts the second chapter at 60.6: label 01:00, not 01:01.
    let built = segments(&[59.6, 0.9, 1.0], 1.0);
    let timeline = TimelineAssembler::new().assemble(built).unwrap();

    assert_eq!(timeline.chapters()[1].to_string(), "01:00 Taurus");
    assert_eq!(timeline.chapters()[2].offset_seconds, (59.6 + 1.0) + (0.9 + 1.0));
    assert_eq!(timeline.chapters()[2].timestamp(), "01:02");
}

#[test]
fn description_lists_chapters() {
    let built = segments(&[4.0, 4.0, 4.0], 1.0);
    let timeline = TimelineAssembler::new().assemble(built).unwrap();
    assert_eq!(
        timeline.description(),
        "00:00 Aries\n00:05 Taurus\n00:10 Gemini"
    );
    assert_eq!(timeline.clips().len(), 3);
}

#[test]
fn upload_metadata_for_run() {
    let built = segments(&[4.0, 4.0], 1.0);
    let timeline = TimelineAssembler::new().assemble(built).unwrap();
    let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();

    let metadata = UploadMetadata::for_run(&UploadConfig::default(), &timeline, date);

    assert_eq!(metadata.title, "Daily Horoscope Compilation - March 07, 2026");
    assert_eq!(metadata.description, "00:00 Aries\n00:05 Taurus");
    assert_eq!(&metadata.tags[..4], &["horoscope", "astrology", "daily horoscope", "zodiac"]);
    assert_eq!(metadata.tags.len(), 16);
    assert_eq!(metadata.tags[15], "pisces");
}

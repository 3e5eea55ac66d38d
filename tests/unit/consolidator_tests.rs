/*!
 * Tests for OCR consolidation
 *
 * Geometry in these tests assumes a 1280x720 frame with the default
 * thresholds: centered window of 320px, band window of 36px, grouping
 * tolerance of 20px, and a gap of fps * min_duration = 6 frames.
 */

use suberase::app_config::VideoConfig;
use suberase::ocr::Consolidator;

use crate::common::{centered_run, detections, obs};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FPS: f64 = 30.0;

fn consolidator() -> Consolidator {
    Consolidator::new(WIDTH, HEIGHT, &VideoConfig::default(), FPS)
}

#[test]
fn test_consolidate_withCenteredRun_shouldEstimateBandFromObservations() {
    let map = centered_run(&[1, 2, 3], "你好");
    let (frames, band) = consolidator().consolidate(&map);

    assert_eq!(band.center_y, 650.0);
    assert_eq!(band.word_height, 40.0);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[&2].text, "你好");
}

#[test]
fn test_consolidate_withOffBandObservation_shouldDropIt() {
    let mut map = centered_run(&[1, 2, 3], "你好");
    // A watermark near the top of the frame, horizontally off-center so it
    // does not disturb the band estimate.
    map.entry(2).or_default().push(obs(80, 80, 260, 120, "LOGO"));

    let (frames, _) = consolidator().consolidate(&map);
    assert_eq!(frames[&2].text, "你好");
}

#[test]
fn test_consolidate_withWrongGlyphHeight_shouldDropObservation() {
    let mut map = centered_run(&[1, 2, 3, 4, 5], "你好");
    // Centered and at band height, but three times taller than the band's
    // glyphs. Height filtering has to reject it.
    map.insert(6, vec![obs(540, 590, 740, 710, "noise")]);

    let (frames, _) = consolidator().consolidate(&map);
    assert!(!frames.contains_key(&6));
}

#[test]
fn test_consolidate_withFragmentsLeftThenRight_shouldReadInPositionOrder() {
    let map = detections(vec![(
        1,
        vec![obs(540, 630, 640, 670, "你好"), obs(650, 630, 740, 670, "世界")],
    )]);

    let (frames, _) = consolidator().consolidate(&map);
    assert_eq!(frames[&1].text, "你好世界");
    assert_eq!(frames[&1].bbox.xmin, 540);
    assert_eq!(frames[&1].bbox.xmax, 740);
}

#[test]
fn test_consolidate_withFragmentsRightThenLeft_shouldStillReadInPositionOrder() {
    let map = detections(vec![(
        1,
        vec![obs(650, 630, 740, 670, "世界"), obs(540, 630, 640, 670, "你好")],
    )]);

    let (frames, _) = consolidator().consolidate(&map);
    assert_eq!(frames[&1].text, "你好世界");
}

#[test]
fn test_consolidate_withShortGap_shouldSynthesizeMissingFrames() {
    let mut map = centered_run(&[1, 2, 3], "你好");
    map.extend(centered_run(&[6, 7, 8], "你好"));

    let (frames, _) = consolidator().consolidate(&map);
    assert_eq!(frames.len(), 8);
    assert_eq!(frames[&4].text, "你好");
    assert_eq!(frames[&5].text, "你好");
}

#[test]
fn test_consolidate_withLongGap_shouldNotFill() {
    let mut map = centered_run(&[1, 2, 3], "你好");
    map.extend(centered_run(&[20, 21], "你好"));

    let (frames, _) = consolidator().consolidate(&map);
    assert_eq!(frames.len(), 5);
    assert!(!frames.contains_key(&10));
}

#[test]
fn test_consolidate_withDifferentText_shouldNotFillGap() {
    let mut map = centered_run(&[1, 2, 3], "你好");
    map.extend(centered_run(&[6, 7, 8], "再见"));

    let (frames, _) = consolidator().consolidate(&map);
    assert_eq!(frames.len(), 6);
    assert!(!frames.contains_key(&4));
    assert!(!frames.contains_key(&5));
}

#[test]
fn test_consolidate_withPunctuationJitter_shouldFillGapOnNormalizedText() {
    let mut map = centered_run(&[1, 2, 3], "你好。");
    map.extend(centered_run(&[6, 7, 8], "你好"));

    let (frames, _) = consolidator().consolidate(&map);
    // Boundary jitter on punctuation must not break the run in two.
    assert_eq!(frames.len(), 8);
    assert!(frames.contains_key(&4));
}

#[test]
fn test_consolidate_withEmptyDetections_shouldYieldEmptyStream() {
    let map = detections(vec![]);
    let (frames, band) = consolidator().consolidate(&map);
    assert!(frames.is_empty());
    assert_eq!(band.center_y, 0.0);
}

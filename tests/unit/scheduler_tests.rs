/*!
 * Tests for inpainting batch scheduling
 *
 * fps is 30 throughout, so the split gap is 60 frames.
 */

use std::path::Path;

use suberase::erase::BatchScheduler;

use crate::common::{centered_run, detections, obs, write_test_frame};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FPS: f64 = 30.0;

fn scheduler(max: usize, min: usize, total_frames: u32) -> BatchScheduler {
    BatchScheduler::new(Path::new("frames"), WIDTH, HEIGHT, FPS, max, min, 20, total_frames)
}

#[test]
fn test_plan_withIsolatedDetection_shouldExtendToMinimumLength() {
    let map = centered_run(&[5], "你好");
    let plans = scheduler(100, 10, 1000).plan(&map);

    assert_eq!(plans.len(), 1);
    let indices: Vec<u32> = plans[0].frames.iter().map(|f| f.index).collect();
    assert_eq!(indices, (5..=14).collect::<Vec<_>>());
    assert!(!plans[0].frames[0].rects.is_empty());
    assert!(plans[0].frames[1..].iter().all(|f| f.rects.is_empty()));
}

#[test]
fn test_plan_withExtensionPastLastFrame_shouldStopAtSequenceEnd() {
    let map = centered_run(&[5], "你好");
    let plans = scheduler(100, 10, 8).plan(&map);

    let indices: Vec<u32> = plans[0].frames.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![5, 6, 7, 8]);
}

#[test]
fn test_plan_withLongGap_shouldSplitBatches() {
    // 100 - 10 = 90 frames of silence, past the 60-frame split gap.
    let mut map = centered_run(&[8, 9, 10], "你好");
    map.extend(centered_run(&[100, 101, 102], "再见"));

    let plans = scheduler(100, 3, 1000).plan(&map);
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].frames.first().unwrap().index, 8);
    assert_eq!(plans[1].frames.first().unwrap().index, 100);
}

#[test]
fn test_plan_withShortGap_shouldKeepOneBatch() {
    let mut map = centered_run(&[8, 9, 10], "你好");
    map.extend(centered_run(&[40, 41, 42], "再见"));

    let plans = scheduler(100, 3, 1000).plan(&map);
    assert_eq!(plans.len(), 1);
}

#[test]
fn test_plan_withGapSplit_shouldNotExtendIntoNextBatch() {
    // The first batch closes at the split; its extension must stop at the
    // next detected index even when the minimum length allows more.
    let mut map = centered_run(&[10], "你好");
    map.extend(centered_run(&[75, 76, 77], "再见"));

    let plans = scheduler(100, 100, 1000).plan(&map);
    assert_eq!(plans.len(), 2);
    let first_indices: Vec<u32> = plans[0].frames.iter().map(|f| f.index).collect();
    assert_eq!(first_indices, (10..75).collect::<Vec<_>>());
}

#[test]
fn test_plan_withMoreThanMaxFrames_shouldSplitAtCapacity() {
    let indices: Vec<u32> = (1..=25).collect();
    let map = centered_run(&indices, "你好");

    let plans = scheduler(10, 2, 1000).plan(&map);
    assert_eq!(plans.len(), 3);
    assert_eq!(plans[0].frames.iter().filter(|f| !f.rects.is_empty()).count(), 10);
    assert_eq!(plans[1].frames.iter().filter(|f| !f.rects.is_empty()).count(), 10);
    assert_eq!(plans[2].frames.iter().filter(|f| !f.rects.is_empty()).count(), 5);
}

#[test]
fn test_plan_withUndersizedTail_shouldAbsorbIntoPredecessor() {
    // 12 detected frames with max 10 leave a 2-frame tail, below the
    // 8-frame minimum; it is folded into the previous batch.
    let indices: Vec<u32> = (1..=12).collect();
    let map = centered_run(&indices, "你好");

    let plans = scheduler(10, 8, 12).plan(&map);
    assert_eq!(plans.len(), 1);
    let batch_indices: Vec<u32> = plans[0].frames.iter().map(|f| f.index).collect();
    assert_eq!(batch_indices, (1..=12).collect::<Vec<_>>());
}

#[test]
fn test_plan_withSingleUndersizedBatch_shouldKeepIt() {
    // Nothing to absorb into; a lone short batch must survive.
    let map = centered_run(&[3, 4], "你好");
    let plans = scheduler(10, 8, 4).plan(&map);
    assert_eq!(plans.len(), 1);
}

#[test]
fn test_plan_withDegenerateBox_shouldPlanEmptyMaskFrame() {
    let map = detections(vec![
        (5, vec![obs(700, 630, 500, 670, "skew")]),
        (6, vec![obs(540, 630, 740, 670, "你好")]),
    ]);

    let plans = scheduler(100, 2, 100).plan(&map);
    assert_eq!(plans.len(), 1);
    assert!(plans[0].frames[0].rects.is_empty());
    assert!(!plans[0].frames[1].rects.is_empty());
}

#[test]
fn test_materialize_withFramesOnDisk_shouldAlignPathsFramesAndMasks() {
    let temp_dir = crate::common::create_temp_dir().unwrap();
    let frames_dir = temp_dir.path();
    for index in 5..=8 {
        write_test_frame(frames_dir, index, 64, 36);
    }

    let map = detections(vec![(5, vec![obs(10, 20, 50, 30, "text")])]);
    let scheduler = BatchScheduler::new(frames_dir, 64, 36, FPS, 10, 4, 2, 8);
    let plans = scheduler.plan(&map);
    assert_eq!(plans.len(), 1);

    let batch = scheduler.materialize(&plans[0]).unwrap();
    assert_eq!(batch.paths.len(), 4);
    assert_eq!(batch.frames.len(), 4);
    assert_eq!(batch.masks.len(), 4);
    // The detected frame's mask has white pixels, the context frames' don't.
    assert!(batch.masks[0].pixels().any(|p| p.0[0] == 255));
    assert!(batch.masks[1].pixels().all(|p| p.0[0] == 0));
}

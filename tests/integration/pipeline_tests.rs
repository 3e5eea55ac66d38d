/*!
 * End-to-end tests over the detection-to-SRT path and the erase loop,
 * using synthetic detections and mock collaborators instead of ffmpeg,
 * an OCR model, or an inpainting network.
 */

use anyhow::Result;
use suberase::app_config::VideoConfig;
use suberase::erase::writer::write_frames;
use suberase::erase::{BatchScheduler, InpaintingEngine};
use suberase::ocr::{Consolidator, consolidator, detector};
use suberase::subtitle_processor::{Segmenter, extract_timeline, render_srt};

use crate::common::{self, centered_run, mocks::IdentityEngine};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FPS: f64 = 30.0;

/// Two subtitles with noisy detections: the first has a short detection
/// gap inside it, the second starts after a scene of silence.
fn noisy_detections() -> suberase::ocr::DetectionMap {
    let mut map = centered_run(&(1..=20).collect::<Vec<_>>(), "你好，世界");
    map.extend(centered_run(&(24..=45).collect::<Vec<_>>(), "你好，世界"));
    map.extend(centered_run(&(150..=200).collect::<Vec<_>>(), "再见"));
    map
}

#[test]
fn test_detection_to_srt_withNoisyStream_shouldYieldTwoCleanEntries() {
    let detections = noisy_detections();

    let consolidator = Consolidator::new(WIDTH, HEIGHT, &VideoConfig::default(), FPS);
    let (consolidated, band) = consolidator.consolidate(&detections);
    assert_eq!(band.center_y, 650.0);

    let segmenter = Segmenter::new(FPS, 0.2);
    let entries = segmenter.segment(&consolidated);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].start_frame, 1);
    assert_eq!(entries[0].end_frame, 45);
    assert_eq!(entries[0].text, "你好，世界");
    assert_eq!(entries[1].start_frame, 150);
    assert_eq!(entries[1].end_frame, 200);

    let srt = render_srt(&entries, FPS);
    let timeline = extract_timeline(&srt);
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0], "00:00:00,033 --> 00:00:01,500");
    assert_eq!(timeline[1], "00:00:05,000 --> 00:00:06,666");
}

#[test]
fn test_consolidated_sidecar_withNoisyStream_shouldRoundTripOneRecordPerFrame() -> Result<()> {
    let detections = noisy_detections();

    let consolidator = Consolidator::new(WIDTH, HEIGHT, &VideoConfig::default(), FPS);
    let (consolidated, _) = consolidator.consolidate(&detections);
    assert!(!consolidated.is_empty());

    let temp_dir = common::create_temp_dir()?;
    let sidecar = temp_dir.path().join("detections.check.json");
    let flattened = consolidator::to_detection_map(&consolidated);
    detector::write_sidecar(&flattened, temp_dir.path(), &sidecar)?;

    let parsed = detector::parse_sidecar(&std::fs::read_to_string(&sidecar)?).unwrap();
    assert_eq!(parsed, flattened);
    for (index, frame) in &consolidated {
        assert_eq!(parsed[index].len(), 1);
        assert_eq!(parsed[index][0].text, frame.text);
    }
    Ok(())
}

#[tokio::test]
async fn test_erase_loop_withIdentityEngine_shouldRewriteEveryPlannedFrame() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let frames_dir = temp_dir.path();
    let total_frames = 30u32;
    for index in 1..=total_frames {
        common::write_test_frame(frames_dir, index, 64, 36);
    }

    let detections = centered_run(&(3..=20).collect::<Vec<_>>(), "text");
    let scheduler = BatchScheduler::new(frames_dir, 64, 36, FPS, 10, 4, 2, total_frames);
    let plans = scheduler.plan(&detections);
    assert!(!plans.is_empty());

    let engine = IdentityEngine;
    let mut written = 0;
    for plan in &plans {
        let batch = scheduler.materialize(plan)?;
        let repaired = engine.inpaint(&batch, 5).await?;
        assert_eq!(repaired.len(), batch.paths.len());
        written += repaired.len();
        write_frames(repaired, 4).await?;
    }

    // Every planned frame is still a readable image after the rewrite.
    let mut planned = 0;
    for plan in &plans {
        for frame in &plan.frames {
            planned += 1;
            let image = image::open(&frame.path)?;
            assert_eq!(image.to_rgb8().dimensions(), (64, 36));
        }
    }
    assert_eq!(written, planned);
    Ok(())
}

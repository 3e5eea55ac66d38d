/*!
 * Tests for repaired frame persistence
 */

use image::RgbImage;
use suberase::erase::RepairedFrame;
use suberase::erase::writer::write_frames;

use crate::common;

fn repaired(path: std::path::PathBuf, shade: u8) -> RepairedFrame {
    RepairedFrame {
        path,
        image: RgbImage::from_pixel(16, 16, image::Rgb([shade, shade, shade])),
    }
}

#[tokio::test]
async fn test_write_frames_withValidPaths_shouldOverwriteAll() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dir = temp_dir.path();
    for index in 1..=3u32 {
        common::write_test_frame(dir, index, 16, 16);
    }

    let frames: Vec<RepairedFrame> = (1..=3u32)
        .map(|i| repaired(dir.join(format!("{:04}.png", i)), 200))
        .collect();

    write_frames(frames, 2).await.unwrap();

    for index in 1..=3u32 {
        let image = image::open(dir.join(format!("{:04}.png", index))).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [200, 200, 200]);
    }
}

#[tokio::test]
async fn test_write_frames_withUnwritablePath_shouldReportFailedPathsOnly() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dir = temp_dir.path();

    let good_path = dir.join("0001.png");
    let bad_path = dir.join("no-such-dir").join("0002.png");

    let frames = vec![repaired(good_path.clone(), 120), repaired(bad_path.clone(), 120)];
    let error = write_frames(frames, 4).await.unwrap_err();

    // The failing path is named; the sibling write still happened.
    assert!(error.to_string().contains("0002.png"));
    assert!(good_path.exists());
}

#[tokio::test]
async fn test_write_frames_withZeroConcurrency_shouldStillWrite() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("0001.png");

    write_frames(vec![repaired(path.clone(), 10)], 0).await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_write_frames_withNoFrames_shouldSucceed() {
    write_frames(Vec::new(), 4).await.unwrap();
}

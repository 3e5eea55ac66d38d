/*!
 * Tests for detection sidecar parsing and persistence
 */

use std::path::Path;

use anyhow::Result;
use suberase::ocr::detector::{parse_sidecar, write_sidecar, BoundingBox};

use crate::common;

#[test]
fn test_parse_sidecar_withCompositeKeys_shouldGroupByFrame() {
    let content = r#"{
        "frames/0001.png,0": {"box": [100, 600, 300, 640], "text": "first"},
        "frames/0001.png,1": {"box": [320, 600, 500, 640], "text": "second"},
        "frames/0003.png,0": {"box": [100, 600, 300, 640], "text": "third"}
    }"#;

    let map = parse_sidecar(content).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map[&1].len(), 2);
    assert_eq!(map[&3].len(), 1);
    assert_eq!(map[&1][0].bbox, BoundingBox::new(100, 600, 300, 640));
    assert_eq!(map[&3][0].text, "third");
}

#[test]
fn test_parse_sidecar_withMalformedRecords_shouldSkipThem() {
    let content = r#"{
        "frames/not-a-frame.png,0": {"box": [1, 2, 3, 4], "text": "dropped"},
        "frames/0002.png,0": {"box": [1, 2, 3], "text": "dropped too"},
        "frames/0002.png,1": {"box": [10, 20, 30, 40], "text": "kept"}
    }"#;

    let map = parse_sidecar(content).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map[&2].len(), 1);
    assert_eq!(map[&2][0].text, "kept");
}

#[test]
fn test_parse_sidecar_withManyDetectionsPerFrame_shouldKeepNumericOrder() {
    // Twelve detections on one frame: lexicographic key order would yield
    // 0, 1, 10, 11, 2, ... so the parse must sort by the detection index.
    let mut records = Vec::new();
    for i in 0..12 {
        records.push(format!(
            r#""frames/0005.png,{}": {{"box": [{}, 600, {}, 640], "text": "t{}"}}"#,
            i,
            i * 50,
            i * 50 + 40,
            i
        ));
    }
    let content = format!("{{{}}}", records.join(","));

    let map = parse_sidecar(&content).unwrap();
    assert_eq!(map[&5].len(), 12);
    let texts: Vec<&str> = map[&5].iter().map(|obs| obs.text.as_str()).collect();
    let expected: Vec<String> = (0..12).map(|i| format!("t{}", i)).collect();
    assert_eq!(texts, expected);
}

#[test]
fn test_parse_sidecar_withNonObjectJson_shouldFail() {
    assert!(parse_sidecar("[1, 2, 3]").is_err());
    assert!(parse_sidecar("not json at all").is_err());
}

#[test]
fn test_parse_sidecar_withMissingText_shouldDefaultToEmpty() {
    let content = r#"{"frames/0007.png,0": {"box": [0, 0, 10, 10]}}"#;
    let map = parse_sidecar(content).unwrap();
    assert_eq!(map[&7][0].text, "");
}

#[test]
fn test_write_sidecar_thenParse_shouldPreserveDetections() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let frames_dir = Path::new("frames");
    let map = common::detections(vec![
        (1, vec![common::obs(100, 600, 300, 640, "hello")]),
        (2, vec![
            common::obs(100, 600, 300, 640, "left"),
            common::obs(320, 600, 500, 640, "right"),
        ]),
    ]);

    let sidecar = temp_dir.path().join("detections.json");
    write_sidecar(&map, frames_dir, &sidecar)?;

    let content = std::fs::read_to_string(&sidecar)?;
    let parsed = parse_sidecar(&content).unwrap();
    assert_eq!(parsed, map);
    Ok(())
}

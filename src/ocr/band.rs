/*!
 * Robust 1-D grouping for locating the dominant subtitle band.
 *
 * Subtitle boxes drift a few pixels from frame to frame, and incidental text
 * (watermarks, scene text) lands elsewhere entirely. Grouping the observed
 * box centers and heights and averaging the largest group gives a stable
 * estimate of where the subtitle band sits and how tall its glyphs are.
 */

/// The dominant vertical subtitle band for one video, computed once from the
/// full detection set and held immutable for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubtitleBand {
    /// Vertical center of the band in frame pixels
    pub center_y: f64,
    /// Dominant glyph height in frame pixels
    pub word_height: f64,
    /// Tolerance the estimate was computed with
    pub tolerance: f64,
}

/// Mean of the largest greedy group of `values` under `tolerance`.
///
/// Values are sorted ascending and partitioned greedily: a value joins the
/// current group iff its distance to the group's first (smallest) member is
/// at most `tolerance`, otherwise it starts a new group. The arithmetic mean
/// of the largest group is returned; ties go to the group encountered first
/// in sorted order. Empty input yields `0.0`; no detections is a legitimate
/// "no subtitles" outcome, not an error.
///
/// This is a mode-seeking heuristic, not a clustering algorithm: groups are
/// anchored to their first member and never re-balanced, so membership
/// depends on sort order. Downstream thresholds are tuned to exactly this
/// behavior.
pub fn grouped_mean(values: &[f64], tolerance: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut groups: Vec<Vec<f64>> = Vec::new();
    let mut current: Vec<f64> = vec![sorted[0]];

    for &value in &sorted[1..] {
        if (value - current[0]).abs() <= tolerance {
            current.push(value);
        } else {
            groups.push(std::mem::replace(&mut current, vec![value]));
        }
    }
    groups.push(current);

    // First-found wins on ties, matching the greedy anchor rule.
    let largest = groups
        .iter()
        .max_by(|a, b| a.len().cmp(&b.len()).then(std::cmp::Ordering::Greater))
        .unwrap_or(&groups[0]);

    largest.iter().sum::<f64>() / largest.len() as f64
}

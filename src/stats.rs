//! Per-episode feature averages.

use crate::features::FeatureSample;

/// Mean of every [`FeatureSample`] field over one episode
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionStats {
    pub high: f32,
    pub low: f32,
    pub volume: f32,
    pub distance: f32,
    pub quiet: f32,
    pub near: f32,
    pub sample_count: usize,
}

/// Average the buffer in one pass. `None` when nothing was recorded.
pub fn aggregate(samples: &[FeatureSample]) -> Option<SessionStats> {
    if samples.is_empty() {
        return None;
    }

    // f64 accumulators keep long constant runs exact
    let mut sums = [0.0f64; 6];
    for s in samples {
        sums[0] += s.high as f64;
        sums[1] += s.low as f64;
        sums[2] += s.volume as f64;
        sums[3] += s.distance as f64;
        sums[4] += s.quiet as f64;
        sums[5] += s.near as f64;
    }

    let n = samples.len() as f64;
    let mean = |i: usize| (sums[i] / n) as f32;
    Some(SessionStats {
        high: mean(0),
        low: mean(1),
        volume: mean(2),
        distance: mean(3),
        quiet: mean(4),
        near: mean(5),
        sample_count: samples.len(),
    })
}

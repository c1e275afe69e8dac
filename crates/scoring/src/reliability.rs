//! Final reliability score: install scale and growth trend are each mapped
//! to a 1-5 subscore, combined through a 5x5 anchor matrix with bilinear
//! interpolation, then remapped to the 2-10 display scale.

use appgauge_model::{Grade, ScoreCard};

/// Piecewise-linear anchors mapping total installs to a 1-5 subscore.
const DOWNLOAD_ANCHORS: &[(f64, f64)] = &[
    (0.0, 1.0),
    (50_000.0, 2.0),
    (200_000.0, 3.0),
    (1_000_000.0, 4.0),
    (5_000_000.0, 5.0),
];

/// Piecewise-linear anchors mapping the weekly growth slope to a 1-5
/// subscore. Slopes are in log-count units per week, so these are small.
const GROWTH_ANCHORS: &[(f64, f64)] = &[
    (-0.03, 1.0),
    (-0.01, 2.0),
    (0.01, 3.0),
    (0.03, 4.0),
    (0.06, 5.0),
];

/// Combined matrix score anchors, rows indexed by downloads subscore 1..5,
/// columns by growth subscore 1..5. Monotone along both axes.
const SCORE_MATRIX: [[f64; 5]; 5] = [
    [0.0, 0.5, 1.0, 2.0, 3.5],
    [0.5, 1.0, 2.0, 3.5, 4.5],
    [1.0, 2.0, 3.5, 4.5, 5.0],
    [2.5, 3.5, 4.5, 5.0, 5.0],
    [3.5, 4.0, 4.5, 5.0, 5.0],
];

/// Linear interpolation through ascending anchors, clamped to the anchor
/// range at both ends.
fn piecewise(anchors: &[(f64, f64)], x: f64) -> f64 {
    let (first_x, first_y) = anchors[0];
    if x <= first_x {
        return first_y;
    }
    for window in anchors.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if x <= x1 {
            let t = (x - x0) / (x1 - x0);
            return y0 + t * (y1 - y0);
        }
    }
    anchors[anchors.len() - 1].1
}

pub fn downloads_subscore(total_installs: u64) -> f64 {
    piecewise(DOWNLOAD_ANCHORS, total_installs as f64)
}

pub fn growth_subscore(slope: f64) -> f64 {
    piecewise(GROWTH_ANCHORS, slope)
}

/// Bilinear lookup into the anchor matrix. Subscores are in [1,5]; corners
/// sit at the integer grid points.
fn matrix_score(downloads: f64, growth: f64) -> f64 {
    let d = (downloads - 1.0).clamp(0.0, 4.0);
    let g = (growth - 1.0).clamp(0.0, 4.0);

    let di = (d.floor() as usize).min(3);
    let gi = (g.floor() as usize).min(3);
    let dt = d - di as f64;
    let gt = g - gi as f64;

    let low = SCORE_MATRIX[di][gi] * (1.0 - gt) + SCORE_MATRIX[di][gi + 1] * gt;
    let high = SCORE_MATRIX[di + 1][gi] * (1.0 - gt) + SCORE_MATRIX[di + 1][gi + 1] * gt;
    low * (1.0 - dt) + high * dt
}

fn snap_to_half(score: f64) -> f64 {
    (score * 2.0).round() / 2.0
}

/// Combine the install estimate and growth slope into a graded score card.
///
/// A missing slope (no review history) is not treated as zero growth: the
/// matrix is skipped and the app is judged on install scale alone.
pub fn reliability_score(total_installs: u64, slope: Option<f64>) -> ScoreCard {
    let downloads = downloads_subscore(total_installs);

    let (matrix, growth) = match slope {
        Some(slope) => {
            let growth = growth_subscore(slope);
            (matrix_score(downloads, growth), Some(growth))
        }
        None => (downloads, None),
    };

    let score = snap_to_half(2.0 + matrix * 1.6);
    let grade = Grade::from_score(score);
    tracing::debug!(total_installs, ?slope, matrix, score, ?grade, "reliability scored");

    ScoreCard {
        score,
        grade,
        downloads_subscore: downloads,
        growth_subscore: growth,
    }
}

//! Fracture discretization.
//!
//! Coordinates are dimensionless (lengths divided by the well length `L`).
//! The well runs along `x ∈ [-0.5, 0.5]`; fracture `k` of `nf` sits at
//! `x_k = -0.5 + k / (nf - 1)` (or at the origin for a single fracture) and
//! spans `y ∈ [-LfD, LfD]`.

/// One straight source segment on a fracture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x: f64,
    pub y0: f64,
    pub y1: f64,
}

impl Segment {
    pub fn length(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Collocation point.
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.y0 + self.y1)
    }
}

/// Fracture positions along the well axis.
pub fn fracture_positions(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|k| -0.5 + k as f64 / (n - 1) as f64).collect(),
    }
}

/// All segments, fracture by fracture.
pub fn build_segments(fracture_count: usize, half_length_d: f64, segments_per_fracture: usize) -> Vec<Segment> {
    let nseg = segments_per_fracture.max(1);
    let seg_len = 2.0 * half_length_d / nseg as f64;
    fracture_positions(fracture_count)
        .into_iter()
        .flat_map(|x| {
            (0..nseg).map(move |j| Segment {
                x,
                y0: -half_length_d + j as f64 * seg_len,
                y1: -half_length_d + (j + 1) as f64 * seg_len,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractures_span_the_well_uniformly() {
        assert_eq!(fracture_positions(1), vec![0.0]);
        assert_eq!(fracture_positions(3), vec![-0.5, 0.0, 0.5]);
        let p = fracture_positions(5);
        assert!((p[1] - (-0.25)).abs() < 1e-15);
    }

    #[test]
    fn segments_tile_each_fracture() {
        let segs = build_segments(2, 0.1, 4);
        assert_eq!(segs.len(), 8);
        let total: f64 = segs.iter().map(Segment::length).sum();
        assert!((total - 2.0 * 2.0 * 0.1).abs() < 1e-15);
        assert_eq!(segs[0].y0, -0.1);
        assert!((segs[3].y1 - 0.1).abs() < 1e-15);
        assert_eq!(segs[4].x, 0.5);
    }
}

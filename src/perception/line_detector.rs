use crate::common::Vec2D;
use crate::config::DetectorConfig;
use image::RgbImage;
use rand::Rng;

/// A straight edge candidate in frame pixel coordinates.
///
/// Produced fresh for every frame; never persisted across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    p0: Vec2D<f32>,
    p1: Vec2D<f32>,
}

impl LineSegment {
    pub const fn new(p0: Vec2D<f32>, p1: Vec2D<f32>) -> Self { Self { p0, p1 } }

    pub const fn p0(&self) -> Vec2D<f32> { self.p0 }

    pub const fn p1(&self) -> Vec2D<f32> { self.p1 }

    pub fn length(&self) -> f32 { self.p0.euclid_distance(&self.p1) }

    pub fn midpoint(&self) -> Vec2D<f32> { self.p0.midpoint(&self.p1) }
}

/// Binary edge image produced by the Canny stage.
pub(super) struct EdgeMap {
    pub(super) width: usize,
    pub(super) height: usize,
    pub(super) on: Vec<bool>,
}

impl EdgeMap {
    pub(super) fn at(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && self.on[y as usize * self.width + x as usize]
    }
}

/// Extracts track-line segments from one camera frame.
///
/// Fixed three-stage pipeline: inclusive color threshold, Canny edge
/// detection on the mask, then a progressive probabilistic Hough transform
/// with 1 degree angular resolution. A frame without track pixels yields an
/// empty segment list; that is the expected result, not a failure.
pub struct LineDetector {
    cfg: DetectorConfig,
}

impl LineDetector {
    const THETA_BINS: usize = 180;

    pub fn new(cfg: DetectorConfig) -> Self { Self { cfg } }

    pub fn detect(&self, img: &RgbImage) -> Vec<LineSegment> {
        let mask = self.threshold_mask(img);
        let edges = self.canny(&mask, img.width() as usize, img.height() as usize);
        self.probabilistic_hough(&edges)
    }

    /// Stage 1: per-channel inclusive band threshold, 255 inside the band.
    pub(super) fn threshold_mask(&self, img: &RgbImage) -> Vec<u8> {
        let lo = self.cfg.lower_bound;
        let hi = self.cfg.upper_bound;
        img.pixels()
            .map(|p| {
                let inside = (0..3).all(|c| p.0[c] >= lo[c] && p.0[c] <= hi[c]);
                if inside { 255 } else { 0 }
            })
            .collect()
    }

    /// Stage 2: Canny on the binary mask. Sobel gradients with an L1
    /// magnitude, direction-aligned non-maximum suppression, then
    /// double-threshold hysteresis.
    pub(super) fn canny(&self, mask: &[u8], width: usize, height: usize) -> EdgeMap {
        let mut edges = EdgeMap { width, height, on: vec![false; width * height] };
        if width < 3 || height < 3 {
            return edges;
        }

        let mut gx = vec![0.0f32; width * height];
        let mut gy = vec![0.0f32; width * height];
        let mut mag = vec![0.0f32; width * height];
        let v = |x: usize, y: usize| f32::from(mask[y * width + x]);
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let sx = (v(x + 1, y - 1) + 2.0 * v(x + 1, y) + v(x + 1, y + 1))
                    - (v(x - 1, y - 1) + 2.0 * v(x - 1, y) + v(x - 1, y + 1));
                let sy = (v(x - 1, y + 1) + 2.0 * v(x, y + 1) + v(x + 1, y + 1))
                    - (v(x - 1, y - 1) + 2.0 * v(x, y - 1) + v(x + 1, y - 1));
                let idx = y * width + x;
                gx[idx] = sx;
                gy[idx] = sy;
                mag[idx] = sx.abs() + sy.abs();
            }
        }

        // 0 = suppressed, 1 = weak, 2 = strong
        let mut class = vec![0u8; width * height];
        let mut strong: Vec<(usize, usize)> = Vec::new();
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let idx = y * width + x;
                let m = mag[idx];
                if m < self.cfg.canny_low {
                    continue;
                }
                let (dx, dy) = quantize_direction(gx[idx], gy[idx]);
                let before = mag[(y as i32 - dy) as usize * width + (x as i32 - dx) as usize];
                let after = mag[(y as i32 + dy) as usize * width + (x as i32 + dx) as usize];
                // Asymmetric comparison keeps exactly one pixel of a tied ridge.
                if m > before && m >= after {
                    if m >= self.cfg.canny_high {
                        class[idx] = 2;
                        strong.push((x, y));
                    } else {
                        class[idx] = 1;
                    }
                }
            }
        }

        // Hysteresis: flood from strong pixels through 8-connected weak ones.
        let mut stack = strong;
        while let Some((x, y)) = stack.pop() {
            let idx = y * width + x;
            if edges.on[idx] {
                continue;
            }
            edges.on[idx] = true;
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    let n_idx = ny * width + nx;
                    if class[n_idx] > 0 && !edges.on[n_idx] {
                        stack.push((nx, ny));
                    }
                }
            }
        }
        edges
    }

    /// Stage 3: progressive probabilistic Hough transform.
    ///
    /// Edge pixels are popped in random order and voted over all theta bins;
    /// once a bin reaches the vote threshold the line is traced pixel-wise in
    /// both directions, bridging gaps up to `max_line_gap`. Consumed pixels
    /// are erased (and un-voted for accepted lines) so each edge supports at
    /// most one segment.
    pub(super) fn probabilistic_hough(&self, edges: &EdgeMap) -> Vec<LineSegment> {
        let (width, height) = (edges.width, edges.height);
        let diag = ((width * width + height * height) as f32).sqrt().ceil() as i32;
        let n_rho = (2 * diag + 1) as usize;

        let (sin_t, cos_t): (Vec<f32>, Vec<f32>) = (0..Self::THETA_BINS)
            .map(|t| (t as f32).to_radians())
            .map(|theta| (theta.sin(), theta.cos()))
            .unzip();
        let rho_bin = |x: i32, y: i32, t: usize| {
            ((x as f32 * cos_t[t] + y as f32 * sin_t[t]).round() as i32 + diag) as usize
        };

        let mut mask = edges.on.clone();
        let mut points: Vec<(i32, i32)> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x as i32, y as i32)))
            .filter(|&(x, y)| edges.at(x, y))
            .collect();
        let mut accum = vec![0i32; Self::THETA_BINS * n_rho];
        let mut segments = Vec::new();
        let mut rng = rand::rng();

        while !points.is_empty() {
            let pick = rng.random_range(0..points.len());
            let (x, y) = points.swap_remove(pick);
            let seed_idx = y as usize * width + x as usize;
            // May have been consumed by a previously traced line.
            if !mask[seed_idx] {
                continue;
            }

            let mut best_votes = 0;
            let mut best_theta = 0;
            for t in 0..Self::THETA_BINS {
                let bin = t * n_rho + rho_bin(x, y, t);
                accum[bin] += 1;
                if accum[bin] > best_votes {
                    best_votes = accum[bin];
                    best_theta = t;
                }
            }
            if best_votes < self.cfg.hough_threshold as i32 {
                continue;
            }

            // Direction along the line x*cos(theta) + y*sin(theta) = rho.
            let (ux, uy) = (-sin_t[best_theta], cos_t[best_theta]);
            let mut ends = [(x, y); 2];
            let mut consumed = vec![(x, y)];
            for (sign, end) in [1.0f32, -1.0].into_iter().zip(ends.iter_mut()) {
                let (mut fx, mut fy) = (x as f32, y as f32);
                let mut gap = 0;
                loop {
                    fx += ux * sign;
                    fy += uy * sign;
                    let (px, py) = (fx.round() as i32, fy.round() as i32);
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        break;
                    }
                    if mask[py as usize * width + px as usize] {
                        gap = 0;
                        *end = (px, py);
                        consumed.push((px, py));
                    } else {
                        gap += 1;
                        if gap > self.cfg.max_line_gap {
                            break;
                        }
                    }
                }
            }

            let p0: Vec2D<f32> = Vec2D::from(ends[0]).cast();
            let p1: Vec2D<f32> = Vec2D::from(ends[1]).cast();
            let good = p0.euclid_distance(&p1) >= self.cfg.min_line_length;
            for (px, py) in consumed {
                if good {
                    for t in 0..Self::THETA_BINS {
                        accum[t * n_rho + rho_bin(px, py, t)] -= 1;
                    }
                }
                mask[py as usize * width + px as usize] = false;
            }
            if good {
                segments.push(LineSegment::new(p0, p1));
            }
        }
        segments
    }
}

/// Quantizes a gradient vector into one of four neighbor axes for NMS.
fn quantize_direction(gx: f32, gy: f32) -> (i32, i32) {
    const TAN_22_5: f32 = 0.414_213_56;
    let abs_gx = gx.abs();
    let abs_gy = gy.abs();
    if abs_gy <= abs_gx * TAN_22_5 {
        (1, 0)
    } else if abs_gx <= abs_gy * TAN_22_5 {
        (0, 1)
    } else if (gx >= 0.0) == (gy >= 0.0) {
        (1, 1)
    } else {
        (1, -1)
    }
}

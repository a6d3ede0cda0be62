//! Gradient Builder (C9)
//!
//! Builds the 3D (or, with `gradient_depth == 1`, 2D) gradient volume by
//! *reverse splatting*: for every frame and every pixel with a non-trivial
//! timing-map entry, the pixel's current reveal/dissolve position (read
//! from the timing map) and the running wall-clock time together produce a
//! lifetime coordinate and a weight; the pixel's color is distributed
//! across the trilinear-interpolated corner cells at that coordinate. The
//! per-frame "now" position within the fade-in/fade-out eras
//! (`f_life.r`/`f_life.g`/`f_life.b` below) is what lets a later pass
//! revisit cells that an earlier frame only partially filled.

use crate::color::clampf;
use crate::frame::Frame;
use crate::timing::{Metadata, TimingMap};

/// One accumulator cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientCell {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
    pub weight: f32,
    pub quality: f32,
}

/// The `(Wg, Hg, Dg)` accumulator. `depth == 1` is the 2D ramp case.
#[derive(Debug, Clone)]
pub struct GradientVolume {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub cells: Vec<GradientCell>,
}

impl GradientVolume {
    #[must_use]
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        let n = (width as usize) * (height as usize) * (depth.max(1) as usize);
        Self { width, height, depth: depth.max(1), cells: vec![GradientCell::default(); n] }
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.height as usize + y) * self.width as usize + x
    }
}

fn splat(volume: &mut GradientVolume, cx: f32, cy: f32, cz: f32, color: [f32; 4], weight: f32, lerp_weight: f32) {
    if weight <= 0.0 || lerp_weight <= 0.0 {
        return;
    }
    let (wg, hg, dg) = (volume.width as usize, volume.height as usize, volume.depth as usize);
    let cx = cx.clamp(0.0, (wg.max(2) - 1) as f32);
    let cy = cy.clamp(0.0, (hg.max(2) - 1) as f32);
    let cz = cz.clamp(0.0, (dg.max(2) - 1) as f32);

    let x0 = cx.floor() as usize;
    let y0 = cy.floor() as usize;
    let z0 = cz.floor() as usize;
    let x1 = (x0 + 1).min(wg - 1);
    let y1 = (y0 + 1).min(hg - 1);
    let z1 = if dg > 1 { (z0 + 1).min(dg - 1) } else { z0 };
    let (fx, fy, fz) = (cx - x0 as f32, cy - y0 as f32, if dg > 1 { cz - z0 as f32 } else { 0.0 });

    let deposit = weight * lerp_weight;
    for &(xi, wx) in &[(x0, 1.0 - fx), (x1, fx)] {
        for &(yi, wy) in &[(y0, 1.0 - fy), (y1, fy)] {
            for &(zi, wz) in &[(z0, 1.0 - fz), (z1, fz)] {
                let corner_weight = wx * wy * wz;
                if corner_weight <= 0.0 {
                    continue;
                }
                let idx = volume.index(xi, yi, zi);
                let cell = &mut volume.cells[idx];
                cell.r += color[0] * corner_weight * deposit;
                cell.g += color[1] * corner_weight * deposit;
                cell.b += color[2] * corner_weight * deposit;
                cell.a += color[3] * corner_weight * deposit;
                cell.weight += corner_weight;
                cell.quality += corner_weight * deposit;
                if dg <= 1 {
                    break; // no depth interpolation for the 2D ramp.
                }
            }
        }
    }
}

/// Accumulate one frame's contribution into `volume`.
pub fn accumulate_frame(
    volume: &mut GradientVolume,
    frame: &Frame,
    timing: &TimingMap,
    metadata: &Metadata,
    frame_id: u32,
    total_frames: u32,
) {
    let t = frame_id as f32 / (total_frames.max(1) as f32);
    let fade_in_duration = metadata.fade_in_duration.max(1e-6);
    let fade_out_duration = metadata.fade_out_duration.max(1e-6);
    let fade_out_start = 1.0 - fade_out_duration;

    for py in 0..frame.height() {
        for px in 0..frame.width() {
            let idx = (py * frame.width() + px) as usize;
            let tex = timing.pixels[idx];
            let (texr, texg, texb) = (f32::from(tex.r) / 255.0, f32::from(tex.g) / 255.0, f32::from(tex.b) / 255.0);
            if texr == 0.0 && texg == 0.0 {
                continue;
            }

            let fade_in_start = (1.0 - texr) * fade_in_duration;
            let fade_out_end = texg * fade_out_duration + fade_out_start;
            let denom = fade_out_end - fade_in_start;
            let fade_progress = if denom.abs() > 1e-6 { (t - fade_in_start) / denom } else { 0.0 };

            let f_life_r = clampf(t / fade_in_duration, 0.0, 1.0);
            let f_life_g = clampf((t - fade_out_start) / fade_out_duration, 0.0, 1.0);
            let f_life_b = clampf(fade_progress, 0.0, 1.0);

            let fade_in_factor = clampf(f_life_r - (1.0 - texr), 0.0, 1.0);
            let fade_out_factor = clampf(texg - f_life_g, 0.0, 1.0);

            let gate = (1.0 - texb).max(0.0);
            let weight = clampf(fade_in_factor * 15.0 * gate, 0.0, 1.0) * clampf(fade_out_factor * 15.0 * gate, 0.0, 1.0);
            if weight <= 0.0 {
                continue;
            }

            let src = frame.pixel(px, py);
            let alpha_eff = f32::from(src.a) / 255.0 / weight.max(1e-6);
            let color = [f32::from(src.r) / 255.0, f32::from(src.g) / 255.0, f32::from(src.b) / 255.0, alpha_eff];

            if volume.depth <= 1 {
                splat(
                    volume,
                    f_life_r * 0.5 * (volume.width as f32),
                    (1.0 - fade_in_factor) * (volume.height as f32),
                    0.0,
                    color,
                    weight,
                    1.0 - f_life_b,
                );
                splat(
                    volume,
                    (0.5 + 0.5 * f_life_g) * (volume.width as f32),
                    fade_out_factor * (volume.height as f32),
                    0.0,
                    color,
                    weight,
                    f_life_b,
                );
            } else {
                splat(
                    volume,
                    texr * (volume.width as f32),
                    texg * (volume.height as f32),
                    fade_progress * (volume.depth as f32),
                    color,
                    weight,
                    1.0,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;

    fn flat_timing(width: u32, height: u32, r: u8, g: u8) -> TimingMap {
        TimingMap { width, height, pixels: vec![Rgba8::new(r, g, 0, 255); (width * height) as usize] }
    }

    #[test]
    fn skips_pixels_with_no_envelope() {
        let mut volume = GradientVolume::new(4, 4, 1);
        let timing = flat_timing(2, 2, 0, 0);
        let data = vec![255u8; 2 * 2 * 4];
        let frame = Frame::new(&data, 2, 2, 0);
        let metadata = Metadata { fade_in_duration: 0.3, fade_out_duration: 0.3 };
        accumulate_frame(&mut volume, &frame, &timing, &metadata, 0, 10);
        assert!(volume.cells.iter().all(|c| c.quality == 0.0));
    }

    #[test]
    fn active_pixel_deposits_some_quality_somewhere() {
        let mut volume = GradientVolume::new(8, 8, 1);
        let timing = flat_timing(2, 2, 255, 255);
        let data = vec![200u8, 100, 50, 255, 200, 100, 50, 255, 200, 100, 50, 255, 200, 100, 50, 255];
        let frame = Frame::new(&data, 2, 2, 5);
        let metadata = Metadata { fade_in_duration: 0.3, fade_out_duration: 0.3 };
        accumulate_frame(&mut volume, &frame, &timing, &metadata, 5, 10);
        assert!(volume.cells.iter().any(|c| c.quality > 0.0));
    }
}

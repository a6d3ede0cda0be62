//! Hole-Fill / Normalize (C10)
//!
//! After reverse-splat accumulation some cells in the gradient volume never
//! received a deposit (`weight == 0 ∨ quality == 0`). [`hole_fill`] gathers
//! into each such cell from the nearest shell of already-quality-bearing
//! cells (inverse-square weighted by Euclidean distance, growing the search
//! radius until one non-empty shell is found or `max_radius` is exhausted).
//! [`emit`] then normalizes every cell by its accumulated `quality` into a
//! final RGBA8 buffer, rescaling `quality` afterward so a second gradient
//! pass can read back a proper previous-pass estimate instead of a raw
//! accumulator.

use crate::color::{clamp_round_u8, Rgba8};
use crate::gradient::GradientVolume;

/// Expanding inverse-square gather into every empty cell of `volume`.
pub fn hole_fill(volume: &mut GradientVolume, max_radius: u32) {
    let (wg, hg, dg) = (volume.width as i64, volume.height as i64, volume.depth as i64);
    let stride_y = wg;
    let stride_z = wg * hg;
    let empty: Vec<usize> = volume
        .cells
        .iter()
        .enumerate()
        .filter(|(_, c)| c.weight == 0.0 || c.quality == 0.0)
        .map(|(i, _)| i)
        .collect();

    for idx in empty {
        let z0 = (idx as i64) / stride_z;
        let rem = (idx as i64) % stride_z;
        let y0 = rem / stride_y;
        let x0 = rem % stride_y;

        let mut r_sum = 0.0f32;
        let mut g_sum = 0.0f32;
        let mut b_sum = 0.0f32;
        let mut a_sum = 0.0f32;
        let mut sw = 0.0f32;

        'radius: for radius in 1..=max_radius as i64 {
            let mut found_any = false;
            for dz in -radius..=radius {
                let z = z0 + dz;
                if z < 0 || z >= dg {
                    continue;
                }
                for dy in -radius..=radius {
                    let y = y0 + dy;
                    if y < 0 || y >= hg {
                        continue;
                    }
                    for dx in -radius..=radius {
                        let x = x0 + dx;
                        if x < 0 || x >= wg {
                            continue;
                        }
                        // Only the outermost shell of this radius: anything
                        // closer was already a candidate in a prior loop.
                        if dx.abs() != radius && dy.abs() != radius && dz.abs() != radius {
                            continue;
                        }
                        let nidx = ((z * hg + y) * wg + x) as usize;
                        let cell = volume.cells[nidx];
                        if cell.quality <= 0.0 {
                            continue;
                        }
                        let dist_sq = (dx * dx + dy * dy + dz * dz) as f32;
                        let w = 1.0 / dist_sq.max(1.0);
                        r_sum += cell.r * w;
                        g_sum += cell.g * w;
                        b_sum += cell.b * w;
                        a_sum += cell.a * w;
                        sw += w * cell.weight;
                        found_any = true;
                    }
                }
            }
            if found_any {
                break 'radius;
            }
        }

        if sw > 0.0 {
            let cell = &mut volume.cells[idx];
            cell.r = r_sum / sw;
            cell.g = g_sum / sw;
            cell.b = b_sum / sw;
            cell.a = a_sum / sw;
            cell.weight = 1.0;
            cell.quality = 0.0; // filled-not-normalized marker, per the design note.
        }
    }
}

/// Normalize every cell into a final RGBA8 buffer; unfilled cells (no data,
/// no successful fill) become the magenta sentinel. Rescales `quality` for
/// a subsequent gradient pass to read.
pub fn emit(volume: &mut GradientVolume) -> Vec<Rgba8> {
    let mut out = Vec::with_capacity(volume.cells.len());
    for cell in &mut volume.cells {
        if cell.weight == 0.0 && cell.quality == 0.0 {
            out.push(Rgba8::MAGENTA_SENTINEL);
        } else if cell.quality == 0.0 {
            // filled-not-normalized: hole_fill already wrote the final color.
            out.push(Rgba8::new(
                clamp_round_u8(cell.r * 255.0),
                clamp_round_u8(cell.g * 255.0),
                clamp_round_u8(cell.b * 255.0),
                clamp_round_u8(cell.a * 255.0),
            ));
        } else {
            let inv = 1.0 / cell.quality;
            out.push(Rgba8::new(
                clamp_round_u8(cell.r * inv * 255.0),
                clamp_round_u8(cell.g * inv * 255.0),
                clamp_round_u8(cell.b * inv * 255.0),
                clamp_round_u8(cell.a * inv * 255.0),
            ));
        }
        if cell.weight > 0.0 {
            cell.quality /= cell.weight;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::GradientCell;

    #[test]
    fn fully_empty_volume_emits_all_sentinels() {
        let mut volume = GradientVolume::new(3, 3, 1);
        hole_fill(&mut volume, 8);
        let bytes = emit(&mut volume);
        assert!(bytes.iter().all(|&p| p == Rgba8::MAGENTA_SENTINEL));
    }

    #[test]
    fn hole_adjacent_to_data_gets_filled_not_sentinel() {
        let mut volume = GradientVolume::new(3, 3, 1);
        let center = volume.cells.len() / 2;
        volume.cells[center] = GradientCell { r: 1.0, g: 0.5, b: 0.0, a: 1.0, weight: 1.0, quality: 1.0 };
        hole_fill(&mut volume, 8);
        let bytes = emit(&mut volume);
        assert_ne!(bytes[0], Rgba8::MAGENTA_SENTINEL);
        assert_ne!(bytes[center], Rgba8::MAGENTA_SENTINEL);
    }
}

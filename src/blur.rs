//! Smart Blur (C6)
//!
//! Constraint-preserving iterative diffusion over a quantized `int16`
//! field (`-1` marks transparent, skipped entirely). Each pixel's implicit
//! constraint is the band `[input-1, input]` it was quantized from. A
//! red-black sweep (alternating checkerboard parity per half-iteration)
//! relaxes in place with no second buffer, Gauss-Seidel style: a cell
//! either snaps back to its own integer level when a neighbor sits one
//! level below it, holds if it is a strict local maximum among its filled
//! neighbors, or otherwise takes their average. Iteration stops once the
//! largest per-pixel change in a pass drops below a threshold (or the
//! iteration cap is hit), followed by three final "unclamped" sweeps —
//! plain neighbor averaging, no snap/hold rules — to soften the sharp
//! edges the snap rule leaves behind.

/// Result of a blur run.
#[derive(Debug, Clone)]
pub struct BlurResult {
    pub values: Vec<f32>,
    pub iterations: u32,
}

fn neighbors_3x3(x: i64, y: i64, w: i64, h: i64) -> impl Iterator<Item = (i64, i64)> {
    (-1..=1).flat_map(move |dy| {
        (-1..=1).filter_map(move |dx| {
            if dx == 0 && dy == 0 {
                return None;
            }
            let (nx, ny) = (x + dx, y + dy);
            (nx >= 0 && ny >= 0 && nx < w && ny < h).then_some((nx, ny))
        })
    })
}

/// Run the smart-blur relaxation on a quantized `(width, height)` field.
#[must_use]
pub fn smart_blur(src: &[i16], width: u32, height: u32, max_iterations: u32, convergence_threshold: f32) -> BlurResult {
    let w = width as i64;
    let h = height as i64;
    let n = src.len();
    let idx = |x: i64, y: i64| -> usize { (y * w + x) as usize };

    let mut output: Vec<f32> = src.iter().map(|&v| if v >= 0 { v as f32 } else { 0.0 }).collect();
    let mut iterations = 0u32;

    for iter in 0..max_iterations {
        iterations = iter + 1;
        let mut max_change = 0.0f32;

        for parity in 0..2 {
            for y in 0..h {
                for x in 0..w {
                    if (x + y) % 2 != parity {
                        continue;
                    }
                    let i = idx(x, y);
                    if src[i] < 0 {
                        continue;
                    }
                    let filled: Vec<(i16, f32)> = neighbors_3x3(x, y, w, h)
                        .filter_map(|(nx, ny)| {
                            let ni = idx(nx, ny);
                            (src[ni] >= 0).then_some((src[ni], output[ni]))
                        })
                        .collect();
                    if filled.is_empty() {
                        continue;
                    }

                    let old = output[i];
                    let own_level = src[i];
                    let new = if filled.iter().any(|&(v, _)| v == own_level - 1) {
                        own_level as f32
                    } else if filled.iter().all(|&(_, o)| old > o) {
                        old
                    } else {
                        filled.iter().map(|&(_, o)| o).sum::<f32>() / filled.len() as f32
                    };
                    output[i] = new;
                    max_change = max_change.max((new - old).abs());
                }
            }
        }

        if max_change < convergence_threshold {
            break;
        }
    }

    for _ in 0..3 {
        let snapshot = output.clone();
        for y in 0..h {
            for x in 0..w {
                let i = idx(x, y);
                if src[i] < 0 {
                    continue;
                }
                let filled: Vec<f32> = neighbors_3x3(x, y, w, h)
                    .filter_map(|(nx, ny)| {
                        let ni = idx(nx, ny);
                        (src[ni] >= 0).then_some(snapshot[ni])
                    })
                    .collect();
                if filled.is_empty() {
                    continue;
                }
                output[i] = filled.iter().sum::<f32>() / filled.len() as f32;
            }
        }
    }
    debug_assert_eq!(output.len(), n);

    BlurResult { values: output, iterations }
}

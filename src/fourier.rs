//! Fourier Clamp (C7)
//!
//! Low/high-pass filtering of a single `uint8` channel: bilinear-upsample
//! to the next power of two in each axis (tracking which destination
//! pixels came from an exact integer-valued source versus were genuinely
//! interpolated), forward 2D FFT (decimation-in-time Cooley-Tukey,
//! row-then-column), apply a 4th-order Butterworth radial filter, inverse
//! FFT, clamp to `[0, 1]`.

use std::f32::consts::PI;
use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, Default)]
struct Complex {
    re: f32,
    im: f32,
}

impl Add for Complex {
    type Output = Complex;
    fn add(self, rhs: Complex) -> Complex {
        Complex { re: self.re + rhs.re, im: self.im + rhs.im }
    }
}
impl Sub for Complex {
    type Output = Complex;
    fn sub(self, rhs: Complex) -> Complex {
        Complex { re: self.re - rhs.re, im: self.im - rhs.im }
    }
}
impl Mul for Complex {
    type Output = Complex;
    fn mul(self, rhs: Complex) -> Complex {
        Complex { re: self.re * rhs.re - self.im * rhs.im, im: self.re * rhs.im + self.im * rhs.re }
    }
}

fn reverse_bits(mut x: usize, bits: u32) -> usize {
    let mut r = 0usize;
    for _ in 0..bits {
        r = (r << 1) | (x & 1);
        x >>= 1;
    }
    r
}

fn fft_1d(a: &mut [Complex], invert: bool) {
    let n = a.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two(), "FFT length must be a power of two");
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = reverse_bits(i, bits);
        if j > i {
            a.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let ang = (if invert { 1.0 } else { -1.0 }) * 2.0 * PI / len as f32;
        let wlen = Complex { re: ang.cos(), im: ang.sin() };
        let mut i = 0;
        while i < n {
            let mut w = Complex { re: 1.0, im: 0.0 };
            for j in 0..len / 2 {
                let u = a[i + j];
                let v = a[i + j + len / 2] * w;
                a[i + j] = u + v;
                a[i + j + len / 2] = u - v;
                w = w * wlen;
            }
            i += len;
        }
        len <<= 1;
    }

    if invert {
        for c in a.iter_mut() {
            c.re /= n as f32;
            c.im /= n as f32;
        }
    }
}

fn fft_2d(data: &mut [Complex], width: u32, height: u32, invert: bool) {
    let (w, h) = (width as usize, height as usize);
    for row in 0..h {
        fft_1d(&mut data[row * w..row * w + w], invert);
    }
    let mut column = vec![Complex::default(); h];
    for col in 0..w {
        for (row, slot) in column.iter_mut().enumerate() {
            *slot = data[row * w + col];
        }
        fft_1d(&mut column, invert);
        for (row, &value) in column.iter().enumerate() {
            data[row * w + col] = value;
        }
    }
}

fn map_coord(d: u32, new_n: u32, old_n: u32) -> f32 {
    if new_n <= 1 || old_n <= 1 {
        0.0
    } else {
        d as f32 * (old_n as f32 - 1.0) / (new_n as f32 - 1.0)
    }
}

fn sample_bilinear(channel: &[u8], width: u32, height: u32, sx: f32, sy: f32) -> (u8, bool) {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let (fx, fy) = (sx - x0, sy - y0);
    let exact = fx.abs() < 1e-5 && fy.abs() < 1e-5;

    let w = i64::from(width);
    let h = i64::from(height);
    let clamp_i = |v: i64, max: i64| v.clamp(0, max - 1);
    let (x0c, y0c) = (clamp_i(x0 as i64, w), clamp_i(y0 as i64, h));
    let (x1c, y1c) = (clamp_i(x0 as i64 + 1, w), clamp_i(y0 as i64 + 1, h));
    let get = |x: i64, y: i64| f32::from(channel[(y * w + x) as usize]);

    let top = get(x0c, y0c) * (1.0 - fx) + get(x1c, y0c) * fx;
    let bot = get(x0c, y1c) * (1.0 - fx) + get(x1c, y1c) * fx;
    let val = top * (1.0 - fy) + bot * fy;
    (val.round().clamp(0.0, 255.0) as u8, !exact)
}

/// Bilinear-upsample `channel` to the next power of two in each axis.
///
/// Returns `(resized, interpolated_mask, new_width, new_height)`; the mask
/// is `255` where the destination pixel didn't map exactly onto one source
/// pixel, `0` where it did.
#[must_use]
pub fn resize_pow2(channel: &[u8], width: u32, height: u32) -> (Vec<u8>, Vec<u8>, u32, u32) {
    let new_w = width.max(1).next_power_of_two();
    let new_h = height.max(1).next_power_of_two();
    let mut out = vec![0u8; (new_w * new_h) as usize];
    let mut interpolated = vec![0u8; (new_w * new_h) as usize];
    for dy in 0..new_h {
        let sy = map_coord(dy, new_h, height);
        for dx in 0..new_w {
            let sx = map_coord(dx, new_w, width);
            let (val, interp) = sample_bilinear(channel, width, height, sx, sy);
            let i = (dy * new_w + dx) as usize;
            out[i] = val;
            interpolated[i] = u8::from(interp) * 255;
        }
    }
    (out, interpolated, new_w, new_h)
}

fn butterworth(width: u32, height: u32, cutoff_ratio: f32, highpass: bool) -> Vec<f32> {
    let cx = (width as f32 * cutoff_ratio / 2.0).max(1e-3);
    let cy = (height as f32 * cutoff_ratio / 2.0).max(1e-3);
    let mut out = vec![0.0f32; (width * height) as usize];
    for y in 0..height {
        let fy = if y <= height / 2 { y } else { height - y } as f32;
        for x in 0..width {
            let fx = if x <= width / 2 { x } else { width - x } as f32;
            let radial = (fx / cx).powi(2) + (fy / cy).powi(2);
            let mut v = 1.0 / (1.0 + radial.powi(2));
            if highpass {
                v = 1.0 - v;
            }
            out[(y * width + x) as usize] = v;
        }
    }
    out
}

/// Result of a Fourier clamp pass. Dimensions are the power-of-two size the
/// channel was resized to.
#[derive(Debug, Clone)]
pub struct FourierResult {
    pub width: u32,
    pub height: u32,
    pub channel: Vec<u8>,
    pub interpolated: Vec<u8>,
}

/// Low/high-pass a `uint8` channel through a Butterworth-shaped radial
/// filter in the frequency domain. `highpass` inverts the filter and
/// amplifies the inverse transform ninefold, matching the asymmetric
/// dynamic range of an edge-detail pass.
#[must_use]
pub fn fourier_clamp(channel: &[u8], width: u32, height: u32, cutoff_ratio: f32, highpass: bool) -> FourierResult {
    let (resized, interpolated, new_w, new_h) = resize_pow2(channel, width, height);
    let mut buffer: Vec<Complex> = resized.iter().map(|&v| Complex { re: f32::from(v) / 255.0, im: 0.0 }).collect();

    fft_2d(&mut buffer, new_w, new_h, false);

    let filter = butterworth(new_w, new_h, cutoff_ratio, highpass);
    for (c, &f) in buffer.iter_mut().zip(filter.iter()) {
        c.re *= f;
        c.im *= f;
    }

    fft_2d(&mut buffer, new_w, new_h, true);

    let amplify = if highpass { 9.0 } else { 1.0 };
    let out: Vec<u8> = buffer
        .iter()
        .map(|c| ((c.re * amplify).clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();

    FourierResult { width: new_w, height: new_h, channel: out, interpolated }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_pow2_tracks_interpolated_pixels() {
        let channel = [10u8, 20, 30, 40];
        let (resized, interp, w, h) = resize_pow2(&channel, 2, 2);
        assert_eq!((w, h), (2, 2));
        assert_eq!(resized, channel);
        assert!(interp.iter().all(|&v| v == 0), "exact 2x2 -> 2x2 map has no interpolation");
    }

    #[test]
    fn round_trip_without_filtering_preserves_values() {
        let width = 4u32;
        let height = 4u32;
        let mut buffer: Vec<Complex> =
            (0..width * height).map(|i| Complex { re: (i % 7) as f32 / 10.0, im: 0.0 }).collect();
        let original: Vec<f32> = buffer.iter().map(|c| c.re).collect();
        fft_2d(&mut buffer, width, height, false);
        fft_2d(&mut buffer, width, height, true);
        for (c, &orig) in buffer.iter().zip(original.iter()) {
            assert!((c.re - orig).abs() < 1e-4, "{} vs {orig}", c.re);
            assert!(c.im.abs() < 1e-4);
        }
    }

    #[test]
    fn lowpass_filter_blurs_a_checkerboard() {
        let width = 8u32;
        let height = 8u32;
        let channel: Vec<u8> = (0..width * height)
            .map(|i| if (i % width + i / width) % 2 == 0 { 255 } else { 0 })
            .collect();
        let result = fourier_clamp(&channel, width, height, 0.3, false);
        let variance_in: f64 = {
            let mean = channel.iter().map(|&v| f64::from(v)).sum::<f64>() / channel.len() as f64;
            channel.iter().map(|&v| (f64::from(v) - mean).powi(2)).sum::<f64>() / channel.len() as f64
        };
        let variance_out: f64 = {
            let mean = result.channel.iter().map(|&v| f64::from(v)).sum::<f64>() / result.channel.len() as f64;
            result.channel.iter().map(|&v| (f64::from(v) - mean).powi(2)).sum::<f64>() / result.channel.len() as f64
        };
        assert!(variance_out < variance_in, "low-pass should reduce high-frequency checkerboard variance");
    }
}

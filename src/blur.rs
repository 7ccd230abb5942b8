//! Separable Gaussian blur over premultiplied RGBA8, used for text shadows.
//!
//! The kernel is quantized to Q16 fixed point so a given `(radius, sigma)`
//! pair blurs to the same bytes on every platform. Sampling clamps to the
//! tile edge.

use crate::foundation::error::{UnderlayError, UnderlayResult};

/// Blur a premultiplied RGBA8 buffer, returning the blurred copy.
///
/// `radius` of zero returns the input unchanged.
pub fn gaussian_blur_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> UnderlayResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| UnderlayError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(UnderlayError::render(
            "gaussian_blur_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    convolve_pass(src, &mut tmp, width, height, &kernel, Axis::X);
    convolve_pass(&tmp, &mut out, width, height, &kernel, Axis::Y);
    Ok(out)
}

/// Normalized Gaussian weights in Q16 fixed point, `2 * radius + 1` taps.
///
/// Weights sum to exactly 65536; any rounding residue is folded into the
/// center tap.
fn gaussian_kernel_q16(radius: u32, sigma: f32) -> UnderlayResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(UnderlayError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(UnderlayError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let mid_val = i64::from(weights[mid]);
        weights[mid] = (mid_val + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn convolve_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let idx = match axis {
                    Axis::X => {
                        let sx = (x + d).clamp(0, w - 1);
                        ((y * w + sx) as usize) * 4
                    }
                    Axis::Y => {
                        let sy = (y + d).clamp(0, h - 1);
                        ((sy * w + x) as usize) * 4
                    }
                };
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

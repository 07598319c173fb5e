// src/preprocessing.rs

use crate::types::{Frame, NormalizedFrame};

/// Normalize a raw RGB frame into the classifier's canonical format.
///
/// Steps, in order:
/// 1. Convert RGB to YUV so luminance is separable from chrominance
/// 2. Histogram-equalize the luminance channel (reduces lighting-variance
///    false signals)
/// 3. Convert back to RGB
/// 4. Bilinear resize to the target resolution
/// 5. Rescale 8-bit values to f32 in [0,1]
///
/// Every step is deterministic: the same raw frame always yields
/// bit-identical output. Malformed frames (wrong channel count) are a
/// caller contract violation checked at the pipeline boundary.
pub fn normalize(frame: &Frame, target_width: usize, target_height: usize) -> NormalizedFrame {
    let equalized = equalize_luminance(&frame.data, frame.width, frame.height);
    let resized = resize_bilinear(
        &equalized,
        frame.width,
        frame.height,
        target_width,
        target_height,
    );

    let data: Vec<f32> = resized.iter().map(|&v| v as f32 / 255.0).collect();

    NormalizedFrame {
        data,
        width: target_width,
        height: target_height,
    }
}

/// Histogram-equalize the Y channel of an RGB image, leaving chrominance
/// untouched. Works on BT.601 integer YUV.
fn equalize_luminance(src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let pixels = width * height;
    let mut luma = vec![0u8; pixels];
    let mut cb = vec![0i16; pixels];
    let mut cr = vec![0i16; pixels];

    for i in 0..pixels {
        let r = src[i * 3] as f32;
        let g = src[i * 3 + 1] as f32;
        let b = src[i * 3 + 2] as f32;

        let y = 0.299 * r + 0.587 * g + 0.114 * b;
        let u = -0.169 * r - 0.331 * g + 0.5 * b;
        let v = 0.5 * r - 0.419 * g - 0.081 * b;

        luma[i] = y.round().clamp(0.0, 255.0) as u8;
        cb[i] = u.round() as i16;
        cr[i] = v.round() as i16;
    }

    equalize_channel(&mut luma);

    let mut out = vec![0u8; pixels * 3];
    for i in 0..pixels {
        let y = luma[i] as f32;
        let u = cb[i] as f32;
        let v = cr[i] as f32;

        let r = y + 1.402 * v;
        let g = y - 0.344 * u - 0.714 * v;
        let b = y + 1.772 * u;

        out[i * 3] = r.round().clamp(0.0, 255.0) as u8;
        out[i * 3 + 1] = g.round().clamp(0.0, 255.0) as u8;
        out[i * 3 + 2] = b.round().clamp(0.0, 255.0) as u8;
    }

    out
}

/// Standard 256-bin CDF histogram equalization, in place.
fn equalize_channel(channel: &mut [u8]) {
    let mut histogram = [0u32; 256];
    for &v in channel.iter() {
        histogram[v as usize] += 1;
    }

    let mut cdf = [0u32; 256];
    let mut running = 0u32;
    for (bin, &count) in histogram.iter().enumerate() {
        running += count;
        cdf[bin] = running;
    }

    let total = channel.len() as u32;
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);

    // A single-intensity channel has nothing to equalize
    if total == cdf_min {
        return;
    }

    let mut lut = [0u8; 256];
    for bin in 0..256 {
        let scaled =
            (cdf[bin].saturating_sub(cdf_min)) as f64 * 255.0 / (total - cdf_min) as f64;
        lut[bin] = scaled.round() as u8;
    }

    for v in channel.iter_mut() {
        *v = lut[*v as usize];
    }
}

/// Bilinear image resize
fn resize_bilinear(src: &[u8], src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Vec<u8> {
    let mut dst = vec![0u8; dst_h * dst_w * 3];

    let x_ratio = src_w as f32 / dst_w as f32;
    let y_ratio = src_h as f32 / dst_h as f32;

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx as f32 * x_ratio;
            let sy = dy as f32 * y_ratio;

            let sx0 = sx.floor() as usize;
            let sy0 = sy.floor() as usize;
            let sx1 = (sx0 + 1).min(src_w - 1);
            let sy1 = (sy0 + 1).min(src_h - 1);

            let fx = sx - sx0 as f32;
            let fy = sy - sy0 as f32;

            for c in 0..3 {
                let p00 = src[(sy0 * src_w + sx0) * 3 + c] as f32;
                let p10 = src[(sy0 * src_w + sx1) * 3 + c] as f32;
                let p01 = src[(sy1 * src_w + sx0) * 3 + c] as f32;
                let p11 = src[(sy1 * src_w + sx1) * 3 + c] as f32;

                let val = p00 * (1.0 - fx) * (1.0 - fy)
                    + p10 * fx * (1.0 - fy)
                    + p01 * (1.0 - fx) * fy
                    + p11 * fx * fy;

                dst[(dy * dst_w + dx) * 3 + c] = val.round() as u8;
            }
        }
    }

    dst
}

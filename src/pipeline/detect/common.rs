use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;
use ort::value::DynValue;
use rayon::prelude::*;

use crate::types::{Frame, Landmark};

/// How a frame was scaled and padded into a square model input.
#[derive(Clone, Debug)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl Letterbox {
    /// Maps a point in model input pixels back to frame pixels.
    pub fn unproject(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Rotated square crop of a frame, used for the hand landmark model.
#[derive(Clone, Debug)]
pub struct CropTransform {
    pub center: (f32, f32),
    pub side: f32,
    pub angle: f32,
    pub output_size: u32,
}

impl CropTransform {
    /// Maps a point in crop pixels back to frame pixels.
    pub fn unproject(&self, x: f32, y: f32) -> (f32, f32) {
        let half = self.output_size as f32 / 2.0;
        let scale = self.side / self.output_size as f32;
        let dx = (x - half) * scale;
        let dy = (y - half) * scale;
        let (sin, cos) = self.angle.sin_cos();
        (
            self.center.0 + dx * cos - dy * sin,
            self.center.1 + dx * sin + dy * cos,
        )
    }

    pub fn pixel_scale(&self) -> f32 {
        self.side / self.output_size as f32
    }
}

fn check_frame(frame: &Frame) -> Result<()> {
    let expected_len = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.rgba.len() != expected_len || expected_len == 0 {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgba.len(),
            expected_len
        ));
    }
    Ok(())
}

/// Resizes the frame to fit a `target_size` square, pads the rest with black
/// and returns an NHWC tensor with channels in [0, 1].
pub fn letterbox_tensor(frame: &Frame, target_size: u32) -> Result<(Array4<f32>, Letterbox)> {
    check_frame(frame)?;

    let scale = target_size as f32 / (frame.width.max(frame.height) as f32);
    let new_w = ((frame.width as f32 * scale).round() as u32).clamp(1, target_size);
    let new_h = ((frame.height as f32 * scale).round() as u32).clamp(1, target_size);

    let src_image = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgba.clone(),
        fir::PixelType::U8x4,
    )?;
    let mut dst_image = fir::images::Image::new(new_w, new_h, fir::PixelType::U8x4);
    let resize_options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    fir::Resizer::new()
        .resize(&src_image, &mut dst_image, Some(&resize_options))
        .context("fast resize failed")?;
    let resized = dst_image.into_vec();

    let side = target_size as usize;
    let pad_x = (side - new_w as usize) / 2;
    let pad_y = (side - new_h as usize) / 2;
    let mut tensor = Array4::<f32>::zeros((1, side, side, 3));
    let src_stride = new_w as usize * 4;

    for (row, src_row) in resized.chunks_exact(src_stride).enumerate() {
        for (col, px) in src_row.chunks_exact(4).enumerate() {
            for channel in 0..3 {
                tensor[[0, pad_y + row, pad_x + col, channel]] = px[channel] as f32 / 255.0;
            }
        }
    }

    let letterbox = Letterbox {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        orig_w: frame.width,
        orig_h: frame.height,
    };

    Ok((tensor, letterbox))
}

/// Samples a rotated square region of the frame into an NHWC tensor.
pub fn rotated_crop_tensor(
    frame: &Frame,
    center: (f32, f32),
    side: f32,
    angle: f32,
    output_size: u32,
) -> Result<(Array4<f32>, CropTransform)> {
    check_frame(frame)?;

    let transform = CropTransform {
        center,
        side,
        angle,
        output_size,
    };
    let size = output_size as usize;

    let data: Vec<f32> = (0..size * size)
        .into_par_iter()
        .flat_map_iter(|i| {
            let (x, y) = ((i % size) as f32 + 0.5, (i / size) as f32 + 0.5);
            let (src_x, src_y) = transform.unproject(x, y);
            sample_rgb(frame, src_x, src_y)
        })
        .collect();

    let array = Array4::<f32>::from_shape_vec((1, size, size, 3), data)
        .map_err(|err| anyhow!("failed to build rotated crop tensor: {err}"))?;

    Ok((array, transform))
}

/// Converts a frame-pixel point into a normalized landmark.
pub fn normalized_landmark(
    (x, y): (f32, f32),
    z: f32,
    visibility: f32,
    width: u32,
    height: u32,
) -> Landmark {
    Landmark::new(
        (x / width.max(1) as f32).clamp(0.0, 1.0),
        (y / height.max(1) as f32).clamp(0.0, 1.0),
        z / width.max(1) as f32,
        visibility.clamp(0.0, 1.0),
    )
}

pub fn flat_output(value: &DynValue) -> Result<Vec<f32>> {
    Ok(value.try_extract_array::<f32>()?.iter().copied().collect())
}

pub fn first_scalar(value: &DynValue) -> Result<f32> {
    Ok(value
        .try_extract_array::<f32>()?
        .iter()
        .next()
        .copied()
        .unwrap_or(0.0))
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn sample_rgb(frame: &Frame, x: f32, y: f32) -> [f32; 3] {
    if x.is_nan() || y.is_nan() {
        return [0.0; 3];
    }
    // Pixel centers sit at +0.5.
    let (x, y) = (x - 0.5, y - 0.5);
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);

    let (w, h) = (frame.width as i64, frame.height as i64);
    let fetch = |cx: f32, cy: f32| -> [f32; 3] {
        let (ix, iy) = (cx as i64, cy as i64);
        if ix < 0 || iy < 0 || ix >= w || iy >= h {
            return [0.0; 3];
        }
        let idx = ((iy * w + ix) as usize) * 4;
        [
            frame.rgba[idx] as f32 / 255.0,
            frame.rgba[idx + 1] as f32 / 255.0,
            frame.rgba[idx + 2] as f32 / 255.0,
        ]
    };

    let c00 = fetch(x0, y0);
    let c10 = fetch(x0 + 1.0, y0);
    let c01 = fetch(x0, y0 + 1.0);
    let c11 = fetch(x0 + 1.0, y0 + 1.0);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    std::array::from_fn(|c| lerp(lerp(c00[c], c10[c], fx), lerp(c01[c], c11[c], fx), fy))
}

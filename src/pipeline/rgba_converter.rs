use anyhow::{Result, anyhow};
use nokhwa::{Buffer, utils::FrameFormat};
use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

use crate::types::Frame;

/// Turns a native camera buffer into an RGBA frame.
pub fn decode_buffer(buffer: &Buffer) -> Result<Frame> {
    let resolution = buffer.resolution();
    let (width, height) = (resolution.width_x, resolution.height_y);
    let rgba = to_rgba(buffer.source_frame_format(), buffer.buffer(), width, height)?;
    Ok(Frame::new(rgba, width, height))
}

pub fn to_rgba(format: FrameFormat, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let pixels = width as usize * height as usize;
    match format {
        FrameFormat::NV12 => {
            ensure_len("NV12", data, pixels + pixels / 2)?;
            nv12_to_rgba(data, width, height)
        }
        FrameFormat::YUYV => {
            ensure_len("YUYV", data, pixels * 2)?;
            yuyv_to_rgba(data, width, height)
        }
        FrameFormat::MJPEG => mjpeg_to_rgba(data, pixels),
        FrameFormat::RAWRGB => {
            ensure_len("RGB", data, pixels * 3)?;
            Ok(packed_to_rgba(data, pixels, ChannelOrder::Rgb))
        }
        FrameFormat::RAWBGR => {
            ensure_len("BGR", data, pixels * 3)?;
            Ok(packed_to_rgba(data, pixels, ChannelOrder::Bgr))
        }
        FrameFormat::GRAY => {
            ensure_len("GRAY", data, pixels)?;
            Ok(packed_to_rgba(data, pixels, ChannelOrder::Gray))
        }
    }
}

fn ensure_len(label: &str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(anyhow!(
            "{label} buffer too small: got {}, expected {expected}",
            data.len()
        ));
    }
    Ok(())
}

fn nv12_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let y_len = width as usize * height as usize;
    let image = YuvBiPlanarImage {
        y_plane: &data[..y_len],
        y_stride: width,
        uv_plane: &data[y_len..y_len + y_len / 2],
        uv_stride: width,
        width,
        height,
    };

    let mut rgba = vec![0u8; y_len * 4];
    yuv_nv12_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV12 to RGBA failed: {err:?}"))?;
    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    let mut rgba = vec![0u8; width as usize * height as usize * 4];
    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV422 to RGBA failed: {err:?}"))?;
    Ok(rgba)
}

fn mjpeg_to_rgba(data: &[u8], pixels: usize) -> Result<Vec<u8>> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

    // Some drivers report a resolution that differs from the encoded image.
    if rgba.len() != pixels * 4 {
        return Err(anyhow!(
            "MJPEG frame has {} bytes, camera resolution needs {}",
            rgba.len(),
            pixels * 4
        ));
    }
    Ok(rgba)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChannelOrder {
    Rgb,
    Bgr,
    Gray,
}

fn packed_to_rgba(data: &[u8], pixels: usize, order: ChannelOrder) -> Vec<u8> {
    let stride = if order == ChannelOrder::Gray { 1 } else { 3 };
    let mut rgba = vec![0u8; pixels * 4];
    rgba.par_chunks_mut(4)
        .zip(data[..pixels * stride].par_chunks_exact(stride))
        .for_each(|(dst, src)| {
            let [r, g, b] = match order {
                ChannelOrder::Rgb => [src[0], src[1], src[2]],
                ChannelOrder::Bgr => [src[2], src[1], src[0]],
                ChannelOrder::Gray => [src[0], src[0], src[0]],
            };
            dst.copy_from_slice(&[r, g, b, 255]);
        });
    rgba
}

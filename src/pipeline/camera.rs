use anyhow::{Context, Result, anyhow};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution,
    },
};

use super::{overlay_loop::FrameSource, rgba_converter};
use crate::{config::CameraConfig, types::Frame};

// Prefer pixel formats that are widely supported on macOS (the built-in cameras
// often reject YUYV even though Nokhwa reports it).
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::RAWRGB,
    FrameFormat::RAWBGR,
    FrameFormat::GRAY,
    FrameFormat::YUYV,
    FrameFormat::NV12,
    FrameFormat::MJPEG,
];

fn requested_formats(config: &CameraConfig) -> [RequestedFormat<'static>; 4] {
    let wanted = |format| {
        CameraFormat::new(
            Resolution::new(config.width, config.height),
            format,
            config.fps,
        )
    };
    [
        RequestedFormat::with_formats(
            RequestedFormatType::Closest(wanted(FrameFormat::MJPEG)),
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::with_formats(
            RequestedFormatType::Closest(wanted(FrameFormat::YUYV)),
            PREFERRED_PIXEL_FORMATS,
        ),
        // Any format Nokhwa can decode, still favouring a usable frame rate.
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

#[derive(Clone, Debug)]
pub struct CameraDevice {
    pub index: CameraIndex,
    pub label: String,
}

pub fn available_cameras() -> Result<Vec<CameraDevice>> {
    let cameras = query(ApiBackend::Auto)?;
    Ok(cameras
        .into_iter()
        .map(|info| CameraDevice {
            index: info.index().clone(),
            label: info.human_name(),
        })
        .collect())
}

/// Exclusively owned camera stream. The stream is stopped when the handle is
/// dropped, on every exit path of the overlay loop.
pub struct CameraHandle {
    camera: Camera,
    label: String,
}

impl CameraHandle {
    pub fn open(config: &CameraConfig) -> Result<Self> {
        let index = CameraIndex::Index(config.index);
        let mut last_err = None;

        for requested in requested_formats(config) {
            match Camera::new(index.clone(), requested) {
                Ok(mut camera) => match camera.open_stream() {
                    Ok(()) => {
                        let label = camera.info().human_name();
                        let handle = Self { camera, label };
                        log::info!(
                            "camera {} opened: {} at {}x{} @ {} fps (requested {}x{} @ {})",
                            config.index,
                            handle.label,
                            handle.resolution().0,
                            handle.resolution().1,
                            handle.camera.frame_rate(),
                            config.width,
                            config.height,
                            config.fps
                        );
                        return Ok(handle);
                    }
                    Err(err) => last_err = Some(anyhow::Error::from(err)),
                },
                Err(err) => last_err = Some(anyhow::Error::from(err)),
            }
        }

        let err = last_err.unwrap_or_else(|| anyhow!("no supported format"));
        Err(err).with_context(|| format!("failed to open camera with index {}", config.index))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn resolution(&self) -> (u32, u32) {
        let resolution = self.camera.resolution();
        (resolution.width_x, resolution.height_y)
    }
}

impl FrameSource for CameraHandle {
    fn next_frame(&mut self) -> Result<Frame> {
        let buffer = self.camera.frame().context("camera frame read failed")?;
        rgba_converter::decode_buffer(&buffer).context("failed to decode camera frame")
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        match self.camera.stop_stream() {
            Ok(()) => log::info!("camera released: {}", self.label),
            Err(err) => log::warn!("failed to stop camera stream {}: {err:?}", self.label),
        }
    }
}

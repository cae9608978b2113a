use std::{fs, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use image::RgbaImage;

use crate::types::Frame;

/// Writes composed frames as PNG files into one directory.
#[derive(Clone, Debug)]
pub struct ScreenshotWriter {
    dir: PathBuf,
}

impl ScreenshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create screenshot dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn save(&self, frame: &Frame) -> Result<PathBuf> {
        let image = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
            .ok_or_else(|| {
                anyhow!(
                    "frame buffer does not match {}x{}",
                    frame.width,
                    frame.height
                )
            })?;

        let path = self.next_path();
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write screenshot {}", path.display()))?;
        Ok(path)
    }

    fn next_path(&self) -> PathBuf {
        let stem = format!("screenshot_{}", Local::now().format("%Y%m%d_%H%M%S_%3f"));
        let mut path = self.dir.join(format!("{stem}.png"));
        let mut suffix = 1;
        while path.exists() {
            path = self.dir.join(format!("{stem}_{suffix}.png"));
            suffix += 1;
        }
        path
    }
}

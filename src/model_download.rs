use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    PalmDetector,
    HandLandmarks,
    PoseLandmarks { complexity: u8 },
}

const PALM_DETECTOR_MODEL_FILENAME: &str = "palm_detection_mediapipe_2023feb.onnx";
const PALM_DETECTOR_MODEL_URL: &str = "https://raw.githubusercontent.com/214zzl995/gesture-universe/refs/heads/main/models/palm_detection_mediapipe_2023feb.onnx";
const HAND_LANDMARKS_MODEL_FILENAME: &str = "handpose_estimation_mediapipe_2023feb.onnx";
const HAND_LANDMARKS_MODEL_URL: &str = "https://raw.githubusercontent.com/214zzl995/gesture-universe/refs/heads/main/models/handpose_estimation_mediapipe_2023feb.onnx";
const POSE_LITE_MODEL_FILENAME: &str = "pose_landmark_lite.onnx";
const POSE_FULL_MODEL_FILENAME: &str = "pose_estimation_mediapipe_2023mar.onnx";
const POSE_FULL_MODEL_URL: &str = "https://github.com/opencv/opencv_zoo/raw/main/models/pose_estimation_mediapipe/pose_estimation_mediapipe_2023mar.onnx";
const POSE_HEAVY_MODEL_FILENAME: &str = "pose_landmark_heavy.onnx";

impl ModelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::PalmDetector => "palm detector",
            ModelKind::HandLandmarks => "hand landmarks",
            ModelKind::PoseLandmarks { complexity: 0 } => "pose landmarks (lite)",
            ModelKind::PoseLandmarks { complexity: 2 } => "pose landmarks (heavy)",
            ModelKind::PoseLandmarks { .. } => "pose landmarks (full)",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ModelKind::PalmDetector => PALM_DETECTOR_MODEL_FILENAME,
            ModelKind::HandLandmarks => HAND_LANDMARKS_MODEL_FILENAME,
            ModelKind::PoseLandmarks { complexity: 0 } => POSE_LITE_MODEL_FILENAME,
            ModelKind::PoseLandmarks { complexity: 2 } => POSE_HEAVY_MODEL_FILENAME,
            ModelKind::PoseLandmarks { .. } => POSE_FULL_MODEL_FILENAME,
        }
    }

    /// Lite and heavy pose models have no public ONNX mirror and must be
    /// placed in the models directory by hand.
    pub fn download_url(&self) -> Option<&'static str> {
        match self {
            ModelKind::PalmDetector => Some(PALM_DETECTOR_MODEL_URL),
            ModelKind::HandLandmarks => Some(HAND_LANDMARKS_MODEL_URL),
            ModelKind::PoseLandmarks { complexity: 0 | 2 } => None,
            ModelKind::PoseLandmarks { .. } => Some(POSE_FULL_MODEL_URL),
        }
    }

    pub fn path_in(&self, models_dir: &Path) -> PathBuf {
        models_dir.join(self.file_name())
    }
}

#[derive(Clone, Debug)]
pub struct ModelPaths {
    pub palm_detector: PathBuf,
    pub hand_landmarks: PathBuf,
    pub pose_landmarks: PathBuf,
}

impl ModelPaths {
    pub fn resolve(models_dir: &Path, pose_complexity: u8) -> Self {
        Self {
            palm_detector: ModelKind::PalmDetector.path_in(models_dir),
            hand_landmarks: ModelKind::HandLandmarks.path_in(models_dir),
            pose_landmarks: ModelKind::PoseLandmarks {
                complexity: pose_complexity,
            }
            .path_in(models_dir),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ModelDownloadEvent {
    AlreadyPresent {
        model: ModelKind,
    },
    Started {
        model: ModelKind,
        total: Option<u64>,
    },
    Progress {
        model: ModelKind,
        downloaded: u64,
        total: Option<u64>,
    },
    Finished {
        model: ModelKind,
    },
}

/// Makes sure every model the overlay needs is on disk, downloading the
/// missing ones with a terminal progress bar.
pub fn ensure_models_ready(models_dir: &Path, pose_complexity: u8) -> anyhow::Result<ModelPaths> {
    let kinds = [
        ModelKind::PalmDetector,
        ModelKind::HandLandmarks,
        ModelKind::PoseLandmarks {
            complexity: pose_complexity,
        },
    ];

    for kind in kinds {
        let path = kind.path_in(models_dir);
        let mut progress: Option<ProgressBar> = None;
        ensure_model_ready(kind, &path, |event| match &event {
            ModelDownloadEvent::Started { total, .. } => {
                progress = Some(create_progress_bar(*total));
            }
            ModelDownloadEvent::Progress { downloaded, .. } => {
                if let Some(pb) = progress.as_ref() {
                    pb.set_position(*downloaded);
                }
            }
            ModelDownloadEvent::Finished { model } => {
                if let Some(pb) = progress.take() {
                    pb.finish_with_message(format!("{} model ready", model.label()));
                }
            }
            ModelDownloadEvent::AlreadyPresent { model } => {
                log::debug!("{} model present at {}", model.label(), path.display());
            }
        })?;
    }

    Ok(ModelPaths::resolve(models_dir, pose_complexity))
}

pub fn ensure_model_ready<F>(kind: ModelKind, model_path: &Path, mut on_event: F) -> anyhow::Result<()>
where
    F: FnMut(ModelDownloadEvent),
{
    if model_path.exists() {
        on_event(ModelDownloadEvent::AlreadyPresent { model: kind });
        return Ok(());
    }

    let Some(url) = kind.download_url() else {
        return Err(anyhow!(
            "{} model not found at {}; reinstall the model files into that directory",
            kind.label(),
            model_path.display()
        ));
    };

    if let Some(parent) = model_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create model directory {}", parent.display()))?;
    }

    download_to_path(kind, url, model_path, &mut on_event).with_context(|| {
        format!(
            "failed to download {} model to {}; check the network or reinstall the model files",
            kind.label(),
            model_path.display()
        )
    })
}

fn download_to_path<F>(
    model: ModelKind,
    url: &str,
    dest: &Path,
    on_event: &mut F,
) -> anyhow::Result<()>
where
    F: FnMut(ModelDownloadEvent),
{
    log::info!(
        "downloading {} model from {url} to {}",
        model.label(),
        dest.display()
    );

    let client = Client::new();
    let mut response = client
        .get(url)
        .send()
        .context("failed to start model download")?
        .error_for_status()
        .context("model download returned error status")?;

    let total_size = response.content_length();
    on_event(ModelDownloadEvent::Started {
        model,
        total: total_size,
    });

    let tmp_path = dest.with_extension("download");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .context("failed while reading model bytes")?;
        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .context("failed while writing model to disk")?;
        downloaded += bytes_read as u64;
        on_event(ModelDownloadEvent::Progress {
            model,
            downloaded,
            total: total_size,
        });
    }

    file.sync_all()
        .context("failed to flush downloaded model to disk")?;
    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to move temp model {} into place at {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    on_event(ModelDownloadEvent::Finished { model });
    Ok(())
}

fn create_progress_bar(total_size: Option<u64>) -> ProgressBar {
    match total_size {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            ) {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.green} downloading model") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
    }
}

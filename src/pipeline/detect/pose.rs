use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{
    PoseEstimator,
    common::{self, Letterbox},
    smoothing::LandmarkSmoother,
};
use crate::{
    config::PoseConfig,
    types::{Frame, POSE_LANDMARK_COUNT, Pose},
};

pub const POSE_INPUT_SIZE: u32 = 256;
// x, y, z, visibility, presence for each of the 39 model points; the last six
// are auxiliary ROI points that are not part of the body pose.
const VALUES_PER_POINT: usize = 5;

/// 33-point body pose estimator running the landmark model on the whole
/// letterboxed frame.
pub struct OrtPoseEstimator {
    session: Session,
    min_presence: f32,
    min_tracking: f32,
    smoother: Option<LandmarkSmoother>,
}

impl OrtPoseEstimator {
    pub fn new(model_path: &Path, config: &PoseConfig, smooth: bool) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("failed to load pose model from {}", model_path.display())
            })?;

        Ok(Self {
            session,
            min_presence: config.detection_confidence,
            min_tracking: config.tracking_confidence,
            smoother: smooth.then(LandmarkSmoother::default),
        })
    }
}

fn decode_pose(
    values: &[f32],
    presence: f32,
    min_presence: f32,
    letterbox: &Letterbox,
) -> Result<Option<Pose>> {
    if presence < min_presence {
        return Ok(None);
    }
    if values.len() < POSE_LANDMARK_COUNT * VALUES_PER_POINT {
        return Err(anyhow!(
            "unexpected pose landmarks length: got {}, need {}",
            values.len(),
            POSE_LANDMARK_COUNT * VALUES_PER_POINT
        ));
    }

    let landmarks = values
        .chunks_exact(VALUES_PER_POINT)
        .take(POSE_LANDMARK_COUNT)
        .map(|p| {
            let point = letterbox.unproject(p[0], p[1]);
            common::normalized_landmark(
                point,
                p[2] / letterbox.scale,
                common::sigmoid(p[3]),
                letterbox.orig_w,
                letterbox.orig_h,
            )
        })
        .collect();

    Ok(Pose::from_landmarks(landmarks, presence.clamp(0.0, 1.0)))
}

/// Smooths a pose that is still tracked. A missing pose or one below
/// `min_tracking` drops the track, so the next pose starts fresh.
fn track_pose(smoother: &mut LandmarkSmoother, pose: Option<&mut Pose>, min_tracking: f32) {
    match pose {
        Some(pose) if pose.confidence >= min_tracking => {
            smoother.smooth(0, &mut pose.landmarks);
        }
        _ => smoother.reset(),
    }
}

impl PoseEstimator for OrtPoseEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<Option<Pose>> {
        let (input, letterbox) = common::letterbox_tensor(frame, POSE_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run pose session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "pose model returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let values = common::flat_output(&outputs[0])?;
        let presence = common::first_scalar(&outputs[1])?;
        let mut pose = decode_pose(&values, presence, self.min_presence, &letterbox)?;

        if let Some(smoother) = self.smoother.as_mut() {
            track_pose(smoother, pose.as_mut(), self.min_tracking);
        }

        Ok(pose)
    }

    fn reset(&mut self) {
        if let Some(smoother) = self.smoother.as_mut() {
            smoother.reset();
        }
    }
}

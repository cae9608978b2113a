use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{
    HandEstimator,
    common::{self, CropTransform},
    palm::{PalmDetector, PalmDetectorConfig, PalmRegion, hand_crop},
    smoothing::LandmarkSmoother,
};
use crate::{
    config::HandsConfig,
    types::{Frame, HAND_LANDMARK_COUNT, Hand, Handedness},
};

pub const HAND_INPUT_SIZE: u32 = 224;

/// Palm detection followed by the 21-point hand landmark model on a rotated
/// crop around each palm.
pub struct OrtHandEstimator {
    landmarks: Session,
    palm_detector: PalmDetector,
    max_hands: usize,
    min_landmark_confidence: f32,
    smoother: Option<LandmarkSmoother>,
}

impl OrtHandEstimator {
    pub fn new(
        landmark_model: &Path,
        palm_model: &Path,
        config: &HandsConfig,
        smooth: bool,
    ) -> Result<Self> {
        let landmarks = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(landmark_model)
            .with_context(|| {
                format!(
                    "failed to load hand landmark model from {}",
                    landmark_model.display()
                )
            })?;

        let palm_detector = PalmDetector::new(
            palm_model,
            PalmDetectorConfig {
                score_threshold: config.detection_confidence,
                ..PalmDetectorConfig::default()
            },
        )?;

        Ok(Self {
            landmarks,
            palm_detector,
            max_hands: config.max_hands,
            min_landmark_confidence: config.tracking_confidence,
            smoother: smooth.then(LandmarkSmoother::default),
        })
    }

    fn infer_hand(&mut self, frame: &Frame, crop: ((f32, f32), f32, f32)) -> Result<Option<Hand>> {
        let (center, side, angle) = crop;
        let (input, transform) =
            common::rotated_crop_tensor(frame, center, side, angle, HAND_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .landmarks
            .run(ort::inputs![tensor])
            .context("failed to run hand landmark session")?;

        if outputs.len() < 3 {
            return Err(anyhow!(
                "hand landmark model returned {} outputs, expected at least 3",
                outputs.len()
            ));
        }

        let coords = common::flat_output(&outputs[0])?;
        let confidence = common::first_scalar(&outputs[1])?;
        let handedness = common::first_scalar(&outputs[2])?;

        if confidence < self.min_landmark_confidence {
            return Ok(None);
        }

        Ok(decode_hand(&coords, &transform, frame, confidence, handedness))
    }
}

fn decode_hand(
    coords: &[f32],
    transform: &CropTransform,
    frame: &Frame,
    confidence: f32,
    handedness: f32,
) -> Option<Hand> {
    if coords.len() < HAND_LANDMARK_COUNT * 3 {
        return None;
    }

    let landmarks = coords
        .chunks_exact(3)
        .take(HAND_LANDMARK_COUNT)
        .map(|p| {
            let point = transform.unproject(p[0], p[1]);
            common::normalized_landmark(
                point,
                p[2] * transform.pixel_scale(),
                1.0,
                frame.width,
                frame.height,
            )
        })
        .collect();

    Hand::from_landmarks(
        landmarks,
        Handedness::from_score(handedness),
        confidence.clamp(0.0, 1.0),
    )
}

/// Runs `infer` on the strongest palms. A palm whose landmark pass fails is
/// skipped without discarding the hands already found on this frame.
fn collect_hands<F>(palms: &[PalmRegion], max_hands: usize, mut infer: F) -> Vec<Hand>
where
    F: FnMut(&PalmRegion) -> Result<Option<Hand>>,
{
    let mut hands = Vec::with_capacity(max_hands);
    for palm in palms.iter().take(max_hands) {
        match infer(palm) {
            Ok(Some(mut hand)) => {
                hand.confidence = (hand.confidence * palm.score).clamp(0.0, 1.0);
                hands.push(hand);
            }
            Ok(None) => {}
            Err(err) => log::warn!("hand landmark inference failed for one palm: {err:?}"),
        }
    }
    hands
}

impl HandEstimator for OrtHandEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<Vec<Hand>> {
        let palms = self.palm_detector.detect(frame)?;

        let max_hands = self.max_hands;
        let mut hands = collect_hands(&palms, max_hands, |palm| {
            self.infer_hand(frame, hand_crop(palm))
        });

        if let Some(smoother) = self.smoother.as_mut() {
            smoother.smooth_hands(&mut hands);
        }

        Ok(hands)
    }

    fn reset(&mut self) {
        if let Some(smoother) = self.smoother.as_mut() {
            smoother.reset();
        }
    }
}

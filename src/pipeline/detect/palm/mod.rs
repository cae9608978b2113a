mod anchors;

use std::{cmp::Ordering, path::Path};

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::common::{Letterbox, letterbox_tensor, sigmoid};
use crate::types::Frame;

pub const PALM_INPUT_SIZE: u32 = 192;
const PALM_KEYPOINTS: usize = 7;
const WRIST_KEYPOINT: usize = 0;
const MIDDLE_FINGER_KEYPOINT: usize = 2;

// Hand crop relative to the palm box, as in the MediaPipe hand graph.
const CROP_SCALE: f32 = 2.6;
const CROP_SHIFT: f32 = 0.5;

#[derive(Clone, Debug)]
pub struct PalmRegion {
    /// `[x1, y1, x2, y2]` in frame pixels.
    pub bbox: [f32; 4],
    pub keypoints: Vec<(f32, f32)>,
    pub score: f32,
}

#[derive(Clone, Debug)]
pub struct PalmDetectorConfig {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
}

impl Default for PalmDetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
            nms_threshold: 0.3,
            top_k: 32,
        }
    }
}

pub struct PalmDetector {
    session: Session,
    anchors: Vec<[f32; 2]>,
    cfg: PalmDetectorConfig,
}

impl PalmDetector {
    pub fn new(model_path: &Path, cfg: PalmDetectorConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("failed to load palm detector from {}", model_path.display())
            })?;

        Ok(Self {
            session,
            anchors: anchors::generate(),
            cfg,
        })
    }

    /// Palm regions sorted by descending score.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<PalmRegion>> {
        let (input, letterbox) = letterbox_tensor(frame, PALM_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run palm detector session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "palm detector returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let boxes = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;

        let raw = RawPalmOutput {
            boxes: boxes
                .as_slice()
                .ok_or_else(|| anyhow!("palm boxes not contiguous"))?,
            box_shape: boxes.shape(),
            scores: scores
                .as_slice()
                .ok_or_else(|| anyhow!("palm scores not contiguous"))?,
            score_shape: scores.shape(),
        };

        decode_palms(&raw, &self.anchors, &letterbox, &self.cfg)
    }
}

struct RawPalmOutput<'a> {
    boxes: &'a [f32],
    box_shape: &'a [usize],
    scores: &'a [f32],
    score_shape: &'a [usize],
}

fn trailing_dims(shape: &[usize], what: &str) -> Result<(usize, usize)> {
    match shape {
        [.., anchors, features] if shape.len() >= 3 => Ok((*anchors, *features)),
        _ => Err(anyhow!(
            "unexpected palm {what} shape {shape:?}, need [batch, anchors, features]"
        )),
    }
}

fn decode_palms(
    raw: &RawPalmOutput<'_>,
    anchors: &[[f32; 2]],
    letterbox: &Letterbox,
    cfg: &PalmDetectorConfig,
) -> Result<Vec<PalmRegion>> {
    let (anchor_dim, feature_dim) = trailing_dims(raw.box_shape, "box")?;
    let (score_anchor_dim, score_dim) = trailing_dims(raw.score_shape, "score")?;

    if feature_dim < 4 + PALM_KEYPOINTS * 2 {
        return Err(anyhow!(
            "palm box feature dimension too small: {feature_dim}"
        ));
    }
    if anchor_dim != score_anchor_dim {
        return Err(anyhow!(
            "anchor dimension mismatch between boxes ({anchor_dim}) and scores ({score_anchor_dim})"
        ));
    }

    let count = anchors.len().min(anchor_dim);
    let input = PALM_INPUT_SIZE as f32;
    let to_frame = |nx: f32, ny: f32| letterbox.unproject(nx * input, ny * input);
    let max_x = letterbox.orig_w.saturating_sub(1) as f32;
    let max_y = letterbox.orig_h.saturating_sub(1) as f32;

    let mut candidates = Vec::new();
    for (idx, anchor) in anchors.iter().enumerate().take(count) {
        let raw_score = raw
            .scores
            .get(idx * score_dim)
            .copied()
            .ok_or_else(|| anyhow!("missing score for palm anchor {idx}"))?;
        let score = sigmoid(raw_score);
        if score < cfg.score_threshold {
            continue;
        }

        let features = raw
            .boxes
            .get(idx * feature_dim..(idx + 1) * feature_dim)
            .ok_or_else(|| anyhow!("missing box features for palm anchor {idx}"))?;

        let cx = features[0] / input + anchor[0];
        let cy = features[1] / input + anchor[1];
        let hw = features[2] / input / 2.0;
        let hh = features[3] / input / 2.0;
        if hw <= 0.0 || hh <= 0.0 {
            continue;
        }

        let (x1, y1) = to_frame(cx - hw, cy - hh);
        let (x2, y2) = to_frame(cx + hw, cy + hh);
        let bbox = [
            x1.clamp(0.0, max_x),
            y1.clamp(0.0, max_y),
            x2.clamp(0.0, max_x),
            y2.clamp(0.0, max_y),
        ];

        let keypoints = features[4..4 + PALM_KEYPOINTS * 2]
            .chunks_exact(2)
            .map(|kp| to_frame(kp[0] / input + anchor[0], kp[1] / input + anchor[1]))
            .collect();

        candidates.push(PalmRegion {
            bbox,
            keypoints,
            score,
        });
    }

    Ok(nms(candidates, cfg.nms_threshold, cfg.top_k))
}

/// Square, rotated crop around the whole hand: `(center, side, angle)`.
///
/// The angle turns the crop so that the wrist to middle-finger direction
/// points up in the crop.
pub fn hand_crop(region: &PalmRegion) -> ((f32, f32), f32, f32) {
    let [x1, y1, x2, y2] = region.bbox;
    let (w, h) = ((x2 - x1).abs(), (y2 - y1).abs());
    let box_center = ((x1 + x2) * 0.5, (y1 + y2) * 0.5);

    let direction = match (
        region.keypoints.get(WRIST_KEYPOINT),
        region.keypoints.get(MIDDLE_FINGER_KEYPOINT),
    ) {
        (Some(wrist), Some(middle)) => {
            let (dx, dy) = (middle.0 - wrist.0, middle.1 - wrist.1);
            let len = (dx * dx + dy * dy).sqrt();
            if len > f32::EPSILON {
                (dx / len, dy / len)
            } else {
                (0.0, -1.0)
            }
        }
        _ => (0.0, -1.0),
    };

    let angle = direction.0.atan2(-direction.1);
    let center = (
        box_center.0 + direction.0 * h * CROP_SHIFT,
        box_center.1 + direction.1 * h * CROP_SHIFT,
    );
    let side = w.max(h) * CROP_SCALE;

    (center, side, angle)
}

fn nms(mut candidates: Vec<PalmRegion>, threshold: f32, top_k: usize) -> Vec<PalmRegion> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut keep: Vec<PalmRegion> = Vec::new();
    for candidate in candidates {
        if keep.len() >= top_k {
            break;
        }
        if keep
            .iter()
            .all(|kept| iou(&candidate.bbox, &kept.bbox) < threshold)
        {
            keep.push(candidate);
        }
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;
    if inter <= 0.0 {
        return 0.0;
    }

    let area = |r: &[f32; 4]| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
    let union = area(a) + area(b) - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(bbox: [f32; 4], score: f32) -> PalmRegion {
        PalmRegion {
            bbox,
            keypoints: Vec::new(),
            score,
        }
    }

    #[test]
    fn nms_drops_overlapping_lower_scores() {
        let kept = nms(
            vec![
                region([0.0, 0.0, 10.0, 10.0], 0.6),
                region([1.0, 1.0, 11.0, 11.0], 0.9),
                region([50.0, 50.0, 60.0, 60.0], 0.7),
            ],
            0.3,
            8,
        );
        let scores: Vec<f32> = kept.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.9, 0.7]);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        assert_eq!(iou(&[0.0, 0.0, 1.0, 1.0], &[2.0, 2.0, 3.0, 3.0]), 0.0);
        assert!((iou(&[0.0, 0.0, 2.0, 2.0], &[0.0, 0.0, 2.0, 2.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn upright_hand_crop_has_no_rotation() {
        let mut palm = region([40.0, 40.0, 60.0, 60.0], 0.9);
        palm.keypoints = vec![(50.0, 60.0), (45.0, 45.0), (50.0, 40.0)];
        let (center, side, angle) = hand_crop(&palm);
        assert!(angle.abs() < 1e-5);
        assert!((side - 52.0).abs() < 1e-4);
        // Shifted towards the fingers (up).
        assert!((center.0 - 50.0).abs() < 1e-4);
        assert!((center.1 - 40.0).abs() < 1e-4);
    }

    #[test]
    fn sideways_hand_crop_rotates_quarter_turn() {
        let mut palm = region([40.0, 40.0, 60.0, 60.0], 0.9);
        palm.keypoints = vec![(40.0, 50.0), (55.0, 45.0), (60.0, 50.0)];
        let (_, _, angle) = hand_crop(&palm);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn decodes_single_confident_anchor() {
        let anchors = vec![[0.5, 0.5], [0.25, 0.25]];
        let feature_dim = 4 + PALM_KEYPOINTS * 2;
        let mut boxes = vec![0.0f32; 2 * feature_dim];
        boxes[2] = 48.0;
        boxes[3] = 48.0;
        let scores = vec![5.0, -5.0];
        let raw = RawPalmOutput {
            boxes: &boxes,
            box_shape: &[1, 2, feature_dim],
            scores: &scores,
            score_shape: &[1, 2, 1],
        };
        let letterbox = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            orig_w: 192,
            orig_h: 192,
        };
        let palms = decode_palms(&raw, &anchors, &letterbox, &PalmDetectorConfig::default())
            .unwrap();
        assert_eq!(palms.len(), 1);
        let [x1, y1, x2, y2] = palms[0].bbox;
        assert!((x1 - 72.0).abs() < 1e-3 && (y1 - 72.0).abs() < 1e-3);
        assert!((x2 - 120.0).abs() < 1e-3 && (y2 - 120.0).abs() < 1e-3);
        assert_eq!(palms[0].keypoints.len(), PALM_KEYPOINTS);
        assert_eq!(palms[0].keypoints[0], (96.0, 96.0));
    }
}

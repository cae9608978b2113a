use crate::types::{Hand, Landmark};

const DEFAULT_ALPHA: f32 = 0.5;
/// Largest wrist movement between frames, in normalized units, that still
/// counts as the same hand.
const MAX_WRIST_JUMP: f32 = 0.2;

/// Exponential smoothing of landmark positions across frames.
///
/// Pose tracks are addressed by slot. Hand tracks follow each hand by its
/// wrist position, since detectors report hands in score order and that order
/// changes from frame to frame.
#[derive(Clone, Debug)]
pub struct LandmarkSmoother {
    alpha: f32,
    tracks: Vec<Vec<Landmark>>,
}

impl Default for LandmarkSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl LandmarkSmoother {
    /// `alpha` is the weight of the newest observation.
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            tracks: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.tracks.clear();
    }

    pub fn smooth(&mut self, slot: usize, landmarks: &mut [Landmark]) {
        if self.tracks.len() <= slot {
            self.tracks.resize_with(slot + 1, Vec::new);
        }
        let track = &mut self.tracks[slot];

        if track.len() == landmarks.len() {
            blend(self.alpha, track, landmarks);
        }
        *track = landmarks.to_vec();
    }

    /// Blends each hand with the previous track whose wrist is closest. Hands
    /// without a close enough track start a new one.
    pub fn smooth_hands(&mut self, hands: &mut [Hand]) {
        let previous = std::mem::take(&mut self.tracks);

        let mut candidates = Vec::new();
        for (hand_idx, hand) in hands.iter().enumerate() {
            for (track_idx, track) in previous.iter().enumerate() {
                if track.len() != hand.landmarks.len() {
                    continue;
                }
                let Some(distance) = wrist_distance(&hand.landmarks, track) else {
                    continue;
                };
                if distance <= MAX_WRIST_JUMP {
                    candidates.push((distance, hand_idx, track_idx));
                }
            }
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut matched = vec![None; hands.len()];
        let mut taken = vec![false; previous.len()];
        for (_, hand_idx, track_idx) in candidates {
            if matched[hand_idx].is_none() && !taken[track_idx] {
                matched[hand_idx] = Some(track_idx);
                taken[track_idx] = true;
            }
        }

        for (hand, track_idx) in hands.iter_mut().zip(matched) {
            if let Some(track_idx) = track_idx {
                blend(self.alpha, &previous[track_idx], &mut hand.landmarks);
            }
            self.tracks.push(hand.landmarks.to_vec());
        }
    }
}

fn blend(alpha: f32, previous: &[Landmark], current: &mut [Landmark]) {
    for (prev, current) in previous.iter().zip(current.iter_mut()) {
        current.x = prev.x + (current.x - prev.x) * alpha;
        current.y = prev.y + (current.y - prev.y) * alpha;
        current.z = prev.z + (current.z - prev.z) * alpha;
    }
}

fn wrist_distance(a: &[Landmark], b: &[Landmark]) -> Option<f32> {
    let (a, b) = (a.first()?, b.first()?);
    Some((a.x - b.x).hypot(a.y - b.y))
}

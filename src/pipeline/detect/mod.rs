pub mod common;
pub mod hand;
pub mod palm;
pub mod pose;
pub mod smoothing;

use anyhow::Result;

use crate::types::{Detections, Frame, Hand, MAX_HANDS, Pose};

pub use hand::OrtHandEstimator;
pub use pose::OrtPoseEstimator;

pub trait PoseEstimator: Send + 'static {
    fn estimate(&mut self, frame: &Frame) -> Result<Option<Pose>>;

    /// Forgets any tracking state carried between frames.
    fn reset(&mut self) {}
}

pub trait HandEstimator: Send + 'static {
    fn estimate(&mut self, frame: &Frame) -> Result<Vec<Hand>>;

    /// Forgets any tracking state carried between frames.
    fn reset(&mut self) {}
}

/// Which detectors run on the next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectorToggles {
    pub pose: bool,
    pub hands: bool,
}

/// Runs each enabled detector independently. A failing detector is logged and
/// contributes an empty result; it never affects the other one.
pub fn detect_frame<P, H>(
    frame: &Frame,
    toggles: DetectorToggles,
    pose_estimator: &mut P,
    hand_estimator: &mut H,
) -> Detections
where
    P: PoseEstimator + ?Sized,
    H: HandEstimator + ?Sized,
{
    let pose = if toggles.pose {
        pose_estimator.estimate(frame).unwrap_or_else(|err| {
            log::warn!("pose inference failed: {err:?}");
            None
        })
    } else {
        None
    };

    let mut hands = if toggles.hands {
        hand_estimator.estimate(frame).unwrap_or_else(|err| {
            log::warn!("hand inference failed: {err:?}");
            Vec::new()
        })
    } else {
        Vec::new()
    };
    hands.truncate(MAX_HANDS);

    Detections { pose, hands }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::types::{HAND_LANDMARK_COUNT, Handedness, Landmark, POSE_LANDMARK_COUNT};

    struct FailingPose;

    impl PoseEstimator for FailingPose {
        fn estimate(&mut self, _frame: &Frame) -> Result<Option<Pose>> {
            Err(anyhow!("model crashed"))
        }
    }

    struct ManyHands {
        calls: usize,
    }

    impl HandEstimator for ManyHands {
        fn estimate(&mut self, _frame: &Frame) -> Result<Vec<Hand>> {
            self.calls += 1;
            let hand = Hand::from_landmarks(
                vec![Landmark::default(); HAND_LANDMARK_COUNT],
                Handedness::Right,
                0.9,
            )
            .unwrap();
            Ok(vec![hand; 3])
        }
    }

    struct StaticPose;

    impl PoseEstimator for StaticPose {
        fn estimate(&mut self, _frame: &Frame) -> Result<Option<Pose>> {
            Ok(Pose::from_landmarks(
                vec![Landmark::default(); POSE_LANDMARK_COUNT],
                0.8,
            ))
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![0; 4 * 4 * 4], 4, 4)
    }

    #[test]
    fn failing_pose_does_not_hide_hands() {
        let mut hands = ManyHands { calls: 0 };
        let detections = detect_frame(
            &frame(),
            DetectorToggles {
                pose: true,
                hands: true,
            },
            &mut FailingPose,
            &mut hands,
        );
        assert!(detections.pose.is_none());
        assert_eq!(detections.hands_detected(), MAX_HANDS);
        assert_eq!(detections.hand_landmark_count(), 42);
    }

    #[test]
    fn disabled_detectors_are_not_run() {
        let mut hands = ManyHands { calls: 0 };
        let detections = detect_frame(
            &frame(),
            DetectorToggles {
                pose: true,
                hands: false,
            },
            &mut StaticPose,
            &mut hands,
        );
        assert!(detections.pose_detected());
        assert!(detections.hands.is_empty());
        assert_eq!(hands.calls, 0);
    }
}

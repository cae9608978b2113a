use std::time::Instant;

pub const POSE_LANDMARK_COUNT: usize = 33;
pub const HAND_LANDMARK_COUNT: usize = 21;
pub const MAX_HANDS: usize = 2;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Flips the frame around its vertical axis in place.
    pub fn mirror_horizontal(&mut self) {
        let row_len = self.width as usize * 4;
        if row_len == 0 {
            return;
        }
        for row in self.rgba.chunks_exact_mut(row_len) {
            let (mut left, mut right) = (0usize, self.width as usize - 1);
            while left < right {
                for channel in 0..4 {
                    row.swap(left * 4 + channel, right * 4 + channel);
                }
                left += 1;
                right -= 1;
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) as usize) * 4;
        self.rgba
            .get(idx..idx + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }
}

/// Keypoint in normalized frame coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility,
        }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }

    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    pub landmarks: [Landmark; POSE_LANDMARK_COUNT],
    pub confidence: f32,
}

impl Pose {
    /// Returns `None` unless exactly 33 landmarks are supplied.
    pub fn from_landmarks(landmarks: Vec<Landmark>, confidence: f32) -> Option<Self> {
        let landmarks: [Landmark; POSE_LANDMARK_COUNT] = landmarks.try_into().ok()?;
        Some(Self {
            landmarks,
            confidence,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn from_score(score: f32) -> Self {
        if score > 0.5 {
            Handedness::Right
        } else {
            Handedness::Left
        }
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            Handedness::Left => "L",
            Handedness::Right => "R",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    pub landmarks: [Landmark; HAND_LANDMARK_COUNT],
    pub handedness: Handedness,
    pub confidence: f32,
}

impl Hand {
    /// Returns `None` unless exactly 21 landmarks are supplied.
    pub fn from_landmarks(
        landmarks: Vec<Landmark>,
        handedness: Handedness,
        confidence: f32,
    ) -> Option<Self> {
        let landmarks: [Landmark; HAND_LANDMARK_COUNT] = landmarks.try_into().ok()?;
        Some(Self {
            landmarks,
            handedness,
            confidence,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detections {
    pub pose: Option<Pose>,
    pub hands: Vec<Hand>,
}

impl Detections {
    pub fn pose_detected(&self) -> bool {
        self.pose.is_some()
    }

    pub fn hands_detected(&self) -> usize {
        self.hands.len()
    }

    pub fn hand_landmark_count(&self) -> usize {
        self.hands.len() * HAND_LANDMARK_COUNT
    }
}

/// What the window shows next to the composed frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayStatus {
    pub fps: f32,
    pub pose_enabled: bool,
    pub hands_enabled: bool,
    pub pose_detected: bool,
    pub hands_detected: usize,
    pub handedness: Vec<Handedness>,
    pub mirror: bool,
    pub paused: bool,
}

#[derive(Clone, Debug)]
pub struct DisplayUpdate {
    pub frame: Frame,
    pub status: OverlayStatus,
}

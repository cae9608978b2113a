//! SSD anchors for the 192x192 MediaPipe palm detector.
//!
//! The layer options match the detector's export: four layers with strides
//! 8, 16, 16, 16, one aspect ratio plus the interpolated scale per layer, and
//! fixed-size anchors. Consecutive layers sharing a stride share a feature
//! map, giving 24*24*2 + 12*12*6 = 2016 anchors.

use super::PALM_INPUT_SIZE;

pub const NUM_ANCHORS: usize = 2016;

const STRIDES: [u32; 4] = [8, 16, 16, 16];
const ANCHORS_PER_LAYER: usize = 2;
const ANCHOR_OFFSET: f32 = 0.5;

/// Anchor centers in normalized input coordinates, in model output order.
pub fn generate() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);
    let mut layer = 0;

    while layer < STRIDES.len() {
        let stride = STRIDES[layer];
        let mut per_cell = 0;
        while layer < STRIDES.len() && STRIDES[layer] == stride {
            per_cell += ANCHORS_PER_LAYER;
            layer += 1;
        }

        let feature_map = PALM_INPUT_SIZE.div_ceil(stride);
        for y in 0..feature_map {
            for x in 0..feature_map {
                let center = [
                    (x as f32 + ANCHOR_OFFSET) / feature_map as f32,
                    (y as f32 + ANCHOR_OFFSET) / feature_map as f32,
                ];
                anchors.extend(std::iter::repeat_n(center, per_cell));
            }
        }
    }

    anchors
}

use crate::{
    config::{RenderConfig, Rgb},
    types::{Detections, Frame, Hand, Landmark, Pose},
};

pub const HAND_CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (5, 9),
    (9, 13),
    (13, 17),
];

/// Shoulders, hips, arms and the hand stubs off each wrist.
pub const POSE_UPPER_BODY_CONNECTIONS: &[(usize, usize)] = &[
    (11, 12),
    (11, 23),
    (12, 24),
    (23, 24),
    (11, 13),
    (13, 15),
    (12, 14),
    (14, 16),
    (15, 17),
    (15, 19),
    (15, 21),
    (16, 18),
    (16, 20),
    (16, 22),
];

/// The complete 33-point body topology including face and legs.
pub const POSE_FULL_BODY_CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    (11, 12),
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    (17, 19),
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    (18, 20),
    (11, 23),
    (12, 24),
    (23, 24),
    (23, 25),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (29, 31),
    (30, 32),
    (27, 31),
    (28, 32),
];

const MARKER_RING_GAP: i32 = 2;
const MARKER_RING_THICKNESS: i32 = 2;
const DETECTION_BOX_PADDING: f32 = 10.0;
const DETECTION_BOX_THICKNESS: i32 = 2;

pub type Color = [u8; 4];

pub fn opaque(rgb: Rgb) -> Color {
    [rgb[0], rgb[1], rgb[2], 255]
}

/// Drawing parameters resolved once from the render config.
#[derive(Clone, Debug)]
pub struct OverlayStyle {
    pub skeleton_color: Color,
    pub hand_color: Color,
    pub landmark_color: Color,
    pub line_thickness: i32,
    pub landmark_radius: i32,
    pub show_landmarks: bool,
    pub show_connections: bool,
    pub draw_detection_box: bool,
    pub full_body: bool,
    pub visibility_threshold: f32,
}

impl From<&RenderConfig> for OverlayStyle {
    fn from(config: &RenderConfig) -> Self {
        Self {
            skeleton_color: opaque(config.skeleton_color),
            hand_color: opaque(config.hand_color),
            landmark_color: opaque(config.landmark_color),
            line_thickness: config.line_thickness.max(1) as i32,
            landmark_radius: config.landmark_radius as i32,
            show_landmarks: config.show_landmarks,
            show_connections: config.show_connections,
            draw_detection_box: config.draw_detection_box,
            full_body: config.full_body_skeleton,
            visibility_threshold: config.visibility_threshold,
        }
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

impl OverlayStyle {
    pub fn pose_connections(&self) -> &'static [(usize, usize)] {
        if self.full_body {
            POSE_FULL_BODY_CONNECTIONS
        } else {
            POSE_UPPER_BODY_CONNECTIONS
        }
    }
}

/// Body first, then hands on top.
pub fn draw_detections(frame: &mut Frame, detections: &Detections, style: &OverlayStyle) {
    if let Some(pose) = &detections.pose {
        draw_pose(frame, pose, style);
    }
    draw_hands(frame, &detections.hands, style);
}

/// Segments need both endpoints visible; markers are drawn for visible
/// landmarks only.
pub fn draw_pose(frame: &mut Frame, pose: &Pose, style: &OverlayStyle) {
    let threshold = style.visibility_threshold;
    let visible = |lm: &Landmark| lm.is_visible(threshold);
    draw_landmark_set(
        frame,
        &pose.landmarks,
        style.pose_connections(),
        style.skeleton_color,
        style,
        visible,
    );

    if style.draw_detection_box {
        let points: Vec<(f32, f32)> = pose
            .landmarks
            .iter()
            .filter(|lm| visible(lm))
            .map(|lm| lm.to_pixel(frame.width, frame.height))
            .collect();
        draw_detection_box(frame, &points, style.skeleton_color);
    }
}

pub fn draw_hands(frame: &mut Frame, hands: &[Hand], style: &OverlayStyle) {
    for hand in hands {
        draw_landmark_set(
            frame,
            &hand.landmarks,
            HAND_CONNECTIONS,
            style.hand_color,
            style,
            |_| true,
        );

        if style.draw_detection_box {
            let points: Vec<(f32, f32)> = hand
                .landmarks
                .iter()
                .map(|lm| lm.to_pixel(frame.width, frame.height))
                .collect();
            draw_detection_box(frame, &points, style.hand_color);
        }
    }
}

fn draw_landmark_set(
    frame: &mut Frame,
    landmarks: &[Landmark],
    connections: &[(usize, usize)],
    color: Color,
    style: &OverlayStyle,
    visible: impl Fn(&Landmark) -> bool,
) {
    let (width, height) = (frame.width, frame.height);

    if style.show_connections {
        for &(a, b) in connections {
            let (Some(la), Some(lb)) = (landmarks.get(a), landmarks.get(b)) else {
                continue;
            };
            if !visible(la) || !visible(lb) {
                continue;
            }
            draw_line(
                &mut frame.rgba,
                width,
                height,
                &la.to_pixel(width, height),
                &lb.to_pixel(width, height),
                color,
                style.line_thickness,
            );
        }
    }

    if style.show_landmarks {
        for lm in landmarks.iter().filter(|lm| visible(lm)) {
            let (x, y) = lm.to_pixel(width, height);
            draw_marker(
                &mut frame.rgba,
                width,
                height,
                (x as i32, y as i32),
                style.landmark_radius,
                style.landmark_color,
                color,
            );
        }
    }
}

/// Filled dot with an outer ring in the overlay color.
fn draw_marker(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: i32,
    fill: Color,
    ring: Color,
) {
    draw_circle(buffer, width, height, center, radius, fill);
    draw_ring(
        buffer,
        width,
        height,
        center,
        radius + MARKER_RING_GAP,
        MARKER_RING_THICKNESS,
        ring,
    );
}

fn draw_detection_box(frame: &mut Frame, points: &[(f32, f32)], color: Color) {
    if points.is_empty() {
        return;
    }
    let (mut x1, mut y1) = (f32::MAX, f32::MAX);
    let (mut x2, mut y2) = (f32::MIN, f32::MIN);
    for &(x, y) in points {
        x1 = x1.min(x);
        y1 = y1.min(y);
        x2 = x2.max(x);
        y2 = y2.max(y);
    }

    let (width, height) = (frame.width, frame.height);
    draw_rect(
        &mut frame.rgba,
        width,
        height,
        (x1 - DETECTION_BOX_PADDING).max(0.0),
        (y1 - DETECTION_BOX_PADDING).max(0.0),
        (x2 + DETECTION_BOX_PADDING).min(width.saturating_sub(1) as f32),
        (y2 + DETECTION_BOX_PADDING).min(height.saturating_sub(1) as f32),
        color,
        DETECTION_BOX_THICKNESS,
    );
}

#[allow(clippy::too_many_arguments)]
fn draw_rect(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    color: Color,
    thickness: i32,
) {
    let corners = [(x1, y1), (x2, y1), (x2, y2), (x1, y2)];
    for i in 0..corners.len() {
        let next = corners[(i + 1) % corners.len()];
        draw_line(buffer, width, height, &corners[i], &next, color, thickness);
    }
}

fn draw_line(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    p0: &(f32, f32),
    p1: &(f32, f32),
    color: Color,
    thickness: i32,
) {
    let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
    let (x1, y1) = (p1.0 as i32, p1.1 as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        put_pixel_safe(buffer, width, height, x0, y0, color);
        if radius > 0 {
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    if ox == 0 && oy == 0 {
                        continue;
                    }
                    if ox.abs() + oy.abs() <= radius {
                        put_pixel_safe(buffer, width, height, x0 + ox, y0 + oy, color);
                    }
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_circle(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: i32,
    color: Color,
) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_safe(buffer, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

fn draw_ring(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    outer: i32,
    thickness: i32,
    color: Color,
) {
    let (cx, cy) = center;
    let inner = (outer - thickness).max(0);
    for dy in -outer..=outer {
        for dx in -outer..=outer {
            let d2 = dx * dx + dy * dy;
            if d2 > inner * inner && d2 <= outer * outer {
                put_pixel_safe(buffer, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_pixel_safe(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: Color,
) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= width || uy >= height {
        return;
    }
    let idx = ((uy * width + ux) as usize) * 4;
    if idx + 3 < buffer.len() {
        buffer[idx..idx + 4].copy_from_slice(&color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HAND_LANDMARK_COUNT, Handedness, POSE_LANDMARK_COUNT};

    const BLACK: Color = [0, 0, 0, 255];

    fn blank(width: u32, height: u32) -> Frame {
        Frame::new(
            BLACK
                .iter()
                .copied()
                .cycle()
                .take((width * height * 4) as usize)
                .collect(),
            width,
            height,
        )
    }

    fn shoulders_pose(right_visibility: f32) -> Pose {
        let mut landmarks = vec![Landmark::default(); POSE_LANDMARK_COUNT];
        landmarks[11] = Landmark::new(0.25, 0.5, 0.0, 0.9);
        landmarks[12] = Landmark::new(0.75, 0.5, 0.0, right_visibility);
        Pose::from_landmarks(landmarks, 0.9).unwrap()
    }

    fn lines_only() -> OverlayStyle {
        OverlayStyle {
            show_landmarks: false,
            ..OverlayStyle::default()
        }
    }

    #[test]
    fn connection_table_sizes() {
        assert_eq!(HAND_CONNECTIONS.len(), 23);
        assert_eq!(POSE_UPPER_BODY_CONNECTIONS.len(), 14);
        assert_eq!(POSE_FULL_BODY_CONNECTIONS.len(), 35);
        let in_range = |table: &[(usize, usize)], n| table.iter().all(|&(a, b)| a < n && b < n);
        assert!(in_range(HAND_CONNECTIONS, HAND_LANDMARK_COUNT));
        assert!(in_range(POSE_FULL_BODY_CONNECTIONS, POSE_LANDMARK_COUNT));
    }

    #[test]
    fn visible_segment_is_drawn() {
        let mut frame = blank(40, 20);
        let style = lines_only();
        draw_pose(&mut frame, &shoulders_pose(0.9), &style);
        assert_eq!(frame.pixel(20, 10), Some(style.skeleton_color));
    }

    #[test]
    fn segment_with_hidden_endpoint_is_skipped() {
        let mut frame = blank(40, 20);
        draw_pose(&mut frame, &shoulders_pose(0.3), &lines_only());
        assert_eq!(frame.pixel(20, 10), Some(BLACK));
    }

    #[test]
    fn hidden_landmarks_get_no_marker() {
        let mut frame = blank(40, 20);
        let style = OverlayStyle {
            show_connections: false,
            ..OverlayStyle::default()
        };
        draw_pose(&mut frame, &shoulders_pose(0.3), &style);
        assert_eq!(frame.pixel(10, 10), Some(style.landmark_color));
        assert_eq!(frame.pixel(30, 10), Some(BLACK));
        // Landmark 0 sits at the origin with zero visibility.
        assert_eq!(frame.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn hand_marker_has_ring_in_hand_color() {
        let mut frame = blank(40, 40);
        let style = OverlayStyle {
            show_connections: false,
            ..OverlayStyle::default()
        };
        let hand = Hand::from_landmarks(
            vec![Landmark::new(0.5, 0.5, 0.0, 1.0); HAND_LANDMARK_COUNT],
            Handedness::Right,
            0.9,
        )
        .unwrap();
        draw_hands(&mut frame, &[hand], &style);

        let radius = style.landmark_radius as u32;
        assert_eq!(frame.pixel(20, 20), Some(style.landmark_color));
        assert_eq!(frame.pixel(20 + radius + 2, 20), Some(style.hand_color));
        assert_eq!(frame.pixel(20 + radius + 4, 20), Some(BLACK));
    }

    #[test]
    fn detection_box_surrounds_hand() {
        let mut frame = blank(60, 60);
        let style = OverlayStyle {
            show_connections: false,
            show_landmarks: false,
            draw_detection_box: true,
            ..OverlayStyle::default()
        };
        let hand = Hand::from_landmarks(
            vec![Landmark::new(0.5, 0.5, 0.0, 1.0); HAND_LANDMARK_COUNT],
            Handedness::Left,
            0.9,
        )
        .unwrap();
        draw_hands(&mut frame, &[hand], &style);
        assert_eq!(frame.pixel(20, 30), Some(style.hand_color));
        assert_eq!(frame.pixel(30, 30), Some(BLACK));
    }

    #[test]
    fn drawing_off_frame_is_clipped() {
        let mut frame = blank(8, 8);
        draw_line(
            &mut frame.rgba,
            8,
            8,
            &(-20.0, -20.0),
            &(40.0, 40.0),
            [1, 2, 3, 255],
            5,
        );
        draw_circle(&mut frame.rgba, 8, 8, (100, 100), 10, [1, 2, 3, 255]);
        assert_eq!(frame.rgba.len(), 8 * 8 * 4);
        assert_eq!(frame.pixel(4, 4), Some([1, 2, 3, 255]));
    }
}

use std::{
    fs,
    path::{Path, PathBuf},
};

use rusttype::{Font, Scale, point};

use super::skeleton::{Color, opaque};
use crate::{
    config::{RenderConfig, UiConfig},
    types::{Frame, OverlayStatus},
};

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub const CONTROLS: &[&str] = &[
    "Controls:",
    "ESC/Q - Quit",
    "S - Screenshot",
    "P - Pause",
    "H - Toggle hands",
    "B - Toggle body",
    "M - Toggle mirror",
];

const PAUSE_BANNER: &str = "PAUSED - press P to resume";

const DETECTED_COLOR: Color = [0, 255, 0, 255];
const MISSING_COLOR: Color = [255, 0, 0, 255];
const OFF_COLOR: Color = [160, 160, 160, 255];
const BOX_COLOR: Color = [0, 0, 0, 255];
const BOX_ALPHA: f32 = 0.6;
const MARGIN: f32 = 10.0;
const BOX_PADDING: f32 = 5.0;
const CONTROLS_SCALE: f32 = 0.75;
const BANNER_SCALE: f32 = 1.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    Detected,
    Missing,
    Off,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: StatusTone,
}

/// Pose and hand status lines, shared by the HUD and the window status strip.
pub fn status_lines(status: &OverlayStatus) -> [StatusLine; 2] {
    let pose = if !status.pose_enabled {
        StatusLine {
            text: "Pose: off".to_string(),
            tone: StatusTone::Off,
        }
    } else if status.pose_detected {
        StatusLine {
            text: "Pose: detected".to_string(),
            tone: StatusTone::Detected,
        }
    } else {
        StatusLine {
            text: "Pose: not detected".to_string(),
            tone: StatusTone::Missing,
        }
    };

    let hands = if !status.hands_enabled {
        StatusLine {
            text: "Hands: off".to_string(),
            tone: StatusTone::Off,
        }
    } else if status.hands_detected == 0 {
        StatusLine {
            text: "Hands: 0".to_string(),
            tone: StatusTone::Missing,
        }
    } else {
        let sides: Vec<&str> = status.handedness.iter().map(|h| h.short_label()).collect();
        StatusLine {
            text: format!("Hands: {} ({})", status.hands_detected, sides.join(", ")),
            tone: StatusTone::Detected,
        }
    };

    [pose, hands]
}

fn tone_color(tone: StatusTone) -> Color {
    match tone {
        StatusTone::Detected => DETECTED_COLOR,
        StatusTone::Missing => MISSING_COLOR,
        StatusTone::Off => OFF_COLOR,
    }
}

/// Text layer drawn over the composed frame.
pub struct Hud {
    font: Option<Font<'static>>,
    text_size: f32,
    text_color: Color,
    show_fps: bool,
    show_instructions: bool,
}

impl Hud {
    pub fn load(ui: &UiConfig, render: &RenderConfig) -> Self {
        let font = load_font(ui.font_path.as_deref());
        if font.is_none() {
            log::warn!("no usable TTF font found, HUD text disabled (set ui.font_path)");
        }
        Self::with_font(font, ui, render)
    }

    pub fn with_font(font: Option<Font<'static>>, ui: &UiConfig, render: &RenderConfig) -> Self {
        Self {
            font,
            text_size: ui.text_size,
            text_color: opaque(render.text_color),
            show_fps: ui.show_fps,
            show_instructions: ui.show_instructions,
        }
    }

    pub fn draw(&self, frame: &mut Frame, status: &OverlayStatus) {
        let Some(font) = &self.font else {
            return;
        };
        let scale = Scale::uniform(self.text_size);
        let metrics = font.v_metrics(scale);
        let line_height = metrics.ascent - metrics.descent + metrics.line_gap;

        if self.show_fps {
            let text = format!("FPS: {:.1}", status.fps);
            let origin = (MARGIN + BOX_PADDING, MARGIN + BOX_PADDING + metrics.ascent);
            self.boxed_text(frame, font, scale, &text, origin, self.text_color);
        }

        let lines = status_lines(status);
        let last_baseline = frame.height as f32 - MARGIN + metrics.descent;
        for (i, line) in lines.iter().enumerate() {
            let rows_below = (lines.len() - 1 - i) as f32;
            let baseline = last_baseline - rows_below * line_height;
            draw_text(
                frame,
                font,
                scale,
                &line.text,
                (MARGIN, baseline),
                tone_color(line.tone),
            );
        }

        if self.show_instructions {
            let small = Scale::uniform(self.text_size * CONTROLS_SCALE);
            let small_metrics = font.v_metrics(small);
            let small_height =
                small_metrics.ascent - small_metrics.descent + small_metrics.line_gap;
            let widest = CONTROLS
                .iter()
                .map(|line| text_width(font, small, line))
                .fold(0.0f32, f32::max);
            let x = frame.width as f32 - MARGIN - widest;
            for (i, line) in CONTROLS.iter().enumerate() {
                let baseline = MARGIN + small_metrics.ascent + i as f32 * small_height;
                draw_text(frame, font, small, line, (x, baseline), self.text_color);
            }
        }
    }

    pub fn draw_pause_banner(&self, frame: &mut Frame) {
        let Some(font) = &self.font else {
            return;
        };
        let scale = Scale::uniform(self.text_size * BANNER_SCALE);
        let width = text_width(font, scale, PAUSE_BANNER);
        let x = ((frame.width as f32 - width) / 2.0).max(MARGIN);
        let y = frame.height as f32 / 2.0;
        self.boxed_text(frame, font, scale, PAUSE_BANNER, (x, y), MISSING_COLOR);
    }

    fn boxed_text(
        &self,
        frame: &mut Frame,
        font: &Font<'static>,
        scale: Scale,
        text: &str,
        (x, baseline): (f32, f32),
        color: Color,
    ) {
        let metrics = font.v_metrics(scale);
        let width = text_width(font, scale, text);
        fill_rect(
            frame,
            (x - BOX_PADDING, baseline - metrics.ascent - BOX_PADDING),
            (x + width + BOX_PADDING, baseline - metrics.descent + BOX_PADDING),
            BOX_COLOR,
            BOX_ALPHA,
        );
        draw_text(frame, font, scale, text, (x, baseline), color);
    }
}

fn load_font(configured: Option<&Path>) -> Option<Font<'static>> {
    if let Some(path) = configured {
        match read_font(path) {
            Some(font) => return Some(font),
            None => log::warn!(
                "configured font {} is unusable, trying system fonts",
                path.display()
            ),
        }
    }

    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find_map(|path| read_font(&path))
}

fn read_font(path: &Path) -> Option<Font<'static>> {
    let bytes = fs::read(path).ok()?;
    let font = Font::try_from_vec(bytes)?;
    log::info!("HUD font: {}", path.display());
    Some(font)
}

fn text_width(font: &Font<'static>, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

fn draw_text(
    frame: &mut Frame,
    font: &Font<'static>,
    scale: Scale,
    text: &str,
    (x, baseline): (f32, f32),
    color: Color,
) {
    for glyph in font.layout(text, scale, point(x, baseline)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            blend_pixel(
                frame,
                bb.min.x + gx as i32,
                bb.min.y + gy as i32,
                color,
                coverage,
            );
        });
    }
}

fn fill_rect(
    frame: &mut Frame,
    top_left: (f32, f32),
    bottom_right: (f32, f32),
    color: Color,
    alpha: f32,
) {
    let (x0, y0) = (top_left.0.floor() as i32, top_left.1.floor() as i32);
    let (x1, y1) = (bottom_right.0.ceil() as i32, bottom_right.1.ceil() as i32);
    for y in y0..y1 {
        for x in x0..x1 {
            blend_pixel(frame, x, y, color, alpha);
        }
    }
}

fn blend_pixel(frame: &mut Frame, x: i32, y: i32, color: Color, alpha: f32) {
    if x < 0 || y < 0 || x as u32 >= frame.width || y as u32 >= frame.height {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let idx = ((y as u32 * frame.width + x as u32) as usize) * 4;
    let Some(px) = frame.rgba.get_mut(idx..idx + 3) else {
        return;
    };
    for (dst, &src) in px.iter_mut().zip(color.iter()) {
        *dst = (*dst as f32 * (1.0 - alpha) + src as f32 * alpha).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Handedness;

    fn grey_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![100; (width * height * 4) as usize], width, height)
    }

    #[test]
    fn status_lines_reflect_detection_state() {
        let mut status = OverlayStatus {
            pose_enabled: true,
            hands_enabled: true,
            ..OverlayStatus::default()
        };
        let [pose, hands] = status_lines(&status);
        assert_eq!(pose.text, "Pose: not detected");
        assert_eq!(pose.tone, StatusTone::Missing);
        assert_eq!(hands.text, "Hands: 0");

        status.pose_detected = true;
        status.hands_detected = 2;
        status.handedness = vec![Handedness::Left, Handedness::Right];
        let [pose, hands] = status_lines(&status);
        assert_eq!(pose.tone, StatusTone::Detected);
        assert_eq!(hands.text, "Hands: 2 (L, R)");
        assert_eq!(hands.tone, StatusTone::Detected);
    }

    #[test]
    fn disabled_detectors_read_off() {
        let status = OverlayStatus {
            pose_enabled: false,
            hands_enabled: true,
            ..OverlayStatus::default()
        };
        let [pose, hands] = status_lines(&status);
        assert_eq!(pose.text, "Pose: off");
        assert_eq!(pose.tone, StatusTone::Off);
        assert_eq!(hands.tone, StatusTone::Missing);
    }

    #[test]
    fn hud_without_font_leaves_frame_untouched() {
        let hud = Hud::with_font(None, &UiConfig::default(), &RenderConfig::default());
        let mut frame = grey_frame(64, 48);
        hud.draw(&mut frame, &OverlayStatus::default());
        hud.draw_pause_banner(&mut frame);
        assert!(frame.rgba.iter().all(|&v| v == 100));
    }

    #[test]
    fn blending_mixes_and_clips() {
        let mut frame = grey_frame(4, 4);
        blend_pixel(&mut frame, 1, 1, [200, 0, 100, 255], 0.5);
        assert_eq!(frame.pixel(1, 1), Some([150, 50, 100, 100]));
        blend_pixel(&mut frame, -1, 9, [0, 0, 0, 255], 1.0);

        fill_rect(&mut frame, (-3.0, -3.0), (2.0, 2.0), [0, 0, 0, 255], 1.0);
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 100]));
        assert_eq!(frame.pixel(2, 2), Some([100, 100, 100, 100]));
    }
}

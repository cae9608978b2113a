use crossbeam_channel::TryRecvError;
use gpui::Hsla;

use super::render_util::frame_to_image;
use super::{
    ActiveTheme, AnyElement, Arc, Context, InteractiveElement, IntoElement, ObjectFit,
    OverlayView, ParentElement, RenderImage, Styled, StyledExt, StyledImage, Window, div, h_flex,
    img, px, v_flex,
};
use crate::pipeline::hud::{StatusTone, status_lines};

impl OverlayView {
    /// Takes whatever the loop published since the last render. The channel
    /// holds at most one update.
    pub(super) fn poll_display(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        loop {
            match self.display_rx.try_recv() {
                Ok(update) => {
                    if let Some(image) = frame_to_image(&update.frame) {
                        self.replace_latest_image(image, window, cx);
                    }
                    self.frame_size = Some((update.frame.width, update.frame.height));
                    self.latest_status = Some(update.status);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.loop_finished {
                        self.loop_finished = true;
                        log::info!("overlay loop ended, closing window");
                        cx.quit();
                    }
                    break;
                }
            }
        }
    }

    pub(super) fn render_main(&mut self, cx: &mut Context<'_, Self>) -> AnyElement {
        let frame_view: AnyElement = if let Some(image) = &self.latest_image {
            img(image.clone())
                .size_full()
                .object_fit(ObjectFit::Contain)
                .into_any_element()
        } else {
            div()
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .text_sm()
                .text_color(gpui::rgb(0x8b95a5))
                .child("Waiting for camera...")
                .into_any_element()
        };

        let status_strip = self.render_status_strip(cx);

        v_flex()
            .size_full()
            .bg(gpui::rgb(0x000000))
            .track_focus(&self.focus_handle)
            .on_key_down(cx.listener(Self::on_key_down))
            .child(div().flex_1().overflow_hidden().child(frame_view))
            .child(status_strip)
            .into_any_element()
    }

    fn render_status_strip(&self, cx: &mut Context<'_, Self>) -> AnyElement {
        let theme = cx.theme();
        let strip = h_flex()
            .w_full()
            .h(px(28.0))
            .px_3()
            .gap_4()
            .items_center()
            .bg(gpui::rgb(0x1a2332))
            .text_xs();

        let Some(status) = &self.latest_status else {
            return strip
                .child(
                    div()
                        .text_color(theme.muted_foreground)
                        .child("○ starting"),
                )
                .into_any_element();
        };

        let tone_color = |tone: StatusTone| -> Hsla {
            match tone {
                StatusTone::Detected => theme.success,
                StatusTone::Missing => theme.danger,
                StatusTone::Off => theme.muted_foreground,
            }
        };
        let resolution = self
            .frame_size
            .map(|(w, h)| format!("{w}x{h}"))
            .unwrap_or_default();

        let mut strip = strip.child(
            div()
                .font_semibold()
                .text_color(theme.foreground)
                .child(format!("FPS {:.1}", status.fps)),
        );
        for line in status_lines(status) {
            strip = strip.child(div().text_color(tone_color(line.tone)).child(line.text));
        }

        strip
            .child(
                div()
                    .text_color(theme.muted_foreground)
                    .child(if status.mirror { "mirror on" } else { "mirror off" }),
            )
            .child(div().flex_1())
            .child(div().text_color(theme.muted_foreground).child(resolution))
            .child(if status.paused {
                div().text_color(theme.warning).child("❚❚ paused")
            } else {
                div().text_color(theme.success).child("● live")
            })
            .into_any_element()
    }

    fn replace_latest_image(
        &mut self,
        new_image: Arc<RenderImage>,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        if let Some(old_image) = self.latest_image.replace(new_image) {
            // Explicitly drop the previous GPU texture; otherwise the sprite atlas keeps
            // every frame and memory will climb rapidly while the camera is running.
            cx.drop_image(old_image, Some(window));
        }
    }
}

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use gpui::{
    AnyElement, App, AppContext, Context, FocusHandle, InteractiveElement, IntoElement,
    KeyDownEvent, ObjectFit, ParentElement, Render, RenderImage, Styled, StyledImage,
    TitlebarOptions, Window, WindowOptions, div, img, px,
};
use gpui_component::{ActiveTheme, Root, StyledExt, h_flex, v_flex};
use image::{Frame as ImageFrame, ImageBuffer, Rgba};

use crate::{
    pipeline::Command,
    types::{DisplayUpdate, OverlayStatus},
};

mod main_view;
mod render_util;

pub fn launch_ui(
    app: &mut App,
    title: &str,
    display_rx: Receiver<DisplayUpdate>,
    command_tx: Sender<Command>,
) -> gpui::Result<()> {
    let window_options = WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some(title.to_string().into()),
            ..Default::default()
        }),
        ..Default::default()
    };

    app.open_window(window_options, move |window, app| {
        let view = app.new(|cx| OverlayView::new(display_rx, command_tx, cx));
        let focus_handle = view.read(app).focus_handle.clone();
        window.focus(&focus_handle);
        app.new(|cx| Root::new(view, window, cx))
    })?;

    Ok(())
}

struct OverlayView {
    display_rx: Receiver<DisplayUpdate>,
    command_tx: Sender<Command>,
    focus_handle: FocusHandle,
    latest_image: Option<Arc<RenderImage>>,
    latest_status: Option<OverlayStatus>,
    frame_size: Option<(u32, u32)>,
    loop_finished: bool,
}

impl OverlayView {
    fn new(
        display_rx: Receiver<DisplayUpdate>,
        command_tx: Sender<Command>,
        cx: &mut Context<'_, Self>,
    ) -> Self {
        Self {
            display_rx,
            command_tx,
            focus_handle: cx.focus_handle(),
            latest_image: None,
            latest_status: None,
            frame_size: None,
            loop_finished: false,
        }
    }

    fn on_key_down(
        &mut self,
        event: &KeyDownEvent,
        _: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        let Some(command) = Command::from_key(&event.keystroke.key) else {
            return;
        };
        if self.command_tx.send(command).is_err() {
            log::warn!("overlay loop is gone, dropping {command:?}");
        }
        cx.stop_propagation();
    }
}

impl Render for OverlayView {
    fn render(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> impl gpui::IntoElement {
        cx.defer_in(window, |_, _, cx| {
            cx.notify();
        });

        self.poll_display(window, cx);
        self.render_main(cx)
    }
}

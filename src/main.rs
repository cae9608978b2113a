#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod config;
mod model_download;
mod pipeline;
mod types;
mod ui;

use std::process::ExitCode;

use anyhow::anyhow;
use crossbeam_channel::bounded;
use gpui::Application;

use config::AppConfig;
use pipeline::hud::CONTROLS;

fn main() -> ExitCode {
    let (config, config_path) = match AppConfig::load() {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    match &config_path {
        Some(path) => log::info!("configuration loaded from {}", path.display()),
        None => log::info!("no configuration file found, using defaults"),
    }
    log::info!(
        "camera {} at {}x{} @ {} fps, pose {} (complexity {}), hands {} (max {}), mirror {}",
        config.camera.index,
        config.camera.width,
        config.camera.height,
        config.camera.fps,
        config.pose.enabled,
        config.pose.model_complexity,
        config.hands.enabled,
        config.hands.max_hands,
        config.mirror
    );

    let models = match model_download::ensure_models_ready(
        &config.paths.models_dir,
        config.pose.model_complexity,
    ) {
        Ok(models) => models,
        Err(err) => {
            log::error!("models unavailable: {err:?}");
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let (sink, display_rx) = pipeline::display_channel();
    let (ready_tx, ready_rx) = bounded(1);
    let overlay = match pipeline::spawn_overlay_loop(config.clone(), models, sink, ready_tx) {
        Ok(overlay) => overlay,
        Err(err) => {
            log::error!("{err:?}");
            return ExitCode::FAILURE;
        }
    };

    let startup = ready_rx
        .recv()
        .unwrap_or_else(|_| Err(anyhow!("overlay loop exited during startup")));
    match startup {
        Ok(camera_label) => log::info!("using camera: {camera_label}"),
        Err(err) => {
            log::error!("startup failed: {err:?}");
            eprintln!("error: {err:#}");
            log_available_cameras();
            return ExitCode::FAILURE;
        }
    }

    for line in CONTROLS {
        log::info!("{line}");
    }

    let command_tx = overlay.commands();
    let title = config.ui.window_title.clone();
    let mut overlay = Some(overlay);

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            app.on_window_closed(move |cx| {
                if cx.windows().is_empty() {
                    if let Some(overlay) = overlay.take() {
                        overlay.stop();
                    }
                    cx.quit();
                }
            })
            .detach();

            if let Err(err) = ui::launch_ui(app, &title, display_rx, command_tx) {
                eprintln!("failed to launch ui: {err:?}");
                app.quit();
            }
        });

    ExitCode::SUCCESS
}

fn log_available_cameras() {
    match pipeline::available_cameras() {
        Ok(cameras) if cameras.is_empty() => log::error!("no cameras detected"),
        Ok(cameras) => {
            for camera in cameras {
                log::error!("available camera {:?}: {}", camera.index, camera.label);
            }
        }
        Err(err) => log::error!("failed to enumerate cameras: {err:?}"),
    }
}

pub mod camera;
pub mod detect;
pub mod fps;
pub mod hud;
pub mod overlay_loop;
pub mod rgba_converter;
pub mod screenshot;
pub mod skeleton;

// Re-exports for convenience
pub use camera::available_cameras;
pub use overlay_loop::{Command, display_channel, spawn as spawn_overlay_loop};

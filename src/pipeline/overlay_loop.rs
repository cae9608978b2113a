use std::{
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossbeam_channel::{
    Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError, bounded, unbounded,
};

use super::{
    camera::CameraHandle,
    detect::{
        self, DetectorToggles, HandEstimator, OrtHandEstimator, OrtPoseEstimator, PoseEstimator,
    },
    fps::FpsCounter,
    hud::Hud,
    screenshot::ScreenshotWriter,
    skeleton::{self, OverlayStyle},
};
use crate::{
    config::AppConfig,
    model_download::ModelPaths,
    types::{Detections, DisplayUpdate, Frame, OverlayStatus},
};

pub const MAX_CONSECUTIVE_CAPTURE_FAILURES: u32 = 10;
const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(20);
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(50);
const DEBUG_STATS_EVERY: u64 = 100;

pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame>;
}

pub trait FrameSink {
    fn publish(&mut self, update: DisplayUpdate);
}

/// Keyboard command sent from the window to the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Screenshot,
    TogglePause,
    ToggleHands,
    ToggleBody,
    ToggleMirror,
}

impl Command {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "escape" | "q" => Some(Command::Quit),
            "s" => Some(Command::Screenshot),
            "p" => Some(Command::TogglePause),
            "h" => Some(Command::ToggleHands),
            "b" => Some(Command::ToggleBody),
            "m" => Some(Command::ToggleMirror),
            _ => None,
        }
    }
}

/// Single-slot display channel where the newest frame replaces a stale one.
pub struct ChannelSink {
    tx: Sender<DisplayUpdate>,
    stale: Receiver<DisplayUpdate>,
}

pub fn display_channel() -> (ChannelSink, Receiver<DisplayUpdate>) {
    let (tx, rx) = bounded(1);
    let sink = ChannelSink {
        tx,
        stale: rx.clone(),
    };
    (sink, rx)
}

impl FrameSink for ChannelSink {
    fn publish(&mut self, mut update: DisplayUpdate) {
        loop {
            match self.tx.try_send(update) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.stale.try_recv();
                    update = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoopStats {
    pub frames: u64,
    pub average_fps: f32,
    pub screenshots: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Clone, Copy, Debug)]
struct LoopState {
    mirror: bool,
    pose_enabled: bool,
    hands_enabled: bool,
    paused: bool,
}

/// Capture, infer, draw and publish, one frame at a time.
pub struct OverlayLoop<S, P, H, K> {
    source: S,
    pose: P,
    hands: H,
    sink: K,
    commands: Receiver<Command>,
    style: OverlayStyle,
    hud: Hud,
    screenshots: ScreenshotWriter,
    state: LoopState,
    debug: bool,
    fps: FpsCounter,
    last_composed: Option<(Frame, OverlayStatus)>,
    stats: LoopStats,
}

impl<S, P, H, K> OverlayLoop<S, P, H, K>
where
    S: FrameSource,
    P: PoseEstimator,
    H: HandEstimator,
    K: FrameSink,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: S,
        pose: P,
        hands: H,
        sink: K,
        commands: Receiver<Command>,
        config: &AppConfig,
        hud: Hud,
        screenshots: ScreenshotWriter,
    ) -> Self {
        Self {
            source,
            pose,
            hands,
            sink,
            commands,
            style: OverlayStyle::from(&config.render),
            hud,
            screenshots,
            state: LoopState {
                mirror: config.mirror,
                pose_enabled: config.pose.enabled,
                hands_enabled: config.hands.enabled,
                paused: false,
            },
            debug: config.debug_mode,
            fps: FpsCounter::default(),
            last_composed: None,
            stats: LoopStats::default(),
        }
    }

    /// Runs until a quit command, a closed command channel or a fatal capture
    /// failure.
    pub fn run(&mut self) -> Result<LoopStats> {
        let started = Instant::now();
        let mut capture_failures = 0u32;

        loop {
            if self.state.paused {
                let flow = match self.commands.recv_timeout(PAUSE_POLL_INTERVAL) {
                    Ok(command) => self.apply(command),
                    Err(RecvTimeoutError::Timeout) => Flow::Continue,
                    Err(RecvTimeoutError::Disconnected) => Flow::Quit,
                };
                if flow == Flow::Quit {
                    break;
                }
                continue;
            }

            match self.source.next_frame() {
                Ok(frame) => {
                    capture_failures = 0;
                    self.process(frame);
                }
                Err(err) => {
                    capture_failures += 1;
                    log::warn!(
                        "frame capture failed ({capture_failures}/{MAX_CONSECUTIVE_CAPTURE_FAILURES}): {err:?}"
                    );
                    if capture_failures >= MAX_CONSECUTIVE_CAPTURE_FAILURES {
                        return Err(err).context(format!(
                            "camera failed {MAX_CONSECUTIVE_CAPTURE_FAILURES} times in a row"
                        ));
                    }
                    thread::sleep(CAPTURE_RETRY_DELAY);
                }
            }

            if self.drain_commands() == Flow::Quit {
                break;
            }
        }

        let elapsed = started.elapsed().as_secs_f32();
        if elapsed > 0.0 {
            self.stats.average_fps = self.stats.frames as f32 / elapsed;
        }
        Ok(self.stats)
    }

    fn process(&mut self, mut frame: Frame) {
        if self.state.mirror {
            frame.mirror_horizontal();
        }

        let toggles = DetectorToggles {
            pose: self.state.pose_enabled,
            hands: self.state.hands_enabled,
        };
        let detections = detect::detect_frame(&frame, toggles, &mut self.pose, &mut self.hands);
        skeleton::draw_detections(&mut frame, &detections, &self.style);

        let fps = self.fps.tick();
        let status = self.status(fps, &detections);
        self.hud.draw(&mut frame, &status);

        self.stats.frames += 1;
        if self.debug && self.stats.frames % DEBUG_STATS_EVERY == 0 {
            log::info!(
                "frame {} | fps {:.1} | pose {} | hands {} | latency {:?}",
                self.stats.frames,
                fps,
                if status.pose_detected { "yes" } else { "no" },
                status.hands_detected,
                frame.timestamp.elapsed()
            );
        }

        self.last_composed = Some((frame.clone(), status.clone()));
        self.sink.publish(DisplayUpdate { frame, status });
    }

    fn status(&self, fps: f32, detections: &Detections) -> OverlayStatus {
        OverlayStatus {
            fps,
            pose_enabled: self.state.pose_enabled,
            hands_enabled: self.state.hands_enabled,
            pose_detected: detections.pose_detected(),
            hands_detected: detections.hands_detected(),
            handedness: detections.hands.iter().map(|h| h.handedness).collect(),
            mirror: self.state.mirror,
            paused: self.state.paused,
        }
    }

    /// Applies everything queued, stopping early after a pause command so
    /// the rest is handled in paused state.
    fn drain_commands(&mut self) -> Flow {
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    if self.apply(command) == Flow::Quit {
                        return Flow::Quit;
                    }
                    if command == Command::TogglePause {
                        return Flow::Continue;
                    }
                }
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => return Flow::Quit,
            }
        }
    }

    fn apply(&mut self, command: Command) -> Flow {
        match command {
            Command::Quit => {
                log::info!("quit requested");
                return Flow::Quit;
            }
            Command::Screenshot => self.save_screenshot(),
            Command::TogglePause => {
                self.state.paused = !self.state.paused;
                if self.state.paused {
                    log::info!("paused");
                    self.publish_paused();
                } else {
                    log::info!("resumed");
                    self.fps.restart();
                }
            }
            Command::ToggleHands => {
                self.state.hands_enabled = !self.state.hands_enabled;
                if !self.state.hands_enabled {
                    self.hands.reset();
                }
                log::info!("hand detection {}", on_off(self.state.hands_enabled));
            }
            Command::ToggleBody => {
                self.state.pose_enabled = !self.state.pose_enabled;
                if !self.state.pose_enabled {
                    self.pose.reset();
                }
                log::info!("pose detection {}", on_off(self.state.pose_enabled));
            }
            Command::ToggleMirror => {
                self.state.mirror = !self.state.mirror;
                log::info!("mirror mode {}", on_off(self.state.mirror));
            }
        }
        Flow::Continue
    }

    fn publish_paused(&mut self) {
        let Some((frame, status)) = &self.last_composed else {
            return;
        };
        let mut frame = frame.clone();
        self.hud.draw_pause_banner(&mut frame);
        let status = OverlayStatus {
            paused: true,
            ..status.clone()
        };
        self.sink.publish(DisplayUpdate { frame, status });
    }

    fn save_screenshot(&mut self) {
        let Some((frame, _)) = &self.last_composed else {
            log::warn!("no frame available for a screenshot yet");
            return;
        };
        match self.screenshots.save(frame) {
            Ok(path) => {
                self.stats.screenshots += 1;
                log::info!("screenshot saved: {}", path.display());
            }
            Err(err) => log::error!("failed to save screenshot: {err:?}"),
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

/// Running overlay loop thread. Dropping the handle asks the loop to quit and
/// waits for it, so the camera is released before the process exits.
#[derive(Debug)]
pub struct OverlayLoopHandle {
    commands: Sender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl OverlayLoopHandle {
    pub fn commands(&self) -> Sender<Command> {
        self.commands.clone()
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.commands.send(Command::Quit);
            let _ = handle.join();
        }
    }
}

impl Drop for OverlayLoopHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Opens the camera and models on a dedicated thread and runs the overlay
/// loop there. `ready` receives the camera label once everything is open,
/// or the error that prevented startup.
pub fn spawn(
    config: AppConfig,
    models: ModelPaths,
    sink: ChannelSink,
    ready: Sender<Result<String>>,
) -> Result<OverlayLoopHandle> {
    let (command_tx, command_rx) = unbounded();

    let handle = thread::Builder::new()
        .name("overlay-loop".to_string())
        .spawn(move || {
            let setup = || -> Result<_> {
                let camera = CameraHandle::open(&config.camera)?;
                let pose = OrtPoseEstimator::new(
                    &models.pose_landmarks,
                    &config.pose,
                    config.smooth_landmarks,
                )?;
                let hands = OrtHandEstimator::new(
                    &models.hand_landmarks,
                    &models.palm_detector,
                    &config.hands,
                    config.smooth_landmarks,
                )?;
                let screenshots = ScreenshotWriter::new(&config.paths.screenshot_dir)?;
                Ok((camera, pose, hands, screenshots))
            };

            let (camera, pose, hands, screenshots) = match setup() {
                Ok(parts) => parts,
                Err(err) => {
                    let _ = ready.send(Err(err));
                    return;
                }
            };
            let _ = ready.send(Ok(camera.label().to_string()));

            let hud = Hud::load(&config.ui, &config.render);
            let mut overlay = OverlayLoop::new(
                camera,
                pose,
                hands,
                sink,
                command_rx,
                &config,
                hud,
                screenshots,
            );
            match overlay.run() {
                Ok(stats) => log::info!(
                    "overlay loop finished: {} frames, {:.2} fps average, {} screenshots",
                    stats.frames,
                    stats.average_fps,
                    stats.screenshots
                ),
                Err(err) => log::error!("overlay loop stopped: {err:?}"),
            }
        })
        .context("failed to spawn overlay loop thread")?;

    Ok(OverlayLoopHandle {
        commands: command_tx,
        handle: Some(handle),
    })
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, fs, path::PathBuf};

    use anyhow::anyhow;

    use super::*;
    use crate::{
        config::{RenderConfig, UiConfig},
        types::{HAND_LANDMARK_COUNT, Hand, Handedness, Landmark, POSE_LANDMARK_COUNT, Pose},
    };

    const WIDTH: u32 = 64;
    const HEIGHT: u32 = 64;
    const BLACK: [u8; 4] = [0, 0, 0, 255];
    // Shoulder line at y = 16, hands centred at (32, 48).
    const SHOULDER_MID: (u32, u32) = (32, 16);
    const HAND_CENTER: (u32, u32) = (32, 48);

    /// Yields black frames and sends scripted commands after given captures.
    struct ScriptedCamera {
        captures: usize,
        script: HashMap<usize, Vec<Command>>,
        commands: Sender<Command>,
        fail: bool,
    }

    impl FrameSource for ScriptedCamera {
        fn next_frame(&mut self) -> Result<Frame> {
            self.captures += 1;
            if self.fail {
                return Err(anyhow!("device unplugged"));
            }
            for command in self.script.remove(&self.captures).unwrap_or_default() {
                self.commands.send(command).unwrap();
            }
            Ok(Frame::new(
                BLACK.repeat((WIDTH * HEIGHT) as usize),
                WIDTH,
                HEIGHT,
            ))
        }
    }

    struct FakePose {
        present: bool,
        resets: usize,
    }

    impl PoseEstimator for FakePose {
        fn estimate(&mut self, _frame: &Frame) -> Result<Option<Pose>> {
            if !self.present {
                return Ok(None);
            }
            let mut landmarks = vec![Landmark::default(); POSE_LANDMARK_COUNT];
            landmarks[11] = Landmark::new(0.25, 0.25, 0.0, 0.9);
            landmarks[12] = Landmark::new(0.75, 0.25, 0.0, 0.9);
            Ok(Pose::from_landmarks(landmarks, 0.9))
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    struct FakeHands {
        count: usize,
        resets: usize,
    }

    impl HandEstimator for FakeHands {
        fn estimate(&mut self, _frame: &Frame) -> Result<Vec<Hand>> {
            let sides = [Handedness::Left, Handedness::Right];
            Ok((0..self.count)
                .map(|i| {
                    Hand::from_landmarks(
                        vec![Landmark::new(0.5, 0.75, 0.0, 1.0); HAND_LANDMARK_COUNT],
                        sides[i % 2],
                        0.9,
                    )
                    .unwrap()
                })
                .collect())
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        updates: Vec<DisplayUpdate>,
    }

    impl FrameSink for CollectingSink {
        fn publish(&mut self, update: DisplayUpdate) {
            self.updates.push(update);
        }
    }

    type TestLoop = OverlayLoop<ScriptedCamera, FakePose, FakeHands, CollectingSink>;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "skeleton-overlay-loop-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn build(
        name: &str,
        pose_present: bool,
        hand_count: usize,
        script: Vec<(usize, Vec<Command>)>,
    ) -> (TestLoop, PathBuf) {
        let (tx, rx) = unbounded();
        let dir = scratch_dir(name);
        let config = AppConfig::default();
        let camera = ScriptedCamera {
            captures: 0,
            script: script.into_iter().collect(),
            commands: tx,
            fail: false,
        };
        let overlay = OverlayLoop::new(
            camera,
            FakePose {
                present: pose_present,
                resets: 0,
            },
            FakeHands {
                count: hand_count,
                resets: 0,
            },
            CollectingSink::default(),
            rx,
            &config,
            Hud::with_font(None, &UiConfig::default(), &RenderConfig::default()),
            ScreenshotWriter::new(&dir).unwrap(),
        );
        (overlay, dir)
    }

    fn pixel(frame: &Frame, (x, y): (u32, u32)) -> [u8; 4] {
        frame.pixel(x, y).unwrap()
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key("escape"), Some(Command::Quit));
        assert_eq!(Command::from_key("Q"), Some(Command::Quit));
        assert_eq!(Command::from_key("s"), Some(Command::Screenshot));
        assert_eq!(Command::from_key("P"), Some(Command::TogglePause));
        assert_eq!(Command::from_key("h"), Some(Command::ToggleHands));
        assert_eq!(Command::from_key("B"), Some(Command::ToggleBody));
        assert_eq!(Command::from_key("m"), Some(Command::ToggleMirror));
        assert_eq!(Command::from_key("x"), None);
        assert_eq!(Command::from_key("space"), None);
    }

    #[test]
    fn channel_sink_keeps_only_the_newest_frame() {
        let (mut sink, rx) = display_channel();
        for fps in [1.0, 2.0, 3.0] {
            sink.publish(DisplayUpdate {
                frame: Frame::new(BLACK.to_vec(), 1, 1),
                status: OverlayStatus {
                    fps,
                    ..OverlayStatus::default()
                },
            });
        }
        assert_eq!(rx.try_recv().unwrap().status.fps, 3.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn nobody_in_view_reports_not_detected() {
        let (mut overlay, dir) = build("empty", false, 0, vec![(1, vec![Command::Quit])]);
        let stats = overlay.run().unwrap();
        assert_eq!(stats.frames, 1);

        let update = &overlay.sink.updates[0];
        assert!(!update.status.pose_detected);
        assert_eq!(update.status.hands_detected, 0);
        assert!(update.frame.rgba.chunks_exact(4).all(|px| px == BLACK));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn hand_counts_translate_to_landmark_counts() {
        for (hands, landmarks) in [(0usize, 0usize), (1, 21), (2, 42)] {
            let mut estimator = FakeHands { count: hands, resets: 0 };
            let detected = detect::detect_frame(
                &Frame::new(BLACK.repeat(4), 2, 2),
                DetectorToggles {
                    pose: false,
                    hands: true,
                },
                &mut FakePose { present: false, resets: 0 },
                &mut estimator,
            );
            assert_eq!(detected.hand_landmark_count(), landmarks);

            let (mut overlay, dir) = build("hands", false, hands, vec![(1, vec![Command::Quit])]);
            overlay.run().unwrap();
            let status = &overlay.sink.updates[0].status;
            assert_eq!(status.hands_detected, hands);
            assert_eq!(status.handedness.len(), hands);
            fs::remove_dir_all(dir).unwrap();
        }
    }

    #[test]
    fn toggles_only_affect_their_own_overlay() {
        let (mut overlay, dir) = build(
            "toggles",
            true,
            1,
            vec![
                (1, vec![Command::ToggleHands]),
                (2, vec![Command::ToggleBody]),
                (3, vec![Command::ToggleHands]),
                (4, vec![Command::Quit]),
            ],
        );
        overlay.run().unwrap();
        let style = OverlayStyle::default();
        let updates = &overlay.sink.updates;
        assert_eq!(updates.len(), 4);

        // Both overlays.
        assert_eq!(pixel(&updates[0].frame, SHOULDER_MID), style.skeleton_color);
        assert_eq!(pixel(&updates[0].frame, HAND_CENTER), style.landmark_color);
        // Hands off, body untouched.
        assert_eq!(pixel(&updates[1].frame, SHOULDER_MID), style.skeleton_color);
        assert_eq!(pixel(&updates[1].frame, HAND_CENTER), BLACK);
        assert!(!updates[1].status.hands_enabled);
        assert!(updates[1].status.pose_enabled);
        // Both off: raw video.
        assert!(updates[2].frame.rgba.chunks_exact(4).all(|px| px == BLACK));
        assert!(!updates[2].status.pose_detected);
        // Hands back, body still off.
        assert_eq!(pixel(&updates[3].frame, SHOULDER_MID), BLACK);
        assert_eq!(pixel(&updates[3].frame, HAND_CENTER), style.landmark_color);
        assert_eq!(updates[3].status.hands_detected, 1);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn disabling_a_detector_drops_its_tracking() {
        let (mut overlay, dir) = build(
            "tracking-reset",
            true,
            1,
            vec![
                (1, vec![Command::ToggleBody]),
                (2, vec![Command::ToggleBody, Command::ToggleHands]),
                (3, vec![Command::ToggleMirror]),
                (4, vec![Command::Quit]),
            ],
        );
        overlay.run().unwrap();
        // Only turning a detector off resets it.
        assert_eq!(overlay.pose.resets, 1);
        assert_eq!(overlay.hands.resets, 1);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn pause_freezes_capture_but_keeps_handling_commands() {
        let (mut overlay, dir) = build(
            "pause",
            true,
            0,
            vec![
                (
                    1,
                    vec![
                        Command::TogglePause,
                        Command::Screenshot,
                        Command::TogglePause,
                    ],
                ),
                (2, vec![Command::Quit]),
            ],
        );
        let stats = overlay.run().unwrap();
        assert_eq!(overlay.source.captures, 2);
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.screenshots, 1);

        // Live frame, the paused republish, then the next live frame.
        let updates = &overlay.sink.updates;
        assert_eq!(updates.len(), 3);
        assert!(!updates[0].status.paused);
        assert!(updates[1].status.paused);
        assert_eq!(updates[1].frame.rgba, updates[0].frame.rgba);
        assert!(!updates[2].status.paused);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn each_screenshot_press_writes_one_png() {
        let (mut overlay, dir) = build(
            "screenshots",
            true,
            0,
            vec![
                (1, vec![Command::Screenshot, Command::Screenshot]),
                (2, vec![Command::Quit]),
            ],
        );
        let stats = overlay.run().unwrap();
        assert_eq!(stats.screenshots, 2);

        let files: Vec<PathBuf> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(files.len(), 2);
        let skeleton_color = OverlayStyle::default().skeleton_color;
        for file in files {
            assert_eq!(file.extension().and_then(|e| e.to_str()), Some("png"));
            let image = image::open(&file).unwrap().to_rgba8();
            let (x, y) = SHOULDER_MID;
            assert_eq!(image.get_pixel(x, y).0, skeleton_color);
        }
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn screenshot_without_frame_writes_nothing() {
        let (mut overlay, dir) = build("no-frame", true, 0, Vec::new());
        overlay.apply(Command::Screenshot);
        assert_eq!(overlay.stats.screenshots, 0);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn closed_command_channel_ends_the_loop() {
        let (mut overlay, dir) = build("closed", false, 0, Vec::new());
        let (_, rx) = unbounded();
        overlay.commands = rx;
        let stats = overlay.run().unwrap();
        assert_eq!(stats.frames, 1);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn repeated_capture_failures_are_fatal() {
        let (mut overlay, dir) = build("failing", false, 0, Vec::new());
        overlay.source.fail = true;
        assert!(overlay.run().is_err());
        assert_eq!(
            overlay.source.captures,
            MAX_CONSECUTIVE_CAPTURE_FAILURES as usize
        );
        fs::remove_dir_all(dir).unwrap();
    }
}

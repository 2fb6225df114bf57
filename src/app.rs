use std::sync::Arc;

use instant::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use glowmap::amenity::Category;
use glowmap::config::Config;
use glowmap::overlay::{HeatmapOverlay, OverlayProps};
use glowmap::surface::Canvas;
use glowmap::viewport::{EventHub, MapViewport, ViewportEvent};

use crate::demo::basemap;
use crate::demo::camera::Camera;
use crate::demo::data;
use crate::render::GpuState;

/// Arrow-key pan step in pixels.
const PAN_STEP: f64 = 48.0;
/// Zoom step per wheel line or +/- press.
const ZOOM_STEP: f64 = 0.5;
/// Splat radius nudge per keypress.
const RADIUS_STEP: f32 = 6.0;
/// Intensity nudge per keypress.
const INTENSITY_STEP: f32 = 0.1;
/// How often to log frame stats (seconds).
const FPS_LOG_INTERVAL: f64 = 5.0;

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    frames_since_log: u32,
    last_log_time: Instant,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            frames_since_log: 0,
            last_log_time: Instant::now(),
        }
    }

    fn record_frame(&mut self, heat_passes: u64) {
        self.frame_count += 1;
        self.frames_since_log += 1;

        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        if elapsed >= FPS_LOG_INTERVAL {
            let fps = self.frames_since_log as f64 / elapsed;
            log::info!(
                "presented {:.1} frames/s | total frames {} | heat passes {}",
                fps,
                self.frame_count,
                heat_passes,
            );
            self.last_log_time = Instant::now();
            self.frames_since_log = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level demo state: a Mercator camera playing the map widget, the
/// heat overlay subscribed to it, and a CPU-composited frame pushed to
/// the GPU. The loop is fully event-driven; between events it parks on
/// the overlay's next render deadline.
struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,

    cfg: Config,
    camera: Camera,
    hub: EventHub,
    overlay: HeatmapOverlay,
    props: OverlayProps,

    // CPU compositing scratch, reused every frame
    frame: Vec<u8>,

    cursor: (f64, f64),
    dragging: Option<(f64, f64)>,

    frame_stats: FrameStats,
}

impl App {
    fn new() -> Self {
        let cfg = Config::load(Config::DEFAULT_PATH);
        let camera = Camera::new(&cfg.camera, cfg.window.width, cfg.window.height);

        let amenities = data::generate(&cfg.data, camera.center());
        log::info!(
            "generated {} amenities around {:.4},{:.4}",
            amenities.len(),
            camera.center().lat,
            camera.center().lng,
        );

        let overlay = HeatmapOverlay::new(&cfg);
        let mut props = OverlayProps::new(amenities);
        props.radius_px = cfg.overlay.base_radius_px;
        props.intensity = cfg.overlay.intensity;

        Self {
            window: None,
            gpu: None,
            cfg,
            camera,
            hub: EventHub::new(),
            overlay,
            props,
            frame: Vec::new(),
            cursor: (0.0, 0.0),
            dragging: None,
            frame_stats: FrameStats::new(),
        }
    }

    fn request_redraw(&self) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn publish(&mut self, event: ViewportEvent) {
        self.hub.publish(event);
        self.request_redraw();
    }

    /// Push the current prop snapshot into the overlay.
    fn apply_props(&mut self) {
        self.overlay.set_props(&self.props, Instant::now());
        self.request_redraw();
    }

    fn toggle_category(&mut self, index: usize) {
        let cat = Category::ALL[index];
        let enabled = if self.props.selected.remove(&cat) {
            false
        } else {
            self.props.selected.insert(cat);
            true
        };
        log::info!(
            "category {} {}",
            cat.label(),
            if enabled { "on" } else { "off" }
        );
        self.apply_props();
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::ArrowLeft => {
                self.camera.pan_px(-PAN_STEP, 0.0);
                self.publish(ViewportEvent::Moved);
            }
            KeyCode::ArrowRight => {
                self.camera.pan_px(PAN_STEP, 0.0);
                self.publish(ViewportEvent::Moved);
            }
            KeyCode::ArrowUp => {
                self.camera.pan_px(0.0, -PAN_STEP);
                self.publish(ViewportEvent::Moved);
            }
            KeyCode::ArrowDown => {
                self.camera.pan_px(0.0, PAN_STEP);
                self.publish(ViewportEvent::Moved);
            }
            KeyCode::Equal | KeyCode::NumpadAdd => self.zoom(ZOOM_STEP),
            KeyCode::Minus | KeyCode::NumpadSubtract => self.zoom(-ZOOM_STEP),
            KeyCode::KeyV => {
                self.props.visible = !self.props.visible;
                log::info!("overlay {}", if self.props.visible { "shown" } else { "hidden" });
                self.apply_props();
            }
            KeyCode::KeyR => self.nudge_radius(RADIUS_STEP),
            KeyCode::KeyF => self.nudge_radius(-RADIUS_STEP),
            KeyCode::KeyE => self.nudge_intensity(INTENSITY_STEP),
            KeyCode::KeyQ => self.nudge_intensity(-INTENSITY_STEP),
            KeyCode::Digit1 => self.toggle_category(0),
            KeyCode::Digit2 => self.toggle_category(1),
            KeyCode::Digit3 => self.toggle_category(2),
            KeyCode::Digit4 => self.toggle_category(3),
            KeyCode::Digit5 => self.toggle_category(4),
            KeyCode::Digit6 => self.toggle_category(5),
            KeyCode::Digit7 => self.toggle_category(6),
            KeyCode::Digit8 => self.toggle_category(7),
            _ => {}
        }
    }

    fn zoom(&mut self, delta: f64) {
        self.camera.zoom_by(delta);
        self.publish(ViewportEvent::Zoomed {
            zoom: self.camera.zoom(),
        });
    }

    fn nudge_radius(&mut self, delta: f32) {
        self.props.radius_px = (self.props.radius_px + delta).clamp(10.0, 200.0);
        log::info!("splat radius {:.0}px", self.props.radius_px);
        self.apply_props();
    }

    fn nudge_intensity(&mut self, delta: f32) {
        self.props.intensity = (self.props.intensity + delta).clamp(0.1, 2.0);
        log::info!("intensity scale {:.2}", self.props.intensity);
        self.apply_props();
    }

    /// Pump the overlay, composite basemap + heat canvas, present.
    fn redraw(&mut self) {
        let now = Instant::now();
        self.overlay.update(&mut self.hub, &self.camera, now);

        basemap::render(&mut self.frame, &self.camera);

        let (w, h) = self.camera.size_px();
        let canvas = self.overlay.canvas();
        // skip the heat layer while its canvas is stale-sized (mid-resize)
        if canvas.width() == w && canvas.height() == h {
            composite_over(&mut self.frame, canvas);
        }

        if let Some(gpu) = &mut self.gpu {
            gpu.upload_frame(&self.frame, w, h);
            gpu.render_frame();
        }

        self.frame_stats.record_frame(self.overlay.passes());
    }
}

/// Source-over blend of the straight-alpha heat canvas onto the opaque
/// basemap frame.
fn composite_over(dst: &mut [u8], overlay: &Canvas) {
    for (d, s) in dst.chunks_exact_mut(4).zip(overlay.pixels().chunks_exact(4)) {
        let a = s[3] as u32;
        if a == 0 {
            continue;
        }
        let inv = 255 - a;
        d[0] = ((s[0] as u32 * a + d[0] as u32 * inv + 127) / 255) as u8;
        d[1] = ((s[1] as u32 * a + d[1] as u32 * inv + 127) / 255) as u8;
        d[2] = ((s[2] as u32 * a + d[2] as u32 * inv + 127) / 255) as u8;
        d[3] = 255;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("glowmap demo")
            .with_inner_size(LogicalSize::new(
                self.cfg.window.width,
                self.cfg.window.height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("failed to create window"),
        );

        let size = window.inner_size();
        self.camera.set_size(size.width, size.height);
        log::info!("window created: {}x{}", size.width, size.height);

        let gpu = GpuState::new(window.clone());
        self.gpu = Some(gpu);
        log::info!("wgpu + frame pipeline initialized");

        self.overlay.mount(&mut self.hub);
        self.overlay.set_props(&self.props, Instant::now());
        log::info!(
            "overlay mounted with {} sources",
            self.overlay.source_count()
        );

        // Event-driven: redraws come from input and scheduler deadlines.
        event_loop.set_control_flow(ControlFlow::Wait);
        window.request_redraw();

        self.window = Some(window);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Park until the overlay's trailing-edge deadline, if one is armed.
        match self.overlay.next_wakeup() {
            Some(deadline) => {
                if deadline <= Instant::now() {
                    self.request_redraw();
                    event_loop.set_control_flow(ControlFlow::Wait);
                } else {
                    event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
                }
            }
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                self.overlay.unmount(&mut self.hub);
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
                self.camera.set_size(new_size.width, new_size.height);
                self.publish(ViewportEvent::Resized {
                    width: new_size.width,
                    height: new_size.height,
                });
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.state == ElementState::Pressed {
                    if let PhysicalKey::Code(code) = key_event.physical_key {
                        if code == KeyCode::Escape {
                            log::info!("ESC pressed, exiting");
                            self.overlay.unmount(&mut self.hub);
                            event_loop.exit();
                            return;
                        }
                        self.handle_key(code);
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y as f64,
                    MouseScrollDelta::PixelDelta(pos) => pos.y / 40.0,
                };
                if lines != 0.0 {
                    self.zoom(lines * ZOOM_STEP);
                }
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.dragging = match state {
                    ElementState::Pressed => Some(self.cursor),
                    ElementState::Released => None,
                };
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
                if let Some(last) = self.dragging {
                    let dx = position.x - last.0;
                    let dy = position.y - last.1;
                    // drag moves the map with the cursor
                    self.camera.pan_px(-dx, -dy);
                    self.dragging = Some(self.cursor);
                    self.publish(ViewportEvent::Moved);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }
}

/// Entry point: create the event loop and run the app.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}

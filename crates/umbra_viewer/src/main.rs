mod host;

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use host::Host;
use umbra_march::Shading;
use umbra_viewer::{demo_camera, demo_scene, MarchArgs};

/// Interactive sphere-tracing viewer.
#[derive(Debug, Parser)]
#[command(name = "umbra_viewer", version, about)]
struct Cli {
    #[command(flatten)]
    march: MarchArgs,

    /// Offscreen resolution relative to the window
    #[arg(long, default_value_t = 0.5)]
    scale: f32,
}

/// Application state
struct App {
    cli: Cli,
    window: Option<std::sync::Arc<Window>>,
    host: Option<Host>,

    // Input state
    left_mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    last_stats_log: Instant,
}

impl App {
    fn new(cli: Cli) -> Self {
        Self {
            cli,
            window: None,
            host: None,
            left_mouse_pressed: false,
            last_mouse_pos: None,
            last_stats_log: Instant::now(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title("Umbra Viewer")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.cli.march.width,
                self.cli.march.height,
            ));

        let window = std::sync::Arc::new(event_loop.create_window(window_attrs)?);

        let host = pollster::block_on(Host::new(
            window.clone(),
            self.cli.march.config(self.cli.march.resolution()),
            self.cli.march.shading.into(),
            self.cli.scale,
            demo_scene(),
            demo_camera(),
        ))?;

        self.window = Some(window);
        self.host = Some(host);
        Ok(())
    }
}

/// Shading bound to the number keys.
fn shading_for_key(keycode: KeyCode) -> Option<Shading> {
    match keycode {
        KeyCode::Digit1 => Some(Shading::default()),
        KeyCode::Digit2 => Some(Shading::Normals),
        KeyCode::Digit3 => Some(Shading::Steps),
        KeyCode::Digit4 => Some(Shading::Depth),
        _ => None,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            match self.init(event_loop) {
                Ok(()) => log::info!("Window and host initialized"),
                Err(e) => {
                    log::error!("Failed to initialize: {:#}", e);
                    event_loop.exit();
                }
            }
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
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(host) = &mut self.host {
                    match host.resize((physical_size.width, physical_size.height)) {
                        Ok(()) => log::info!(
                            "Resized to {}x{}",
                            physical_size.width,
                            physical_size.height
                        ),
                        Err(e) => log::warn!("Keeping previous offscreen size: {:#}", e),
                    }
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.left_mouse_pressed = state == ElementState::Pressed;
                if !self.left_mouse_pressed {
                    self.last_mouse_pos = None;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.left_mouse_pressed {
                    if let (Some(last_pos), Some(host)) = (self.last_mouse_pos, &mut self.host) {
                        let sensitivity = 0.005;
                        host.orbit(
                            -(position.x - last_pos.0) as f32 * sensitivity,
                            (position.y - last_pos.1) as f32 * sensitivity,
                        );
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(host) = &mut self.host {
                    let scroll_amount = match delta {
                        winit::event::MouseScrollDelta::LineDelta(_, y) => y * 0.5,
                        winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
                    };
                    host.dolly(scroll_amount);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(keycode),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if keycode == KeyCode::Escape {
                    event_loop.exit();
                } else if let Some(shading) = shading_for_key(keycode) {
                    if let Some(host) = &mut self.host {
                        host.set_shading(shading);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(host) = &mut self.host {
                    let clear_color = wgpu::Color {
                        r: 0.1,
                        g: 0.2,
                        b: 0.3,
                        a: 1.0,
                    };

                    if let Err(e) = host.render(clear_color) {
                        if let Some(surface_err) = e.downcast_ref::<wgpu::SurfaceError>() {
                            match surface_err {
                                wgpu::SurfaceError::Lost => host.reconfigure(),
                                wgpu::SurfaceError::OutOfMemory => {
                                    log::error!("Out of memory!");
                                    event_loop.exit();
                                }
                                _ => {
                                    log::error!("Surface error: {:?}", surface_err);
                                }
                            }
                        } else {
                            log::error!("Render error: {:#}", e);
                            event_loop.exit();
                        }
                    }

                    if self.last_stats_log.elapsed().as_secs_f32() >= 2.0 {
                        let stats = host.stats();
                        log::debug!(
                            "Offscreen pass: {} hits, {:.1} mean steps, {:.2?}",
                            stats.hits,
                            stats.mean_steps(),
                            stats.elapsed
                        );
                        self.last_stats_log = Instant::now();
                    }
                }

                // Request next frame
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    log::info!("Starting Umbra Viewer");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(cli);

    log::info!("Running event loop");
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_keys_select_shading() {
        assert_eq!(shading_for_key(KeyCode::Digit1), Some(Shading::default()));
        assert_eq!(shading_for_key(KeyCode::Digit3), Some(Shading::Steps));
        assert_eq!(shading_for_key(KeyCode::KeyW), None);
    }

    #[test]
    fn test_cli_scale_default() {
        let cli = Cli::parse_from(["umbra_viewer"]);
        assert_eq!(cli.scale, 0.5);
    }
}

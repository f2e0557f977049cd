//! Windowed runner.
//!
//! Owns a winit event loop, one window surface, and one
//! [`ParticleSystem`]. Each `RedrawRequested` performs exactly one
//! simulate+render step and then requests the next frame, so the redraw
//! queue is the scheduling primitive: not requesting again is how the
//! loop stops (time limit, render failure, disposal). Pointer events are
//! forwarded as they arrive and read once per frame by the simulator.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::ParticleSystemConfig;
use crate::error::{RenderError, RunError};
use crate::gpu::GpuState;
use crate::system::ParticleSystem;
use crate::time::FrameClock;

/// Run a particle system in its own window until the window closes.
/// Blocks the calling thread.
pub fn run_window(config: ParticleSystemConfig) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct App {
    config: ParticleSystemConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    system: Option<ParticleSystem>,
    clock: FrameClock,
    cursor: (f32, f32),
    /// Set when a render pass failed; the loop stops but state stays
    /// valid for inspection or disposal.
    halted: bool,
}

impl App {
    fn new(config: ParticleSystemConfig) -> Self {
        Self {
            config,
            window: None,
            gpu: None,
            system: None,
            clock: FrameClock::new(),
            cursor: (0.0, 0.0),
            halted: false,
        }
    }

    fn scale_factor(&self) -> f32 {
        self.window
            .as_ref()
            .map(|w| w.scale_factor() as f32)
            .unwrap_or(1.0)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.halted {
            return;
        }
        let (Some(window), Some(gpu), Some(system)) =
            (&self.window, &mut self.gpu, &mut self.system)
        else {
            return;
        };

        // Deferred viewport: re-measure the window when the retry fires.
        if system.poll_size_retry() {
            let size = window.inner_size();
            let scale = window.scale_factor() as f32;
            system.resize(size.width as f32 / scale, size.height as f32 / scale);
        }

        let dt = self.clock.tick();
        let outcome = system.advance(dt);
        let plan = system.plan_frame();

        match gpu.render(&plan) {
            Ok(()) => {
                if outcome == crate::sim::StepOutcome::Running {
                    window.request_redraw();
                } else {
                    log::info!("time limit reached; frame loop stopped");
                }
            }
            Err(RenderError::Surface(wgpu::SurfaceError::Lost)) => {
                gpu.resize(
                    winit::dpi::PhysicalSize {
                        width: gpu.config.width,
                        height: gpu.config.height,
                    },
                    window.scale_factor() as f32,
                );
                window.request_redraw();
            }
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("surface out of memory; exiting");
                event_loop.exit();
            }
            Err(e) => {
                // Stop the loop and surface the diagnostic; particle
                // state remains a valid snapshot.
                log::error!("render pass failed, stopping frame loop: {}", e);
                self.halted = true;
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("Plexa")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("{}", RunError::from(e));
                event_loop.exit();
                return;
            }
        };

        let gpu = match pollster::block_on(GpuState::new(window.clone())) {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("{}", RunError::from(e));
                event_loop.exit();
                return;
            }
        };

        let scale = window.scale_factor() as f32;
        let size = window.inner_size();
        let mut system = ParticleSystem::new(
            self.config.clone(),
            size.width as f32 / scale,
            size.height as f32 / scale,
        );
        system.set_scale_factor(scale);

        self.window = Some(window.clone());
        self.gpu = Some(gpu);
        self.system = Some(system);
        self.clock.reset();
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                // Drop order disposes the system before the surface goes.
                self.system = None;
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                let scale = self.scale_factor();
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size, scale);
                }
                if let Some(system) = &mut self.system {
                    system.resize(
                        physical_size.width as f32 / scale,
                        physical_size.height as f32 / scale,
                    );
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(system) = &mut self.system {
                    system.set_scale_factor(scale_factor as f32);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let scale = self.scale_factor();
                let x = position.x as f32 / scale;
                let y = position.y as f32 / scale;
                self.cursor = (x, y);
                if let Some(system) = &mut self.system {
                    system.pointer_moved(x, y);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(system) = &mut self.system {
                    system.pointer_left();
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left && state == ElementState::Pressed {
                    if let Some(system) = &mut self.system {
                        system.clicked(self.cursor.0, self.cursor.1);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}

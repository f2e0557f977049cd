//! Error types for Plexa.
//!
//! This module covers GPU initialization, per-frame rendering, and the
//! windowed runner. Configuration is deliberately error-free: malformed
//! config fields fall back to defaults during normalization instead of
//! surfacing here.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors raised by a frame's render pass.
///
/// Any of these stops the frame loop; the simulation snapshot stays
/// valid so the host can retry or dispose cleanly.
#[derive(Debug)]
pub enum RenderError {
    /// The swapchain surface rejected the frame.
    Surface(wgpu::SurfaceError),
    /// The glyph pass failed to prepare or draw text shapes.
    Text(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Surface(e) => write!(f, "Surface error during render pass: {}", e),
            RenderError::Text(msg) => write!(f, "Text pass failed: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Surface(e) => Some(e),
            RenderError::Text(_) => None,
        }
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(e: wgpu::SurfaceError) -> Self {
        RenderError::Surface(e)
    }
}

/// Errors that can occur when running the windowed loop.
#[derive(Debug)]
pub enum RunError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            RunError::Window(e) => write!(f, "Failed to create window: {}", e),
            RunError::Gpu(e) => write!(f, "GPU error: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::EventLoop(e) => Some(e),
            RunError::Window(e) => Some(e),
            RunError::Gpu(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for RunError {
    fn from(e: winit::error::EventLoopError) -> Self {
        RunError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for RunError {
    fn from(e: winit::error::OsError) -> Self {
        RunError::Window(e)
    }
}

impl From<GpuError> for RunError {
    fn from(e: GpuError) -> Self {
        RunError::Gpu(e)
    }
}

//! wgpu backend: draws frame plans onto a window surface.
//!
//! Two pipelines share one shader module: an instanced quad pipeline for
//! every shape (backdrop, glow halos, fills, text boxes) and a line-list
//! pipeline for connections. Text-shaped particles go through the
//! glyphon pass in [`text::TextPass`], drawn last so labels stay on top.
//!
//! The simulation works in logical pixels; the shader maps them to clip
//! space via a uniform holding the logical surface size, and the backing
//! store itself is allocated at physical (scale-factor) resolution.

mod text;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::{GpuError, RenderError};
use crate::render::{FramePlan, LinkVertex, ShapeInstance, SHAPE_RECT_TAG};
use text::TextPass;

const SHADER_SOURCE: &str = include_str!("shader.wgsl");

const SHAPE_ATTRS: [wgpu::VertexAttribute; 9] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32,
    2 => Float32,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32,
    6 => Float32,
    7 => Uint32,
    8 => Float32,
];

const LINK_ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x4,
];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    surface_size: [f32; 2],
    _pad: [f32; 2],
}

/// A vertex buffer that grows in powers of two as plans get bigger.
struct GrowableBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    label: &'static str,
}

impl GrowableBuffer {
    fn new(device: &wgpu::Device, label: &'static str) -> Self {
        let capacity = 4096;
        Self {
            buffer: Self::allocate(device, label, capacity),
            capacity,
            label,
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[u8]) {
        let needed = data.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.capacity);
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, data);
        }
    }
}

/// GPU resources bound to one window surface.
pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    shape_pipeline: wgpu::RenderPipeline,
    link_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    instances: GrowableBuffer,
    links: GrowableBuffer,
    text_pass: TextPass,
    scale_factor: f32,
    /// The trail path loads the previous frame; the very first frame has
    /// nothing to load and must clear instead.
    first_frame: bool,
}

impl GpuState {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor() as f32;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let globals = Globals {
            surface_size: [
                size.width as f32 / scale_factor,
                size.height as f32 / scale_factor,
            ],
            _pad: [0.0; 2],
        };
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Plan Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Plan Pipeline Layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let shape_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shape Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_shape"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ShapeInstance>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &SHAPE_ATTRS,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_shape"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let link_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Link Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_link"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LinkVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &LINK_ATTRS,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_link"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let text_pass = TextPass::new(&device, &queue, config.format);
        let instances = GrowableBuffer::new(&device, "Shape Instance Buffer");
        let links = GrowableBuffer::new(&device, "Link Vertex Buffer");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            shape_pipeline,
            link_pipeline,
            globals_buffer,
            globals_bind_group,
            instances,
            links,
            text_pass,
            scale_factor,
            first_frame: true,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>, scale_factor: f32) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.scale_factor = scale_factor.max(0.1);
            self.surface.configure(&self.device, &self.config);
            self.first_frame = true;
        }
    }

    /// Draw one frame plan. On error the caller stops the loop; nothing
    /// here mutates simulation state.
    pub fn render(&mut self, plan: &FramePlan) -> Result<(), RenderError> {
        let globals = Globals {
            surface_size: [plan.width, plan.height],
            _pad: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        // The backdrop is just one more rect instance, drawn first.
        let mut instances: Vec<ShapeInstance> = Vec::with_capacity(plan.instances.len() + 1);
        if let Some(backdrop) = plan.backdrop {
            instances.push(backdrop_instance(plan, backdrop));
        }
        instances.extend_from_slice(&plan.instances);

        self.instances
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&instances));
        self.links
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&plan.links));
        self.text_pass.prepare(
            &self.device,
            &self.queue,
            &plan.texts,
            (self.config.width, self.config.height),
            self.scale_factor,
        )?;

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let load = if plan.trail && !self.first_frame {
                wgpu::LoadOp::Load
            } else {
                wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !instances.is_empty() {
                pass.set_pipeline(&self.shape_pipeline);
                pass.set_bind_group(0, &self.globals_bind_group, &[]);
                pass.set_vertex_buffer(0, self.instances.buffer.slice(..));
                pass.draw(0..6, 0..instances.len() as u32);
            }

            if !plan.links.is_empty() {
                pass.set_pipeline(&self.link_pipeline);
                pass.set_bind_group(0, &self.globals_bind_group, &[]);
                pass.set_vertex_buffer(0, self.links.buffer.slice(..));
                pass.draw(0..plan.links.len() as u32, 0..1);
            }

            if !plan.texts.is_empty() {
                self.text_pass.render(&mut pass)?;
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.text_pass.trim();
        self.first_frame = false;

        Ok(())
    }
}

fn backdrop_instance(plan: &FramePlan, color: [f32; 4]) -> ShapeInstance {
    let half_h = plan.height * 0.5;
    ShapeInstance {
        center: [plan.width * 0.5, plan.height * 0.5],
        size: half_h,
        rotation: 0.0,
        fill_color: color,
        border_color: [0.0; 4],
        border_width: 0.0,
        softness: 0.0,
        shape: SHAPE_RECT_TAG,
        param: plan.width / plan.height.max(0.001),
    }
}

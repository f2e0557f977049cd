//! Glyph rendering for text-shaped particles.
//!
//! Wraps glyphon: one font system, swash cache, atlas and renderer per
//! GPU state. Each frame the pending [`TextDraw`]s are shaped into
//! temporary buffers, centered on their particles in physical pixels,
//! and drawn inside the main render pass.

use glyphon::{
    Attrs, Buffer, Cache, Color, Family, FontSystem, Metrics, Resolution, Shaping, SwashCache,
    TextArea, TextAtlas, TextBounds, TextRenderer, Viewport,
};

use crate::error::RenderError;
use crate::render::TextDraw;

pub struct TextPass {
    font_system: FontSystem,
    swash_cache: SwashCache,
    viewport: Viewport,
    atlas: TextAtlas,
    renderer: TextRenderer,
}

impl TextPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
    ) -> Self {
        let cache = Cache::new(device);
        let viewport = Viewport::new(device, &cache);
        let mut atlas = TextAtlas::new(device, queue, &cache, format);
        let renderer =
            TextRenderer::new(&mut atlas, device, wgpu::MultisampleState::default(), None);
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            viewport,
            atlas,
            renderer,
        }
    }

    /// Shape and upload this frame's glyph runs. `scale` maps the plan's
    /// logical coordinates onto the physical surface.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texts: &[TextDraw],
        physical: (u32, u32),
        scale: f32,
    ) -> Result<(), RenderError> {
        self.viewport.update(
            queue,
            Resolution {
                width: physical.0,
                height: physical.1,
            },
        );
        if texts.is_empty() {
            // Nothing to shape; the caller skips the glyph draw entirely.
            return Ok(());
        }

        let mut buffers = Vec::with_capacity(texts.len());
        for text in texts {
            let px = text.px * scale;
            let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(px, px * 1.2));
            buffer.set_size(&mut self.font_system, None, None);
            buffer.set_text(
                &mut self.font_system,
                &text.content,
                Attrs::new().family(Family::SansSerif),
                Shaping::Advanced,
            );
            buffer.shape_until_scroll(&mut self.font_system, false);
            buffers.push(buffer);
        }

        let bounds = TextBounds {
            left: 0,
            top: 0,
            right: physical.0 as i32,
            bottom: physical.1 as i32,
        };
        let areas = texts.iter().zip(&buffers).map(|(text, buffer)| {
            let width = buffer
                .layout_runs()
                .map(|run| run.line_w)
                .fold(0.0_f32, f32::max);
            let line_height = buffer.metrics().line_height;
            let [r, g, b, a] = text.color;
            TextArea {
                buffer,
                left: text.center[0] * scale - width * 0.5,
                top: text.center[1] * scale - line_height * 0.5,
                scale: 1.0,
                bounds,
                default_color: Color::rgba(
                    (r * 255.0) as u8,
                    (g * 255.0) as u8,
                    (b * 255.0) as u8,
                    (a * 255.0) as u8,
                ),
                custom_glyphs: &[],
            }
        });

        self.renderer
            .prepare(
                device,
                queue,
                &mut self.font_system,
                &mut self.atlas,
                &self.viewport,
                areas,
                &mut self.swash_cache,
            )
            .map_err(|e| RenderError::Text(e.to_string()))
    }

    /// Draw the prepared glyphs. Must run inside the frame's render pass,
    /// after shapes and links so labels sit on top.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), RenderError> {
        self.renderer
            .render(&self.atlas, &self.viewport, pass)
            .map_err(|e| RenderError::Text(e.to_string()))
    }

    /// Drop atlas entries unused since the last frame.
    pub fn trim(&mut self) {
        self.atlas.trim();
    }
}

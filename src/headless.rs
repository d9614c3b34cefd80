// headless.rs
//! Rendering into a texture without a window, with pixel readback.

use glam::Mat4;
use crate::{
    error::{Error, Result},
    mesh::Mesh,
    pipeline::{PipelineOptions, VertexStagePipeline},
};

pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl Image {
    /// `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }
}

// Bytes per padded row and total readback size. Rows of a texture copy are
// padded to 256 bytes.
fn readback_layout(width: u32, height: u32) -> Result<(u32, wgpu::BufferAddress)> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidSettings(format!(
            "offscreen target must be non-zero, got {width}x{height}"
        )));
    }
    let too_large = || Error::InvalidSettings(format!("offscreen target {width}x{height} is too large"));

    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let unpadded = width.checked_mul(4).ok_or_else(too_large)?;
    let padded = unpadded
        .checked_next_multiple_of(align)
        .ok_or_else(too_large)?;
    let size = (padded as wgpu::BufferAddress)
        .checked_mul(height as wgpu::BufferAddress)
        .ok_or_else(too_large)?;
    Ok((padded, size))
}

pub struct OffscreenRenderer {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    width: u32,
    height: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    padded_bytes_per_row: u32,
}

impl OffscreenRenderer {
    pub async fn new(width: u32, height: u32) -> Result<Self> {
        let (padded_bytes_per_row, readback_size) = readback_layout(width, height)?;
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

        let mut adapter = None;
        for force_fallback_adapter in [false, true] {
            adapter = instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter,
            }).await;
            if adapter.is_some() { break; }
        }
        let adapter = adapter.ok_or(Error::AdapterUnavailable)?;
        log::info!("offscreen adapter {:?}", adapter.get_info());

        let (device, queue) = adapter.request_device(&wgpu::DeviceDescriptor::default(), None).await?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Target"), size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1, sample_count: 1, dimension: wgpu::TextureDimension::D2, format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC, view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback"),
            size: readback_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Ok(Self { device, queue, width, height, texture, view, readback, padded_bytes_per_row })
    }

    pub fn pipeline(&self, topology: wgpu::PrimitiveTopology) -> Result<VertexStagePipeline> {
        VertexStagePipeline::new(&self.device, PipelineOptions { topology, ..PipelineOptions::new(TARGET_FORMAT) })
    }

    pub fn render(&self, pipeline: &VertexStagePipeline, mesh: &Mesh, view_projection: Mat4, clear: wgpu::Color) -> Result<Image> {
        pipeline.set_view_projection(&self.queue, view_projection);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Offscreen") });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.view, resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Clear(clear), store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None, occlusion_query_set: None,
            });
            pipeline.draw(&mut render_pass, mesh);
        }

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture, mip_level: 0, origin: wgpu::Origin3d::ZERO, aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.readback,
                layout: wgpu::ImageDataLayout { offset: 0, bytes_per_row: Some(self.padded_bytes_per_row), rows_per_image: Some(self.height) },
            },
            wgpu::Extent3d { width: self.width, height: self.height, depth_or_array_layers: 1 },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        self.read_pixels()
    }

    fn read_pixels(&self) -> Result<Image> {
        let slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| Error::Readback(e.to_string()))?
            .map_err(|e| Error::Readback(e.to_string()))?;

        let mut pixels = Vec::with_capacity((self.width * self.height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(self.padded_bytes_per_row as usize) {
                let row: &[[u8; 4]] = bytemuck::cast_slice(&row[..(self.width * 4) as usize]);
                pixels.extend_from_slice(row);
            }
        }
        self.readback.unmap();

        Ok(Image { width: self.width, height: self.height, pixels })
    }
}

// mesh.rs
use wgpu::util::DeviceExt;
use crate::vertex::Vertex;

// Corners of the demo triangle, one primary color each
pub const TRIANGLE: [Vertex; 3] = [
    Vertex::new([-0.5, -0.5, 0.0], [1.0, 0.0, 0.0]),
    Vertex::new([ 0.5, -0.5, 0.0], [0.0, 1.0, 0.0]),
    Vertex::new([ 0.0,  0.5, 0.0], [0.0, 0.0, 1.0]),
];

/// Element types an index buffer can hold.
pub trait Index: bytemuck::Pod {
    const FORMAT: wgpu::IndexFormat;
}

impl Index for u16 {
    const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;
}

impl Index for u32 {
    const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;
}

pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
    pub index_buffer: Option<wgpu::Buffer>,
    pub index_count: u32,
    pub index_format: wgpu::IndexFormat,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, label: &str, vertices: &[Vertex]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label), contents: bytemuck::cast_slice(vertices), usage: wgpu::BufferUsages::VERTEX,
        });
        Self { vertex_buffer, vertex_count: vertices.len() as u32, index_buffer: None, index_count: 0, index_format: wgpu::IndexFormat::Uint32 }
    }

    pub fn with_indices<I: Index>(device: &wgpu::Device, label: &str, vertices: &[Vertex], indices: &[I]) -> Self {
        let mut mesh = Self::new(device, label, vertices);
        mesh.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label), contents: bytemuck::cast_slice(indices), usage: wgpu::BufferUsages::INDEX,
        }));
        mesh.index_count = indices.len() as u32;
        mesh.index_format = I::FORMAT;
        mesh
    }

    pub fn triangle(device: &wgpu::Device) -> Self {
        Self::new(device, "Triangle", &TRIANGLE)
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(index_buffer) => {
                render_pass.set_index_buffer(index_buffer.slice(..), self.index_format);
                render_pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
            None => render_pass.draw(0..self.vertex_count, 0..1),
        }
    }
}

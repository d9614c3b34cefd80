// pipeline.rs
use glam::Mat4;
use wgpu::util::DeviceExt;
use crate::{
    camera::ViewProjectionUniform,
    config,
    error::{Error, Result},
    interface::{self, ShaderInterface},
    mesh::Mesh,
    shader,
    vertex::Vertex,
};

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub color_format: wgpu::TextureFormat,
    pub topology: wgpu::PrimitiveTopology,
    pub sample_count: u32,
}

impl PipelineOptions {
    pub fn new(color_format: wgpu::TextureFormat) -> Self {
        Self { color_format, topology: wgpu::PrimitiveTopology::TriangleList, sample_count: 1 }
    }
}

/// The vertex transform stage plus its passthrough fragment stage, with the
/// `ViewProjection` uniform it reads.
pub struct VertexStagePipeline {
    render_pipeline: wgpu::RenderPipeline,
    view_projection_buffer: wgpu::Buffer,
    view_projection_bind_group: wgpu::BindGroup,
    bind_group_index: u32,
}

impl VertexStagePipeline {
    pub fn new(device: &wgpu::Device, options: PipelineOptions) -> Result<Self> {
        Self::from_wgsl(device, shader::VERTEX_STAGE_WGSL, options)
    }

    /// Builds the pipeline from any WGSL module exposing the same interface.
    /// Interface and link problems are reported before wgpu sees the module.
    pub fn from_wgsl(device: &wgpu::Device, source: &str, options: PipelineOptions) -> Result<Self> {
        let iface = ShaderInterface::reflect(source)?;
        iface.check_vertex_stage()?;
        interface::link(&iface, &iface)?;

        let uniform = iface
            .uniform_binding(config::VIEW_PROJECTION_UNIFORM)
            .ok_or_else(|| Error::Interface(format!("uniform `{}` not declared", config::VIEW_PROJECTION_UNIFORM)))?;
        if uniform.group != 0 {
            return Err(Error::Interface(format!(
                "`{}` must live in bind group 0, found group {}",
                uniform.name, uniform.group
            )));
        }
        log::debug!("{} bound at group {} binding {}", uniform.name, uniform.group, uniform.binding);

        let view_projection_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ViewProjection Buffer"),
            contents: bytemuck::cast_slice(&[ViewProjectionUniform::new(Mat4::IDENTITY)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: uniform.binding, visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer { ty: wgpu::BufferBindingType::Uniform, has_dynamic_offset: false, min_binding_size: None }, count: None,
            }], label: Some("ViewProjection Layout"),
        });

        let view_projection_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry { binding: uniform.binding, resource: view_projection_buffer.as_entire_binding() }],
            label: Some("ViewProjection Bind Group"),
        });

        // Reflection already validated the module; the scope catches anything
        // the backend still refuses.
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vertex Stage"), source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(Error::ShaderCompile(err.to_string()));
        }

        // Sample count, target format and layout problems surface here
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None, bind_group_layouts: &[&bind_group_layout], push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Vertex Stage Pipeline"), layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module, entry_point: config::VERTEX_ENTRY,
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module, entry_point: config::FRAGMENT_ENTRY,
                targets: &[Some(wgpu::ColorTargetState { format: options.color_format, blend: Some(wgpu::BlendState::REPLACE), write_mask: wgpu::ColorWrites::ALL })],
            }),
            primitive: wgpu::PrimitiveState { topology: options.topology, cull_mode: None, ..Default::default() },
            depth_stencil: None,
            multisample: wgpu::MultisampleState { count: options.sample_count, mask: !0, alpha_to_coverage_enabled: false },
            multiview: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(Error::Pipeline(err.to_string()));
        }

        log::info!(
            "vertex stage pipeline ready ({:?}, {:?}, {}x MSAA)",
            options.color_format, options.topology, options.sample_count
        );

        Ok(Self { render_pipeline, view_projection_buffer, view_projection_bind_group, bind_group_index: uniform.group })
    }

    /// Must be called before each draw whose camera changed.
    pub fn set_view_projection(&self, queue: &wgpu::Queue, view_projection: Mat4) {
        queue.write_buffer(
            &self.view_projection_buffer, 0,
            bytemuck::cast_slice(&[ViewProjectionUniform::new(view_projection)]),
        );
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, mesh: &'a Mesh) {
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(self.bind_group_index, &self.view_projection_bind_group, &[]);
        mesh.draw(render_pass);
    }
}

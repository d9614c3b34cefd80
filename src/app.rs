// app.rs
use std::sync::Arc;
use std::time::Instant;
use winit::{window::Window, event::*};
use crate::{
    camera::{Camera, CameraController},
    config::Settings,
    error::Result,
    gpu::GpuContext,
    mesh::Mesh,
    pipeline::{PipelineOptions, VertexStagePipeline},
};

pub struct State {
    pub ctx: GpuContext,
    pipeline: VertexStagePipeline,
    mesh: Mesh,
    pub camera: Camera,
    camera_controller: CameraController,
    clear_color: wgpu::Color,
    last_frame_time: Instant,
}

impl State {
    pub async fn new(window: Arc<Window>, settings: &Settings) -> Result<Self> {
        let ctx = GpuContext::new(window, settings).await?;
        let pipeline = VertexStagePipeline::new(&ctx.device, PipelineOptions {
            sample_count: ctx.sample_count,
            ..PipelineOptions::new(ctx.config.format)
        })?;
        let mesh = Mesh::triangle(&ctx.device);
        let camera = Camera::new(ctx.aspect());
        pipeline.set_view_projection(&ctx.queue, camera.build_view_projection_matrix());

        Ok(Self {
            ctx, pipeline, mesh,
            camera, camera_controller: CameraController::new(),
            clear_color: settings.clear_color(),
            last_frame_time: Instant::now(),
        })
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.ctx.size
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.aspect = self.ctx.aspect();
    }

    pub fn input(&mut self, event: &WindowEvent) -> bool {
        self.camera_controller.process_events(event)
    }

    pub fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame_time).as_secs_f32().clamp(0.0001, 0.1);
        self.last_frame_time = now;

        self.camera_controller.update_camera(&mut self.camera, dt);
        self.pipeline.set_view_projection(&self.ctx.queue, self.camera.build_view_projection_matrix());
    }

    pub fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        let (target, resolve_target) = match &self.ctx.msaa_texture {
            Some(msaa) => (msaa, Some(&view)),
            None => (&view, None),
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target, resolve_target,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Clear(self.clear_color), store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None, occlusion_query_set: None,
            });

            self.pipeline.draw(&mut render_pass, &self.mesh);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

// gpu.rs
use std::sync::Arc;
use winit::window::Window;
use crate::{config::Settings, error::{Error, Result}};

pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub sample_count: u32,
    pub msaa_texture: Option<wgpu::TextureView>,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>, settings: &Settings) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }).await.ok_or(Error::AdapterUnavailable)?;
        log::info!("using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter.request_device(&wgpu::DeviceDescriptor::default(), None).await?;
        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or(Error::SurfaceUnsupported)?;

        let caps = surface.get_capabilities(&adapter);
        config.present_mode = if !settings.vsync && caps.present_modes.contains(&wgpu::PresentMode::Mailbox) {
            wgpu::PresentMode::Mailbox
        } else {
            wgpu::PresentMode::Fifo
        };
        surface.configure(&device, &config);
        log::debug!("surface configured: {:?} {:?}", config.format, config.present_mode);

        let sample_count = settings.sample_count;
        let msaa_texture = Self::create_msaa(&device, &config, sample_count);

        Ok(Self { surface, device, queue, config, size, sample_count, msaa_texture })
    }

    fn create_msaa(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, sample_count: u32) -> Option<wgpu::TextureView> {
        if sample_count <= 1 {
            return None;
        }
        let desc = wgpu::TextureDescriptor {
            label: Some("MSAA"), size: wgpu::Extent3d { width: config.width, height: config.height, depth_or_array_layers: 1 },
            mip_level_count: 1, sample_count, dimension: wgpu::TextureDimension::D2, format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT, view_formats: &[],
        };
        Some(device.create_texture(&desc).create_view(&wgpu::TextureViewDescriptor::default()))
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            log::debug!("resizing surface to {}x{}", new_size.width, new_size.height);
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.msaa_texture = Self::create_msaa(&self.device, &self.config, self.sample_count);
        }
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }
}

use winit::{
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
    keyboard::{KeyCode, PhysicalKey},
    dpi::PhysicalSize,
};
use std::sync::Arc;
use std::time::Instant;
use anyhow::Context;

use r3d3::{app::State, config::{self, Settings}};

fn main() -> anyhow::Result<()> {
    let settings = Settings::load_with_logging(config::CONFIG_FILE_PATH)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&settings.title)
            .with_inner_size(PhysicalSize::new(settings.width, settings.height))
            .with_resizable(true)
            .build(&event_loop)
            .context("failed to create window")?,
    );

    let mut state = pollster::block_on(State::new(window.clone(), &settings))?;
    let mut last_fps_print = Instant::now();
    let mut frames = 0;

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent { ref event, window_id } if window_id == window.id() => {
                if !state.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => state.resize(*physical_size),
                        WindowEvent::RedrawRequested => {
                            state.update();
                            match state.render() {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost) => {
                                    log::warn!("surface lost, reconfiguring");
                                    state.resize(state.size());
                                }
                                Err(wgpu::SurfaceError::OutOfMemory) => {
                                    log::error!("out of GPU memory, exiting");
                                    elwt.exit();
                                }
                                Err(e) => log::error!("render error: {:?}", e),
                            }
                        }
                        WindowEvent::KeyboardInput { event: KeyEvent { physical_key: PhysicalKey::Code(KeyCode::Escape), state: ElementState::Pressed, .. }, .. } => {
                            elwt.exit();
                        }
                        _ => {}
                    }
                }
            },
            Event::AboutToWait => {
                // FPS Counter
                frames += 1;
                if last_fps_print.elapsed().as_secs_f32() >= 1.0 {
                    window.set_title(&format!("{} | FPS: {}", settings.title, frames));
                    frames = 0;
                    last_fps_print = Instant::now();
                }
                window.request_redraw();
            },
            _ => {}
        }
    })?;

    Ok(())
}

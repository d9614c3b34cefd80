// camera.rs
use glam::{Mat4, Vec3};
use winit::event::*;
use winit::keyboard::{KeyCode, PhysicalKey};
use crate::config;

/// Orbits `target` at a fixed distance.
#[derive(Debug)]
pub struct Camera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub aspect: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            distance: config::ORBIT_DISTANCE,
            yaw: 90.0f32.to_radians(),
            pitch: 0.0,
            aspect,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        self.target + Vec3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw) * self.distance
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            config::FOV_Y.to_radians(),
            self.aspect,
            config::Z_NEAR,
            config::Z_FAR,
        );
        proj * view
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewProjectionUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl ViewProjectionUniform {
    pub fn new(view_proj: Mat4) -> Self {
        Self { view_proj: view_proj.to_cols_array_2d() }
    }
}

#[derive(Debug, Default)]
pub struct CameraController {
    pub orbit_left: bool,
    pub orbit_right: bool,
    pub orbit_up: bool,
    pub orbit_down: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(key), state, .. }, ..
            } => {
                let pressed = *state == ElementState::Pressed;
                match key {
                    KeyCode::KeyA | KeyCode::ArrowLeft => { self.orbit_left = pressed; true }
                    KeyCode::KeyD | KeyCode::ArrowRight => { self.orbit_right = pressed; true }
                    KeyCode::KeyW | KeyCode::ArrowUp => { self.orbit_up = pressed; true }
                    KeyCode::KeyS | KeyCode::ArrowDown => { self.orbit_down = pressed; true }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    pub fn update_camera(&self, camera: &mut Camera, dt: f32) {
        let step = config::ORBIT_SPEED * dt;
        if self.orbit_left { camera.yaw -= step; }
        if self.orbit_right { camera.yaw += step; }
        if self.orbit_up { camera.pitch += step; }
        if self.orbit_down { camera.pitch -= step; }
        camera.pitch = camera.pitch.clamp(-config::PITCH_LIMIT, config::PITCH_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn default_eye_sits_on_positive_z() {
        let camera = Camera::new(1.0);
        let eye = camera.eye();
        assert!(eye.x.abs() < 1e-5);
        assert!(eye.y.abs() < 1e-5);
        assert!((eye.z - config::ORBIT_DISTANCE).abs() < 1e-5);
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let camera = Camera::new(800.0 / 600.0);
        let clip = camera.build_view_projection_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn uniform_is_column_major() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let u = ViewProjectionUniform::new(m);
        assert_eq!(std::mem::size_of::<ViewProjectionUniform>(), 64);
        assert_eq!(u.view_proj[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::new(1.0);
        let controller = CameraController { orbit_up: true, ..Default::default() };
        controller.update_camera(&mut camera, 100.0);
        assert_eq!(camera.pitch, config::PITCH_LIMIT);
    }
}

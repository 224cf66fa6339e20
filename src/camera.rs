//! Code to manage the camera.

use core::f32::consts::TAU;

use lin_alg::f32::{Mat4, Quaternion, Vec3};

use crate::types::FWD_VEC;

#[derive(Clone, Debug)]
pub struct Camera {
    pub fov_y: f32,  // Vertical field of view in radians.
    pub aspect: f32, // width / height.
    pub near: f32,
    pub far: f32,
    /// Position shifts all points prior to the camera transform.
    pub position: Vec3,
    pub orientation: Quaternion,
    /// Distance along the view direction to the point the camera is focused on.
    pub focus: f32,
    /// We store the projection matrix here since it only changes when we change the camera cfg.
    pub proj_mat: Mat4,
}

impl Camera {
    /// Updates the projection matrix based on the projection parameters.
    /// Run this after updating the parameters.
    pub fn update_proj_mat(&mut self) {
        self.proj_mat = Mat4::new_perspective_lh(self.fov_y, self.aspect, self.near, self.far);
    }

    /// Set the aspect ratio from a surface size in pixels, and update the projection matrix.
    /// Zero-sized surfaces (e.g. a minimized window) leave the camera unchanged.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_proj_mat();
    }

    /// Calculate the view matrix: This is a translation of the negative coordinates of the camera's
    /// position, applied before the camera's rotation.
    pub fn view_mat(&self) -> Mat4 {
        self.orientation.inverse().to_matrix() * Mat4::new_translation(-self.position)
    }

    /// The combined projection and view transform; world space to clip space.
    pub fn view_proj(&self) -> Mat4 {
        self.proj_mat.clone() * self.view_mat()
    }

    /// The direction the camera is looking, in world space.
    pub fn forward(&self) -> Vec3 {
        self.orientation.rotate_vec(FWD_VEC)
    }

    pub fn focal_point(&self) -> Vec3 {
        self.position + self.forward() * self.focus
    }
}

impl Default for Camera {
    fn default() -> Self {
        let mut result = Self {
            position: Vec3::new(0., 0., 0.),
            orientation: Quaternion::new_identity(),
            fov_y: TAU / 6., // Vertical field of view in radians.
            aspect: 4. / 3., // width / height.
            near: 0.5,
            far: 60.,
            focus: 10.,
            proj_mat: Mat4::new_identity(),
        };

        result.update_proj_mat();
        result
    }
}

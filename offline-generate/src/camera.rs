//! Camera pose derivation and per-pixel ray generation (SPEC_FULL.md §3
//! "Capture pose", §4.11). Grounded on
//! `original_source/src/tools/data_generation/utils.py`'s
//! `get_camera_location`/`get_camera_rotation`/`calculate_horizontal_fov`,
//! with `parry3d_f64::query::Ray` as the ray representation (the same type
//! `flydra-mvg`'s `Camera::project_pixel_to_ray` returns).

use harness_types::{DecodedState, FieldValue};
use nalgebra::{Point3, Rotation3, Vector3};
use parry3d_f64::query::Ray;

fn field_f64(state: &DecodedState, name: &str) -> f64 {
    state.get(name).and_then(FieldValue::as_f64).unwrap_or(0.0)
}

/// Horizontal FOV derived once from the configured vertical FOV and image
/// size (SPEC_FULL.md §3 "Capture pose"), matching a pinhole camera with
/// square pixels.
pub fn horizontal_fov_degrees(vertical_fov_degrees: f64, width: u32, height: u32) -> f64 {
    let focal_length = height as f64 / (vertical_fov_degrees.to_radians() / 2.0).tan();
    2.0 * (width as f64 / 2.0 / focal_length).atan().to_degrees()
}

/// A positioned, oriented camera ready to emit one ray per pixel.
#[derive(Debug, Clone, Copy)]
pub struct CameraPose {
    pub center: Point3<f64>,
    pub rotation: Rotation3<f64>,
    pub width: u32,
    pub height: u32,
    pub fov_v_degrees: f64,
    pub fov_h_degrees: f64,
}

impl CameraPose {
    /// Derives a pose from one decoded state record: location
    /// `(x, y + cg_height, z)`, rotation `(pitch, -(heading+pi), roll)`
    /// (SPEC_FULL.md §3). The three Euler angles are applied about
    /// camera-local x, y, z respectively, in that order.
    pub fn from_state(
        state: &DecodedState,
        width: u32,
        height: u32,
        fov_v_degrees: f64,
    ) -> Self {
        let center = Point3::new(
            field_f64(state, "ego_location_x"),
            field_f64(state, "ego_location_y") + field_f64(state, "cg_height"),
            field_f64(state, "ego_location_z"),
        );

        let pitch = field_f64(state, "pitch");
        let heading = field_f64(state, "heading");
        let roll = field_f64(state, "roll");
        let yaw = -(heading + std::f64::consts::PI);
        let rotation = Rotation3::from_euler_angles(pitch, yaw, roll);

        let fov_h_degrees = horizontal_fov_degrees(fov_v_degrees, width, height);

        Self {
            center,
            rotation,
            width,
            height,
            fov_v_degrees,
            fov_h_degrees,
        }
    }

    /// One ray per pixel, row-major (`pixel = row * width + col`), camera
    /// center repeated for every ray (`distance=0.0`, SPEC_FULL.md §3).
    pub fn pixel_rays(&self) -> Vec<Ray> {
        let half_h = (self.fov_h_degrees.to_radians() / 2.0).tan();
        let half_v = (self.fov_v_degrees.to_radians() / 2.0).tan();

        let mut rays = Vec::with_capacity(self.width as usize * self.height as usize);
        for row in 0..self.height {
            let ndc_y = 1.0 - (row as f64 + 0.5) / self.height as f64 * 2.0;
            for col in 0..self.width {
                let ndc_x = (col as f64 + 0.5) / self.width as f64 * 2.0 - 1.0;
                let local_dir = Vector3::new(ndc_x * half_h, ndc_y * half_v, 1.0).normalize();
                let world_dir = self.rotation * local_dir;
                rays.push(Ray::new(self.center, world_dir));
            }
        }
        rays
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wider_vertical_fov_yields_wider_horizontal_fov_for_square_image() {
        let h_fov = horizontal_fov_degrees(90.0, 100, 100);
        assert!((h_fov - 90.0).abs() < 1e-9);
    }

    #[test]
    fn centre_ray_points_straight_down_the_optical_axis_with_identity_rotation() {
        let pose = CameraPose {
            center: Point3::new(0.0, 0.0, 0.0),
            rotation: Rotation3::identity(),
            width: 3,
            height: 3,
            fov_v_degrees: 90.0,
            fov_h_degrees: 90.0,
        };
        let rays = pose.pixel_rays();
        let centre = &rays[4]; // row 1, col 1 of a 3x3 grid
        assert!((centre.dir.x).abs() < 1e-9);
        assert!((centre.dir.y).abs() < 1e-9);
        assert!((centre.dir.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pixel_count_matches_width_times_height() {
        let pose = CameraPose {
            center: Point3::origin(),
            rotation: Rotation3::identity(),
            width: 8,
            height: 6,
            fov_v_degrees: 60.0,
            fov_h_degrees: 80.0,
        };
        assert_eq!(pose.pixel_rays().len(), 48);
    }
}

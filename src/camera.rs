//! Pinhole camera: frame-coordinate construction and per-pixel primary-ray
//! generation (§4.8).

use crate::image::Image;
use crate::random::Random;
use crate::raytracer::RayTracer;
use crate::scene::Scene;
use crate::vector::{Point3, Vec3};

/// View angle is clamped to this range, in degrees, before conversion to
/// radians (§3, §6).
const MIN_ANGLE_DEGREES: f64 = 10.0;
const MAX_ANGLE_DEGREES: f64 = 160.0;

/// A pinhole camera: view position, unit view direction, and an orthonormal
/// (right, up, viewDirection) right-handed frame, plus the half-angle used
/// to scale the image plane.
pub struct Camera {
    position: Point3,
    direction: Vec3,
    right: Vec3,
    up: Vec3,
    half_angle_tan: f64,
}

impl Camera {
    /// Builds the camera from a raw view position, direction, and angle in
    /// degrees. The direction is normalized; a zero direction falls back to
    /// `(0, 0, 1)`. `right` is derived from a world-up reference vector; if
    /// that reference is collinear with the view direction (direction is
    /// vertical), the reference switches to a horizontal vector chosen by
    /// the sign of the direction's `y` component, so `right` is never
    /// degenerate (§4.8).
    pub fn new(position: Point3, direction: Vec3, angle_degrees: f64) -> Self {
        let direction = if direction.is_zero() {
            Vec3::new(0.0, 0.0, 1.0)
        } else {
            direction.unitize()
        };

        let mut world_up = Vec3::new(0.0, 1.0, 0.0);
        let mut right = world_up.cross(direction);
        if right.is_zero() {
            world_up = Vec3::new(0.0, 0.0, if direction.y < 0.0 { 1.0 } else { -1.0 });
            right = world_up.cross(direction);
        }
        let right = right.unitize();
        let up = direction.cross(right).unitize();

        let angle = angle_degrees.clamp(MIN_ANGLE_DEGREES, MAX_ANGLE_DEGREES).to_radians();

        Self {
            position,
            direction,
            right,
            up,
            half_angle_tan: (angle / 2.0).tan(),
        }
    }

    /// Renders one frame into `image`: every pixel draws two jittered
    /// offsets, builds a primary ray through the image plane, and
    /// accumulates `RayTracer::radiance` into the pixel (§4.8). Iterates
    /// row-major, y outer and x inner, with each pixel consuming its two
    /// jitter draws before tracing, to match the reference draw order
    /// (§5 "ordering guarantees").
    pub fn get_frame(&self, scene: &Scene, random: &mut Random, image: &mut Image) {
        let tracer = RayTracer::new(scene);
        let (width, height) = (image.width(), image.height());
        let aspect = height as f64 / width as f64;

        for y in 0..height {
            for x in 0..width {
                let jx = random.next_f64();
                let jy = random.next_f64();

                let xc = (2.0 * (x as f64 + jx) / width as f64) - 1.0;
                let yc = (2.0 * (y as f64 + jy) / height as f64) - 1.0;

                let offset = self.right * xc + self.up * (yc * aspect);
                let sample_dir = (self.direction + offset * self.half_angle_tan).unitize();

                let radiance = tracer.radiance(self.position, sample_dir, random);
                image.add_to_pixel(x, y, radiance);
            }
        }
    }
}

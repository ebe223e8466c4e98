//! Local surface-interaction model at a single hit point: emission, the
//! Lambertian BRDF, and cosine-weighted hemisphere sampling with Russian
//! roulette.

use std::f64::consts::PI;

use crate::random::Random;
use crate::triangle::Triangle;
use crate::vector::{Color, Point3, Vec3};

/// A non-owning reference to a struck triangle plus the position on it where
/// the ray landed. Constructed fresh per hit; never outlives one bounce.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint {
    pub triangle_idx: usize,
    pub position: Point3,
}

impl SurfacePoint {
    pub fn new(triangle_idx: usize, position: Point3) -> Self {
        Self {
            triangle_idx,
            position,
        }
    }

    /// Emission toward `to_position` along `out_direction`, the direction
    /// pointing away from this surface back along the ray that found it.
    ///
    /// When `is_solid_angle` is true the result is converted from areal to
    /// solid-angle measure by dividing by squared distance (clamped to
    /// `1e-6` — on squared distance, not distance, per §9) so next-event
    /// estimation doesn't blow up as the shadow ray shortens toward zero.
    pub fn emission(
        &self,
        triangle: &Triangle,
        to_position: Point3,
        out_direction: Vec3,
        is_solid_angle: bool,
    ) -> Color {
        let ray = to_position - self.position;
        let cos_area = out_direction.dot(triangle.normal) * triangle.area;
        if cos_area <= 0.0 {
            return Color::zero();
        }
        if is_solid_angle {
            triangle.emissivity * (cos_area / ray.length_squared().max(1e-6))
        } else {
            triangle.emissivity
        }
    }

    /// Ideal Lambertian reflection: non-zero only when `in_dir` and
    /// `out_dir` are on the same side of the surface normal. Carries the
    /// incoming cosine and the `1/π` BRDF normalization; the outgoing
    /// cosine and the matching `π` from cosine-weighted sampling cancel in
    /// the path-tracing estimator (see `RayTracer::radiance`).
    pub fn reflection(
        &self,
        triangle: &Triangle,
        in_dir: Vec3,
        in_radiance: Color,
        out_dir: Vec3,
    ) -> Color {
        let in_dot = in_dir.dot(triangle.normal);
        let out_dot = out_dir.dot(triangle.normal);
        let same_side = (in_dot > 0.0 && out_dot > 0.0) || (in_dot < 0.0 && out_dot < 0.0);
        if !same_side {
            return Color::zero();
        }
        in_radiance.hadamard(triangle.reflectivity) * (in_dot.abs() / PI)
    }

    /// Samples the next path direction via cosine-weighted hemisphere
    /// sampling oriented to the side of the normal facing `in_dir`, subject
    /// to Russian-roulette termination on mean reflectivity. Returns
    /// `None` when the path terminates; otherwise `(direction,
    /// weight)` where `weight` already has the roulette rescaling
    /// (`reflectivity / mean_reflectivity`) folded in.
    pub fn next_direction(&self, triangle: &Triangle, random: &mut Random, in_dir: Vec3) -> Option<(Vec3, Color)> {
        let mean_reflectivity =
            (triangle.reflectivity.x + triangle.reflectivity.y + triangle.reflectivity.z) / 3.0;
        let u = random.next_f64();
        if u >= mean_reflectivity {
            return None;
        }

        let r1 = random.next_f64();
        let r2 = random.next_f64();
        let phi = 2.0 * PI * r1;
        let s = r2.sqrt();
        let lx = phi.cos() * s;
        let ly = phi.sin() * s;
        let lz = (1.0 - r2).sqrt();

        let oriented_normal = if triangle.normal.dot(in_dir) >= 0.0 {
            triangle.normal
        } else {
            -triangle.normal
        };
        let bitangent = oriented_normal.cross(triangle.tangent);
        let direction = triangle.tangent * lx + bitangent * ly + oriented_normal * lz;

        let color = triangle.reflectivity * (1.0 / mean_reflectivity);
        Some((direction, color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upward_triangle(reflectivity: Vec3, emissivity: Vec3) -> Triangle {
        Triangle::new(
            Point3::new(-1.0, 0.0, -1.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, 1.0),
            reflectivity,
            emissivity,
        )
    }

    #[test]
    fn emission_is_zero_for_back_facing_direction() {
        let t = upward_triangle(Vec3::zero(), Vec3::splat(1.0));
        let sp = SurfacePoint::new(0, Point3::new(0.0, 0.0, 0.0));
        let e = sp.emission(&t, Point3::new(0.0, -5.0, 0.0), Vec3::new(0.0, -1.0, 0.0), false);
        assert_eq!(e, Color::zero());
    }

    #[test]
    fn reflection_is_zero_across_the_surface() {
        let t = upward_triangle(Vec3::splat(0.5), Vec3::zero());
        let sp = SurfacePoint::new(0, Point3::zero());
        // in_dir above the surface, out_dir below: opposite sides
        let in_dir = Vec3::new(0.0, 1.0, 0.0);
        let out_dir = Vec3::new(0.0, -1.0, 0.0);
        let r = sp.reflection(&t, in_dir, Color::splat(1.0), out_dir);
        assert_eq!(r, Color::zero());
    }

    #[test]
    fn reflection_nonzero_on_same_side() {
        let t = upward_triangle(Vec3::splat(0.5), Vec3::zero());
        let sp = SurfacePoint::new(0, Point3::zero());
        let in_dir = Vec3::new(0.0, 1.0, 0.0);
        let out_dir = Vec3::new(0.1, 1.0, 0.0);
        let r = sp.reflection(&t, in_dir, Color::splat(1.0), out_dir);
        assert!(r.x > 0.0);
    }

    #[test]
    fn next_direction_terminates_for_black_surface() {
        let t = upward_triangle(Vec3::zero(), Vec3::zero());
        let sp = SurfacePoint::new(0, Point3::zero());
        let mut r = Random::new();
        assert!(sp
            .next_direction(&t, &mut r, Vec3::new(0.0, 1.0, 0.0))
            .is_none());
    }

    #[test]
    fn next_direction_weight_is_nonnegative() {
        let t = upward_triangle(Vec3::splat(0.9), Vec3::zero());
        let sp = SurfacePoint::new(0, Point3::zero());
        let mut r = Random::new();
        for _ in 0..200 {
            if let Some((_, w)) = sp.next_direction(&t, &mut r, Vec3::new(0.0, 1.0, 0.0)) {
                assert!(w.x >= 0.0 && w.y >= 0.0 && w.z >= 0.0);
            }
        }
    }
}

//! Path construction with next-event (emitter) sampling, and
//! Russian-roulette termination.

use crate::random::Random;
use crate::scene::Scene;
use crate::surface_point::SurfacePoint;
use crate::vector::{Color, Point3, Ray, Vec3};

/// Defensive cap on bounce count. Russian roulette terminates every path in
/// expectation (§4.7), so this never triggers on valid scenes; it exists
/// only to bound the work done on pathological reflectivity-near-1 inputs
/// rather than leaving the loop unbounded (§9).
const MAX_BOUNCES: u32 = 200;

/// Traces paths through a [`Scene`], combining local emission on the
/// primary ray with next-event emitter sampling at every bounce, and
/// reflectance accumulated along the way.
///
/// Implemented as an iterative loop accumulating a running throughput
/// weight rather than true call recursion (§9 "recursion depth") — the
/// estimator this unrolls to is exactly the one in the module docs: each
/// bounce's illumination and (bounce-zero only) local emission is weighted
/// by the product of every `color` term sampled so far.
pub struct RayTracer<'a> {
    scene: &'a Scene,
}

impl<'a> RayTracer<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }

    /// Estimates the radiance arriving at `origin` from direction
    /// `direction` (`direction` must be unit length).
    pub fn radiance(&self, origin: Point3, direction: Vec3, random: &mut Random) -> Color {
        let mut result = Color::zero();
        let mut weight = Color::new(1.0, 1.0, 1.0);
        let mut ray_origin = origin;
        let mut ray_dir = direction;
        let mut last_hit: Option<usize> = None;

        for _ in 0..MAX_BOUNCES {
            let ray = Ray::new(ray_origin, ray_dir);
            let is_primary_ray = last_hit.is_none();

            let hit = match self.scene.intersect(&ray, last_hit) {
                Some(hit) => hit,
                None => {
                    result += weight.hadamard(self.scene.default_emission(-ray_dir));
                    break;
                }
            };

            let triangle = self.scene.triangle(hit.triangle);
            let surface = SurfacePoint::new(hit.triangle, hit.position);

            if is_primary_ray {
                let local_emission = surface.emission(triangle, ray_origin, -ray_dir, false);
                result += weight.hadamard(local_emission);
            }

            if let Some(illumination) = self.sample_direct_light(&surface, triangle, ray_dir, random) {
                result += weight.hadamard(illumination);
            }

            match surface.next_direction(triangle, random, -ray_dir) {
                Some((next_dir, color)) => {
                    weight = weight.hadamard(color);
                    ray_origin = surface.position;
                    ray_dir = next_dir;
                    last_hit = Some(hit.triangle);
                }
                None => break,
            }
        }

        result
    }

    /// Next-event estimation: samples one point on one emitter, traces a
    /// shadow ray, and folds the emitter's inward radiance through the
    /// surface's reflectance if unoccluded. The `N` (emitter count) factor
    /// compensates for uniform emitter selection (§4.7 step 4).
    fn sample_direct_light(
        &self,
        surface: &SurfacePoint,
        triangle: &crate::triangle::Triangle,
        incoming_ray_dir: Vec3,
        random: &mut Random,
    ) -> Option<Color> {
        let (point_on_emitter, emitter_idx) = self.scene.sample_emitter(random)?;
        let to_emitter = point_on_emitter - surface.position;
        let distance = to_emitter.length();
        if distance == 0.0 {
            return None;
        }
        let shadow_dir = to_emitter * (1.0 / distance);
        let shadow_ray = Ray::new(surface.position, shadow_dir);

        let unobstructed = match self.scene.intersect(&shadow_ray, Some(surface.triangle_idx)) {
            None => true,
            Some(shadow_hit) => shadow_hit.triangle == emitter_idx,
        };
        if !unobstructed {
            return None;
        }

        let emitter_triangle = self.scene.triangle(emitter_idx);
        let emitter_surface = SurfacePoint::new(emitter_idx, point_on_emitter);
        let n = self.scene.emitter_count() as f64;
        let incoming = emitter_surface.emission(emitter_triangle, surface.position, -shadow_dir, true) * n;

        Some(surface.reflection(triangle, shadow_dir, incoming, -incoming_ray_dir))
    }
}

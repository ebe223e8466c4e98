//! Scene: owns the triangle array, the emitter sub-list, and background
//! emission; delegates nearest-hit queries to the octree.

use crate::octree::{Hit, SpatialIndex};
use crate::random::Random;
use crate::triangle::Triangle;
use crate::vector::{Point3, Ray, Vec3};

/// An immutable scene description: triangles, the emitters among them, the
/// sky/ground background, and the octree built over all triangles.
pub struct Scene {
    triangles: Vec<Triangle>,
    emitters: Vec<usize>,
    sky_emission: Vec3,
    ground_reflection: Vec3,
    index: SpatialIndex,
}

impl Scene {
    /// Builds the scene from its triangle list and background emission,
    /// clamping sky emission to `>= 0` and ground reflection to `[0, 1)`
    /// per §3, and indexing every triangle whose emissivity and area are
    /// both positive as an emitter, in the order it appears in `triangles`.
    pub fn new(
        triangles: Vec<Triangle>,
        sky_emission: Vec3,
        ground_reflection: Vec3,
        eye: Point3,
    ) -> Self {
        let emitters = triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_emitter())
            .map(|(i, _)| i)
            .collect();
        let index = SpatialIndex::build(eye, &triangles);

        Self {
            triangles,
            emitters,
            sky_emission: sky_emission.clamp_min(Vec3::zero()),
            ground_reflection: ground_reflection.clamp01(),
            index,
        }
    }

    pub fn triangle(&self, idx: usize) -> &Triangle {
        &self.triangles[idx]
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    /// Nearest-hit query, delegated to the octree.
    pub fn intersect(&self, ray: &Ray, last_hit: Option<usize>) -> Option<Hit> {
        self.index.nearest_hit(ray, last_hit, &self.triangles)
    }

    /// Picks one emitter uniformly at random and returns a uniformly
    /// sampled point on it, along with its index. Returns `None` if the
    /// scene has no emitters.
    ///
    /// Selection uses a truncating cast (`(u * n) as usize`, clamped to
    /// `n - 1`) rather than rounding, matching the reference bias exactly
    /// (§9 open question) — the only practical effect is at `u -> 1`.
    pub fn sample_emitter(&self, random: &mut Random) -> Option<(Point3, usize)> {
        let n = self.emitters.len();
        if n == 0 {
            return None;
        }
        let u = random.next_f64();
        let i = ((u * n as f64) as usize).min(n - 1);
        let idx = self.emitters[i];
        let triangle = &self.triangles[idx];
        let r1 = random.next_f64();
        let r2 = random.next_f64();
        Some((triangle.sample_point(r1, r2), idx))
    }

    /// The background emission seen by a ray that escapes the scene: sky
    /// emission for rays heading upward, sky emission tinted by ground
    /// reflection for rays heading downward (§4.5).
    pub fn default_emission(&self, back_direction: Vec3) -> Vec3 {
        if back_direction.y < 0.0 {
            self.sky_emission
        } else {
            self.sky_emission.hadamard(self.ground_reflection)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_emitter_scene() -> Scene {
        let emitter = Triangle::new(
            Point3::new(-1.0, 5.0, -1.0),
            Point3::new(1.0, 5.0, -1.0),
            Point3::new(0.0, 5.0, 1.0),
            Vec3::zero(),
            Vec3::new(1.0, 1.0, 1.0),
        );
        Scene::new(
            vec![emitter],
            Vec3::splat(0.2),
            Vec3::splat(0.1),
            Point3::zero(),
        )
    }

    #[test]
    fn emitters_collected_in_stream_order() {
        let scene = single_emitter_scene();
        assert_eq!(scene.emitter_count(), 1);
    }

    #[test]
    fn sample_emitter_returns_none_for_no_emitters() {
        let scene = Scene::new(vec![], Vec3::zero(), Vec3::zero(), Point3::zero());
        let mut r = Random::new();
        assert!(scene.sample_emitter(&mut r).is_none());
    }

    #[test]
    fn sample_emitter_picks_the_only_emitter() {
        let scene = single_emitter_scene();
        let mut r = Random::new();
        let (_, idx) = scene.sample_emitter(&mut r).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn default_emission_splits_on_vertical_direction() {
        let scene = single_emitter_scene();
        let up = scene.default_emission(Vec3::new(0.0, 1.0, 0.0));
        let down = scene.default_emission(Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(up, Vec3::splat(0.2).hadamard(Vec3::splat(0.1)));
        assert_eq!(down, Vec3::splat(0.2));
    }
}

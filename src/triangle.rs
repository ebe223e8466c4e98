//! Triangle geometry and material, plus Möller–Trumbore intersection.

use crate::vector::{Aabb, Point3, Ray, Vec3};

/// Geometric slack applied when enclosing triangles in bounds and when
/// testing octree hit points against cell bounds (§4.3, §4.4).
pub const TOLERANCE: f64 = 1.0 / 1024.0; // 2^-10

/// Determinant threshold below which a ray is treated as parallel to the
/// triangle's plane (§4.3).
pub const EPSILON: f64 = 1.0 / 1_048_576.0; // 2^-20

/// A triangle's geometry and material, precomputed once at scene
/// construction and immutable thereafter.
///
/// `e0` and `e3` name the two edges from `v0` the same way the reference
/// design does (`e0 = v1 - v0`, `e3 = v2 - v0`) — both the Möller–Trumbore
/// test and uniform-area sampling consume them directly, so they are stored
/// rather than recomputed per query.
#[derive(Debug, Clone)]
pub struct Triangle {
    pub v0: Point3,
    pub v1: Point3,
    pub v2: Point3,
    e0: Vec3,
    e3: Vec3,
    pub reflectivity: Vec3,
    pub emissivity: Vec3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub area: f64,
}

impl Triangle {
    /// Builds a triangle from its three vertices and raw material vectors,
    /// clamping reflectivity to `[0, 1)` and emissivity to `>= 0` per the
    /// invariants in §3.
    pub fn new(v0: Point3, v1: Point3, v2: Point3, reflectivity: Vec3, emissivity: Vec3) -> Self {
        let e0 = v1 - v0;
        let e3 = v2 - v0;
        let raw_normal = e0.cross(v2 - v1);
        let tangent = e0.unitize();
        let normal = raw_normal.unitize();
        let area = 0.5 * raw_normal.length();

        Self {
            v0,
            v1,
            v2,
            e0,
            e3,
            reflectivity: reflectivity.clamp01(),
            emissivity: emissivity.clamp_min(Vec3::zero()),
            tangent,
            normal,
            area,
        }
    }

    /// The axis-aligned bound of the three vertices, expanded by
    /// [`TOLERANCE`] on every face so that grazing rays and octree cell
    /// tests never reject a hit that geometrically belongs to this triangle.
    pub fn bound(&self) -> Aabb {
        let lo = Vec3::new(
            self.v0.x.min(self.v1.x).min(self.v2.x),
            self.v0.y.min(self.v1.y).min(self.v2.y),
            self.v0.z.min(self.v1.z).min(self.v2.z),
        );
        let hi = Vec3::new(
            self.v0.x.max(self.v1.x).max(self.v2.x),
            self.v0.y.max(self.v1.y).max(self.v2.y),
            self.v0.z.max(self.v1.z).max(self.v2.z),
        );
        Aabb::new(lo - Vec3::splat(TOLERANCE), hi + Vec3::splat(TOLERANCE))
    }

    /// Möller–Trumbore intersection. Returns the distance along `ray` to the
    /// hit point, or `None` if the ray misses or is parallel to the plane.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        let p = ray.direction.cross(self.e3);
        let det = self.e0.dot(p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let t_vec = ray.origin - self.v0;
        let u = t_vec.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = t_vec.cross(self.e0);
        let v = ray.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let distance = self.e3.dot(q) * inv_det;
        if distance >= 0.0 {
            Some(distance)
        } else {
            None
        }
    }

    /// Uniformly samples a point on the triangle's surface from two uniform
    /// draws in `[0, 1)`, via the standard square-root barycentric mapping.
    pub fn sample_point(&self, r1: f64, r2: f64) -> Point3 {
        let s = r1.sqrt();
        let a = 1.0 - s;
        let b = (1.0 - r2) * s;
        self.v0 + self.e0 * a + self.e3 * b
    }

    /// True iff this triangle is a light emitter: non-zero emissivity and
    /// positive area (degenerate triangles never count as emitters, §4.5).
    pub fn is_emitter(&self) -> bool {
        !self.emissivity.is_zero() && self.area > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn axis_aligned_triangle() -> Triangle {
        Triangle::new(
            Point3::new(-1.0, 0.0, -1.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, 1.0),
            Vec3::splat(0.5),
            Vec3::zero(),
        )
    }

    #[test]
    fn normal_and_tangent_are_unit_length() {
        let t = axis_aligned_triangle();
        assert!((t.normal.length() - 1.0).abs() < 1e-12);
        assert!((t.tangent.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_ray_hits_at_geometric_distance() {
        let t = axis_aligned_triangle();
        // centroid of (-1,0,-1),(1,0,-1),(0,0,1) is (0,0,-1/3)
        let centroid = Point3::new(0.0, 0.0, -1.0 / 3.0);
        let origin = centroid + Vec3::new(0.0, 5.0, 0.0);
        let ray = Ray::new(origin, Vec3::new(0.0, -1.0, 0.0));
        let d = t.intersect(&ray).expect("ray should hit");
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn ray_parallel_to_plane_misses() {
        let t = axis_aligned_triangle();
        let ray = Ray::new(Point3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(t.intersect(&ray).is_none());
    }

    #[test]
    fn back_face_hit_still_returns_distance() {
        let t = axis_aligned_triangle();
        let centroid = Point3::new(0.0, 0.0, -1.0 / 3.0);
        let origin = centroid + Vec3::new(0.0, -5.0, 0.0);
        let ray = Ray::new(origin, Vec3::new(0.0, 1.0, 0.0));
        assert!(t.intersect(&ray).is_some());
    }

    #[test]
    fn sample_point_barycentrics_are_valid() {
        let t = axis_aligned_triangle();
        for i in 0..50 {
            for j in 0..50 {
                let r1 = i as f64 / 50.0;
                let r2 = j as f64 / 50.0;
                let p = t.sample_point(r1, r2);
                // solve p = v0 + a*e0 + b*e3 is implicit; just check within bound
                let bound = t.bound();
                assert!(p.x >= bound.min.x - 1e-9 && p.x <= bound.max.x + 1e-9);
                assert!(p.z >= bound.min.z - 1e-9 && p.z <= bound.max.z + 1e-9);
            }
        }
    }

    #[test]
    fn reflectivity_and_emissivity_are_clamped() {
        let t = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, -1.0, 0.5),
            Vec3::new(-3.0, 1.0, 0.0),
        );
        assert!(t.reflectivity.x < 1.0);
        assert_eq!(t.reflectivity.y, 0.0);
        assert_eq!(t.emissivity.x, 0.0);
        assert_eq!(t.emissivity.y, 1.0);
    }

    proptest! {
        /// The barycentric weights underlying `sample_point` satisfy
        /// a, b >= 0 and a + b <= 1 for every input in [0, 1)^2 (§8
        /// "Triangle sampling").
        #[test]
        fn sample_point_barycentrics_stay_in_the_triangle(r1 in 0.0f64..1.0, r2 in 0.0f64..1.0) {
            let s = r1.sqrt();
            let a = 1.0 - s;
            let b = (1.0 - r2) * s;
            prop_assert!(a >= 0.0);
            prop_assert!(b >= 0.0);
            prop_assert!(a + b <= 1.0 + 1e-12);
        }
    }
}

//! Octree spatial index over the scene's triangles.
//!
//! A node is a tagged sum — either a branch with eight child slots or a leaf
//! holding the triangle indices it contains — never a single struct with
//! nullable arrays standing in for both (§9 "degenerate-union node").
//! Triangles are referenced by index into the scene's triangle array; the
//! tree owns no geometry.

use crate::triangle::{Triangle, TOLERANCE};
use crate::vector::{Aabb, Point3, Ray};

pub const MAX_LEVELS: u32 = 44;
pub const MAX_ITEMS: usize = 8;

enum Node {
    Branch {
        bound: Aabb,
        children: [Option<Box<Node>>; 8],
    },
    Leaf {
        bound: Aabb,
        items: Vec<usize>,
    },
}

/// The nearest-hit result of a traversal: which triangle was struck, how far
/// along the ray, and the resolved world-space hit position.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub triangle: usize,
    pub distance: f64,
    pub position: Point3,
}

pub struct SpatialIndex {
    root: Node,
}

impl SpatialIndex {
    /// Builds the octree over `triangles`, with the root bound additionally
    /// enclosing `eye` so that the camera position is always inside the
    /// traversal's starting node (§4.4 step 2).
    pub fn build(eye: Point3, triangles: &[Triangle]) -> Self {
        let mut lo = eye;
        let mut hi = eye;
        for t in triangles {
            let b = t.bound();
            lo = Point3::new(lo.x.min(b.min.x), lo.y.min(b.min.y), lo.z.min(b.min.z));
            hi = Point3::new(hi.x.max(b.max.x), hi.y.max(b.max.y), hi.z.max(b.max.z));
        }
        let extent = hi - lo;
        let edge = extent.x.max(extent.y).max(extent.z);
        let hi = lo + crate::vector::Vec3::splat(edge);
        let root_bound = Aabb::new(lo, hi);

        let all: Vec<usize> = (0..triangles.len()).collect();
        let root = build_node(&all, root_bound, 0, triangles);
        Self { root }
    }

    /// Finds the nearest triangle struck by `ray`, ignoring `last_hit` (the
    /// triangle the ray originated from, to avoid immediate self-hits).
    pub fn nearest_hit(
        &self,
        ray: &Ray,
        last_hit: Option<usize>,
        triangles: &[Triangle],
    ) -> Option<Hit> {
        query(&self.root, ray, last_hit, ray.origin, triangles)
    }
}

fn midpoint(bound: &Aabb) -> Point3 {
    Point3::new(
        0.5 * (bound.min.x + bound.max.x),
        0.5 * (bound.min.y + bound.max.y),
        0.5 * (bound.min.z + bound.max.z),
    )
}

fn child_bound(bound: &Aabb, mid: Point3, octant: usize) -> Aabb {
    let lo_axis = |axis: usize, bit: bool| if bit { mid[axis] } else { bound.min[axis] };
    let hi_axis = |axis: usize, bit: bool| if bit { bound.max[axis] } else { mid[axis] };
    let bits = [octant & 1 != 0, (octant >> 1) & 1 != 0, (octant >> 2) & 1 != 0];
    let min = Point3::new(
        lo_axis(0, bits[0]),
        lo_axis(1, bits[1]),
        lo_axis(2, bits[2]),
    );
    let max = Point3::new(
        hi_axis(0, bits[0]),
        hi_axis(1, bits[1]),
        hi_axis(2, bits[2]),
    );
    Aabb::new(min, max)
}

/// Overlap test between a triangle's bound and a child cell: inclusive on
/// the lower side, exclusive on the upper side (§4.4 step 5), so a triangle
/// straddling the midpoint is placed into every overlapping child without
/// being silently dropped at a boundary.
fn overlaps(tri_bound: &Aabb, cell: &Aabb) -> bool {
    for axis in 0..3 {
        if tri_bound.max[axis] < cell.min[axis] || tri_bound.min[axis] >= cell.max[axis] {
            return false;
        }
    }
    true
}

fn build_node(items: &[usize], bound: Aabb, depth: u32, triangles: &[Triangle]) -> Node {
    if items.len() > MAX_ITEMS && depth < MAX_LEVELS - 1 {
        let mid = midpoint(&bound);
        let child_bounds: [Aabb; 8] = std::array::from_fn(|i| child_bound(&bound, mid, i));
        let mut child_items: [Vec<usize>; 8] = std::array::from_fn(|_| Vec::new());

        for &idx in items {
            let tb = triangles[idx].bound();
            for (octant, cb) in child_bounds.iter().enumerate() {
                if overlaps(&tb, cb) {
                    child_items[octant].push(idx);
                }
            }
        }

        let full_copies = child_items.iter().filter(|c| c.len() == items.len()).count();
        let min_edge = child_bounds
            .iter()
            .map(|b| (b.max.x - b.min.x).min(b.max.y - b.min.y).min(b.max.z - b.min.z))
            .fold(f64::INFINITY, f64::min);
        let degenerate = full_copies > 1 || min_edge < 4.0 * TOLERANCE;
        let next_depth = if degenerate { MAX_LEVELS } else { depth + 1 };

        let children: [Option<Box<Node>>; 8] = std::array::from_fn(|i| {
            if child_items[i].is_empty() {
                None
            } else {
                Some(Box::new(build_node(
                    &child_items[i],
                    child_bounds[i],
                    next_depth,
                    triangles,
                )))
            }
        });

        Node::Branch { bound, children }
    } else {
        Node::Leaf {
            bound,
            items: items.to_vec(),
        }
    }
}

fn point_in_expanded_bound(bound: &Aabb, p: Point3) -> bool {
    for axis in 0..3 {
        if p[axis] < bound.min[axis] - TOLERANCE || p[axis] > bound.max[axis] + TOLERANCE {
            return false;
        }
    }
    true
}

fn octant_of(mid: Point3, p: Point3) -> usize {
    let mut o = 0usize;
    if p.x >= mid.x {
        o |= 1;
    }
    if p.y >= mid.y {
        o |= 2;
    }
    if p.z >= mid.z {
        o |= 4;
    }
    o
}

fn query(
    node: &Node,
    ray: &Ray,
    last_hit: Option<usize>,
    mut start: Point3,
    triangles: &[Triangle],
) -> Option<Hit> {
    match node {
        Node::Leaf { bound, items } => {
            let mut best: Option<Hit> = None;
            for &idx in items {
                if Some(idx) == last_hit {
                    continue;
                }
                if let Some(d) = triangles[idx].intersect(ray) {
                    if best.is_some_and(|b| d >= b.distance) {
                        continue;
                    }
                    let p = ray.at(d);
                    if point_in_expanded_bound(bound, p) {
                        best = Some(Hit {
                            triangle: idx,
                            distance: d,
                            position: p,
                        });
                    }
                }
            }
            best
        }
        Node::Branch { bound, children } => {
            let mid = midpoint(bound);
            let mut octant = octant_of(mid, start);

            loop {
                if let Some(child) = &children[octant] {
                    if let Some(hit) = query(child, ray, last_hit, start, triangles) {
                        return Some(hit);
                    }
                }

                let bits = [octant & 1 != 0, (octant >> 1) & 1 != 0, (octant >> 2) & 1 != 0];
                let mut best_axis: Option<usize> = None;
                let mut best_t = f64::INFINITY;
                let mut exits_parent = false;

                for axis in 0..3 {
                    let d = ray.direction[axis];
                    if d == 0.0 {
                        continue;
                    }
                    let moving_positive = d > 0.0;
                    let at_outer = (moving_positive && bits[axis]) || (!moving_positive && !bits[axis]);
                    let face = if at_outer {
                        if moving_positive {
                            bound.max[axis]
                        } else {
                            bound.min[axis]
                        }
                    } else {
                        mid[axis]
                    };
                    let t = (face - ray.origin[axis]) / d;
                    if t < best_t {
                        best_t = t;
                        best_axis = Some(axis);
                        exits_parent = at_outer;
                    }
                }

                let Some(axis) = best_axis else {
                    return None;
                };
                if exits_parent {
                    return None;
                }

                octant ^= 1 << axis;
                start = ray.at(best_t);
            }
        }
    }
}

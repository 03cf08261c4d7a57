use super::MassProperties;
use crate::collision::AABB;
use crate::math::{Transform, Vec2};

/// Convex polygon in local space. Vertices are stored counter-clockwise;
/// clockwise input is reversed on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
}

impl Polygon {
    /// Creates a new polygon from a vector of vertices.
    ///
    /// Panics if fewer than 3 vertices are provided. Convexity is not enforced here;
    /// the world rejects non-convex shapes when objects are created.
    pub fn new(mut vertices: Vec<Vec2>) -> Self {
        if vertices.len() < 3 {
            panic!("Polygon must have at least 3 vertices.");
        }
        if signed_area(&vertices) < 0.0 {
            vertices.reverse();
        }
        let normals = edge_normals(&vertices);
        Polygon { vertices, normals }
    }

    /// Regular polygon with `sides` vertices on a circle of `radius`.
    pub fn regular(sides: usize, radius: f64) -> Self {
        let step = std::f64::consts::TAU / sides as f64;
        Self::new(
            (0..sides)
                .map(|i| Vec2::new(radius, 0.0).rotate(step * i as f64))
                .collect(),
        )
    }

    /// Outward edge normals; normal `i` belongs to the edge from vertex `i` to `i+1`.
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    pub fn support(&self, dir: Vec2) -> Vec2 {
        let mut best = self.vertices[0];
        let mut best_dot = best.dot(dir);
        for &v in &self.vertices[1..] {
            let d = v.dot(dir);
            if d > best_dot {
                best = v;
                best_dot = d;
            }
        }
        best
    }

    pub fn compute_aabb(&self, xform: &Transform) -> AABB {
        let mut min = xform.apply(self.vertices[0]);
        let mut max = min;
        for &v in &self.vertices[1..] {
            let p = xform.apply(v);
            min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
            max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
        }
        AABB::new(min, max)
    }

    /// Every turn along the boundary bends the same way (collinear runs allowed).
    pub fn is_convex(&self) -> bool {
        let n = self.vertices.len();
        (0..n).all(|i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let c = self.vertices[(i + 2) % n];
            (b - a).cross(c - b) >= -1e-12
        })
    }

    /// Area by the shoelace formula.
    pub fn calculate_area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    /// Centroid (center of mass for uniform density).
    pub fn calculate_centroid(&self) -> Vec2 {
        let n = self.vertices.len();
        let origin = self.vertices[0];
        let mut centroid = Vec2::ZERO;
        let mut area_sum = 0.0;

        for i in 1..(n - 1) {
            let v2 = self.vertices[i];
            let v3 = self.vertices[i + 1];
            let tri_area = (v2 - origin).cross(v3 - origin) / 2.0;
            area_sum += tri_area;
            centroid += (origin + v2 + v3) / 3.0 * tri_area;
        }

        if area_sum.abs() < 1e-10 {
            // Degenerate (collinear) outline: fall back to the vertex average.
            let sum = self.vertices.iter().fold(Vec2::ZERO, |acc, &v| acc + v);
            sum / n as f64
        } else {
            centroid / area_sum
        }
    }

    /// Second moment of area about the local origin, density 1.
    fn inertia_about_origin(&self) -> f64 {
        let n = self.vertices.len();
        let mut sum = 0.0;
        for i in 0..n {
            let v1 = self.vertices[i];
            let v2 = self.vertices[(i + 1) % n];
            sum += v1.cross(v2) * (v1.magnitude_squared() + v1.dot(v2) + v2.magnitude_squared());
        }
        sum / 12.0
    }

    pub fn compute_mass(&self, density: f64) -> MassProperties {
        let mass = self.calculate_area() * density;
        let centroid = self.calculate_centroid();
        // Parallel axis theorem moves the origin inertia onto the centroid.
        let inertia = (self.inertia_about_origin() * density - mass * centroid.magnitude_squared()).max(0.0);
        MassProperties { mass, inertia, centroid }
    }
}

fn signed_area(vertices: &[Vec2]) -> f64 {
    let n = vertices.len();
    let mut area = 0.0;
    for i in 0..n {
        area += vertices[i].cross(vertices[(i + 1) % n]);
    }
    area / 2.0
}

fn edge_normals(vertices: &[Vec2]) -> Vec<Vec2> {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let edge = vertices[(i + 1) % n] - vertices[i];
            // CCW winding: the outward side is to the right of the edge.
            Vec2::new(edge.y, -edge.x).normalize_or(Vec2::X)
        })
        .collect()
}

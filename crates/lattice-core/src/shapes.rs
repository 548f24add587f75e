// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Shapes
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Signed-distance geometry consumed by the node classifier.
//!
//! Only [`Shape::distance_to`] is used by the classifier. The concrete
//! shapes here cover configuration files and tests; any other geometry can
//! be registered by implementing the trait.

use lattice_types::config::ShapeConfig;
use lattice_types::state::Vec3;
use std::fmt::Debug;
use std::sync::Arc;

/// Distance query against a solid surface.
pub trait Shape: Debug + Send + Sync {
    /// Signed distance from `pos` to the nearest surface point (negative or
    /// zero inside the solid) and the vector from that surface point to `pos`.
    fn distance_to(&self, pos: &Vec3) -> (f64, Vec3);
}

/// Half-space `pos·n̂ <= dist`.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    normal: Vec3,
    dist: f64,
}

impl Wall {
    /// `normal` is normalised; it must be non-zero.
    pub fn new(normal: Vec3, dist: f64) -> Self {
        Wall {
            normal: normalized(&normal),
            dist,
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn dist(&self) -> f64 {
        self.dist
    }
}

impl Shape for Wall {
    fn distance_to(&self, pos: &Vec3) -> (f64, Vec3) {
        let d = dot(pos, &self.normal) - self.dist;
        (d, scale(&self.normal, d))
    }
}

/// Ball of radius `radius`; `direction = -1` makes it a spherical cavity.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
    pub direction: f64,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f64) -> Self {
        Sphere {
            center,
            radius,
            direction: 1.0,
        }
    }

    pub fn hollow(center: Vec3, radius: f64) -> Self {
        Sphere {
            center,
            radius,
            direction: -1.0,
        }
    }
}

impl Shape for Sphere {
    fn distance_to(&self, pos: &Vec3) -> (f64, Vec3) {
        let delta = sub(pos, &self.center);
        let len = norm(&delta);
        let gap = len - self.radius;
        let vec = if len > 0.0 {
            scale(&delta, gap / len)
        } else {
            [0.0; 3]
        };
        (self.direction * gap, vec)
    }
}

/// Finite cylinder of total `length` centred on `center` along `axis`.
/// An open cylinder has no end caps: only the mantle is solid.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    center: Vec3,
    axis: Vec3,
    radius: f64,
    length: f64,
    direction: f64,
    open: bool,
}

impl Cylinder {
    pub fn new(center: Vec3, axis: Vec3, radius: f64, length: f64) -> Self {
        Cylinder {
            center,
            axis: normalized(&axis),
            radius,
            length,
            direction: 1.0,
            open: false,
        }
    }

    pub fn with_direction(mut self, direction: f64) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }
}

impl Shape for Cylinder {
    fn distance_to(&self, pos: &Vec3) -> (f64, Vec3) {
        let delta = sub(pos, &self.center);
        let z = dot(&delta, &self.axis);
        let radial = sub(&delta, &scale(&self.axis, z));
        let r = norm(&radial);
        let e_r = if r > 0.0 { scale(&radial, 1.0 / r) } else { [0.0; 3] };
        let e_z = scale(&self.axis, z.signum());

        let dr = r - self.radius;
        let dz = z.abs() - 0.5 * self.length;

        let (dist, vec) = if self.open {
            if dz <= 0.0 {
                (dr, scale(&e_r, dr))
            } else {
                // nearest point is on the rim circle
                let d = (dr * dr + dz * dz).sqrt();
                (d, add(&scale(&e_r, dr), &scale(&e_z, dz)))
            }
        } else if dr <= 0.0 && dz <= 0.0 {
            if dr > dz {
                (dr, scale(&e_r, dr))
            } else {
                (dz, scale(&e_z, dz))
            }
        } else {
            let pr = dr.max(0.0);
            let pz = dz.max(0.0);
            (
                (pr * pr + pz * pz).sqrt(),
                add(&scale(&e_r, pr), &scale(&e_z, pz)),
            )
        };
        (self.direction * dist, vec)
    }
}

/// Build a shape from its configuration entry.
pub fn shape_from_config(cfg: &ShapeConfig) -> Arc<dyn Shape> {
    match *cfg {
        ShapeConfig::Wall { normal, dist } => Arc::new(Wall::new(normal, dist)),
        ShapeConfig::Sphere {
            center,
            radius,
            direction,
        } => Arc::new(Sphere {
            center,
            radius,
            direction,
        }),
        ShapeConfig::Cylinder {
            center,
            axis,
            radius,
            length,
            direction,
            open,
        } => Arc::new(
            Cylinder::new(center, axis, radius, length)
                .with_direction(direction)
                .with_open(open),
        ),
    }
}

fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: &Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn norm(a: &Vec3) -> f64 {
    dot(a, a).sqrt()
}

fn normalized(a: &Vec3) -> Vec3 {
    let n = norm(a);
    if n > 0.0 {
        scale(a, 1.0 / n)
    } else {
        *a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_signed_distance() {
        let wall = Wall::new([-2.0, 0.0, 0.0], -2.0);
        assert_eq!(wall.normal(), [-1.0, 0.0, 0.0]);
        let (d_fluid, _) = wall.distance_to(&[1.5, 0.0, 0.0]);
        let (d_solid, vec) = wall.distance_to(&[2.5, 7.0, -3.0]);
        assert!((d_fluid - 0.5).abs() < 1e-12);
        assert!((d_solid + 0.5).abs() < 1e-12);
        assert!((vec[0] - 0.5).abs() < 1e-12);
        let (d_surface, _) = wall.distance_to(&[2.0, 0.0, 0.0]);
        assert_eq!(d_surface, 0.0);
    }

    #[test]
    fn test_sphere_inside_outside() {
        let s = Sphere::new([1.0, 1.0, 1.0], 2.0);
        let (d_in, _) = s.distance_to(&[1.0, 1.0, 2.0]);
        let (d_out, vec) = s.distance_to(&[1.0, 1.0, 5.0]);
        assert!((d_in + 1.0).abs() < 1e-12);
        assert!((d_out - 2.0).abs() < 1e-12);
        assert!((vec[2] - 2.0).abs() < 1e-12);
        let (d_center, vec_center) = s.distance_to(&[1.0, 1.0, 1.0]);
        assert!((d_center + 2.0).abs() < 1e-12);
        assert_eq!(vec_center, [0.0; 3]);
    }

    #[test]
    fn test_hollow_sphere_inverts_sign() {
        let s = Sphere::hollow([0.0; 3], 3.0);
        let (d_in, _) = s.distance_to(&[1.0, 0.0, 0.0]);
        let (d_out, _) = s.distance_to(&[5.0, 0.0, 0.0]);
        assert!(d_in > 0.0);
        assert!(d_out < 0.0);
    }

    #[test]
    fn test_closed_cylinder_regions() {
        let c = Cylinder::new([0.0; 3], [0.0, 0.0, 2.0], 1.0, 4.0);
        // Inside, nearer to the mantle than to a cap.
        let (d, _) = c.distance_to(&[0.5, 0.0, 0.0]);
        assert!((d + 0.5).abs() < 1e-12);
        // Inside, nearer to the top cap.
        let (d, vec) = c.distance_to(&[0.0, 0.0, 1.8]);
        assert!((d + 0.2).abs() < 1e-12);
        assert!(vec[2] < 0.0);
        // Outside radially.
        let (d, _) = c.distance_to(&[3.0, 0.0, 0.0]);
        assert!((d - 2.0).abs() < 1e-12);
        // Outside diagonally beyond the rim.
        let (d, _) = c.distance_to(&[4.0, 0.0, 6.0]);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_open_cylinder_has_no_caps() {
        let c = Cylinder::new([0.0; 3], [1.0, 0.0, 0.0], 1.0, 2.0).with_open(true);
        // Inside the tube bore.
        let (d, _) = c.distance_to(&[0.0, 0.5, 0.0]);
        assert!(d < 0.0);
        // On the axis beyond the open end: distance to the rim circle.
        let (d, _) = c.distance_to(&[4.0, 0.0, 0.0]);
        assert!((d - 10.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_shape_from_config() {
        let cfg = ShapeConfig::Sphere {
            center: [0.0; 3],
            radius: 1.0,
            direction: -1.0,
        };
        let shape = shape_from_config(&cfg);
        let (d, _) = shape.distance_to(&[0.0; 3]);
        assert!((d - 1.0).abs() < 1e-12);

        let cfg = ShapeConfig::Wall {
            normal: [0.0, 0.0, 3.0],
            dist: 1.0,
        };
        let (d, _) = shape_from_config(&cfg).distance_to(&[0.0, 0.0, 4.0]);
        assert!((d - 3.0).abs() < 1e-12);
    }
}

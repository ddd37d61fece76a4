//! Geometry primitives for the host document
//!
//! Lengths are in the host's internal unit (feet).

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Shortest curve the host accepts
pub const SHORT_CURVE_TOLERANCE: f64 = 0.00256;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Curve length is too small for the host: {length:.6}")]
    CurveTooShort { length: f64 },

    #[error("Points are collinear, no plane can pass through them")]
    Collinear,

    #[error("Zero-length direction vector")]
    ZeroVector,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    pub const ZERO: Xyz = Xyz::new(0.0, 0.0, 0.0);
    pub const BASIS_X: Xyz = Xyz::new(1.0, 0.0, 0.0);
    pub const BASIS_Y: Xyz = Xyz::new(0.0, 1.0, 0.0);
    pub const BASIS_Z: Xyz = Xyz::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(p: [f64; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }

    pub fn dot(&self, other: Xyz) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: Xyz) -> Xyz {
        Xyz::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    pub fn distance_to(&self, other: Xyz) -> f64 {
        (*self - other).length()
    }

    pub fn normalize(&self) -> Result<Xyz, GeometryError> {
        let len = self.length();
        if len < EPSILON {
            return Err(GeometryError::ZeroVector);
        }
        Ok(*self * (1.0 / len))
    }
}

impl Add for Xyz {
    type Output = Xyz;
    fn add(self, rhs: Xyz) -> Xyz {
        Xyz::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Xyz {
    type Output = Xyz;
    fn sub(self, rhs: Xyz) -> Xyz {
        Xyz::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Xyz {
    type Output = Xyz;
    fn mul(self, rhs: f64) -> Xyz {
        Xyz::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Xyz {
    type Output = Xyz;
    fn neg(self) -> Xyz {
        Xyz::new(-self.x, -self.y, -self.z)
    }
}

/// A bounded straight curve
///
/// Only constructible through [`Line::bound`], so every `Line` in the
/// document is at least [`SHORT_CURVE_TOLERANCE`] long.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    start: Xyz,
    end: Xyz,
}

impl Line {
    pub fn bound(start: Xyz, end: Xyz) -> Result<Self, GeometryError> {
        let length = start.distance_to(end);
        if length < SHORT_CURVE_TOLERANCE {
            return Err(GeometryError::CurveTooShort { length });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Xyz {
        self.start
    }

    pub fn end(&self) -> Xyz {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(self.end)
    }

    pub fn direction(&self) -> Xyz {
        (self.end - self.start) * (1.0 / self.length())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Xyz,
    pub normal: Xyz,
}

impl Plane {
    pub fn by_three_points(a: Xyz, b: Xyz, c: Xyz) -> Result<Self, GeometryError> {
        let normal = (b - a)
            .cross(c - a)
            .normalize()
            .map_err(|_| GeometryError::Collinear)?;
        Ok(Self { origin: a, normal })
    }

    /// A plane containing the segment `p1`-`p2`
    ///
    /// The third point is offset along Z, or along X when the segment is
    /// vertical.
    pub fn for_line(p1: Xyz, p2: Xyz) -> Result<Self, GeometryError> {
        let seed = if (p2 - p1).cross(Xyz::BASIS_Z).length() < EPSILON {
            Xyz::BASIS_X
        } else {
            Xyz::BASIS_Z
        };
        Self::by_three_points(p1, p2, p1 + seed)
    }

    pub fn distance_to(&self, p: Xyz) -> f64 {
        (p - self.origin).dot(self.normal).abs()
    }

    pub fn contains_line(&self, line: &Line) -> bool {
        self.distance_to(line.start()) < SHORT_CURVE_TOLERANCE
            && self.distance_to(line.end()) < SHORT_CURVE_TOLERANCE
    }
}

/// Rigid transform: origin plus orthonormal basis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub origin: Xyz,
    pub basis_x: Xyz,
    pub basis_y: Xyz,
    pub basis_z: Xyz,
}

impl Transform {
    pub fn identity() -> Self {
        Self::translation(Xyz::ZERO)
    }

    pub fn translation(origin: Xyz) -> Self {
        Self {
            origin,
            basis_x: Xyz::BASIS_X,
            basis_y: Xyz::BASIS_Y,
            basis_z: Xyz::BASIS_Z,
        }
    }

    pub fn of_vector(&self, v: Xyz) -> Xyz {
        self.basis_x * v.x + self.basis_y * v.y + self.basis_z * v.z
    }

    pub fn of_point(&self, p: Xyz) -> Xyz {
        self.origin + self.of_vector(p)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Xyz,
    pub max: Xyz,
}

impl BoundingBox {
    pub fn new(min: Xyz, max: Xyz) -> Self {
        Self { min, max }
    }
}

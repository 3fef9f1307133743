use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::{Angle, EPSILON_DIST};

/// A 2D point, or a vector between two points. Double precision, in map units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub const ZERO: Pt2D = Pt2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Pt2D {
        Pt2D { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    /// Treating this point as a vector, its magnitude.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    pub fn normalize(self) -> Pt2D {
        let len = self.length();
        if len < EPSILON_DIST {
            return Pt2D::ZERO;
        }
        Pt2D::new(self.x / len, self.y / len)
    }

    pub fn dot(self, other: Pt2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Rotated 90 degrees counter-clockwise.
    pub fn perpendicular(self) -> Pt2D {
        Pt2D::new(-self.y, self.x)
    }

    pub fn dist_to(self, to: Pt2D) -> f64 {
        (to - self).length()
    }

    pub fn approx_eq(self, other: Pt2D, threshold: f64) -> bool {
        self.dist_to(other) <= threshold
    }

    pub fn angle_to(self, to: Pt2D) -> Angle {
        Angle::new_rads((to.y - self.y).atan2(to.x - self.x))
    }

    pub fn offset(self, dx: f64, dy: f64) -> Pt2D {
        Pt2D::new(self.x + dx, self.y + dy)
    }

    /// The average of some points. Panics on an empty slice.
    pub fn center(pts: &[Pt2D]) -> Pt2D {
        let mut x = 0.0;
        let mut y = 0.0;
        for pt in pts {
            x += pt.x;
            y += pt.y;
        }
        let len = pts.len() as f64;
        Pt2D::new(x / len, y / len)
    }
}

impl Add for Pt2D {
    type Output = Pt2D;

    fn add(self, other: Pt2D) -> Pt2D {
        Pt2D::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Pt2D {
    type Output = Pt2D;

    fn sub(self, other: Pt2D) -> Pt2D {
        Pt2D::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Pt2D {
    type Output = Pt2D;

    fn mul(self, factor: f64) -> Pt2D {
        Pt2D::new(self.x * factor, self.y * factor)
    }
}

impl Neg for Pt2D {
    type Output = Pt2D;

    fn neg(self) -> Pt2D {
        Pt2D::new(-self.x, -self.y)
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x, self.y)
    }
}

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An angle, stored in radians. Not necessarily normalized.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        Angle(rads)
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle(degs.to_radians())
    }

    pub fn opposite(self) -> Angle {
        Angle(self.0 + PI)
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        Angle(self.0 + degrees.to_radians())
    }

    /// In [0, 2pi)
    pub fn normalized_radians(self) -> f64 {
        let rads = self.0.rem_euclid(2.0 * PI);
        // rem_euclid can round up to exactly 2pi for tiny negative inputs
        if rads >= 2.0 * PI {
            0.0
        } else {
            rads
        }
    }

    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }

    /// The undirected separation between two angles, in [0, pi]. 0 means the same heading, pi
    /// means exactly opposite.
    pub fn separation(self, other: Angle) -> f64 {
        let diff = (self.0 - other.0).rem_euclid(2.0 * PI);
        if diff > PI {
            2.0 * PI - diff
        } else {
            diff
        }
    }

    /// True if the two angles are within `within_degrees` of each other.
    pub fn approx_eq(self, other: Angle, within_degrees: f64) -> bool {
        self.separation(other).to_degrees() <= within_degrees
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}

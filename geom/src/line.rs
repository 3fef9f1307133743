use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Angle, Pt2D};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line(pt1, pt2)
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> f64 {
        self.0.dist_to(self.1)
    }

    pub fn angle(&self) -> Angle {
        self.0.angle_to(self.1)
    }

    /// Unit vector from pt1 towards pt2. Zero for a degenerate segment.
    pub fn direction(&self) -> Pt2D {
        (self.1 - self.0).normalize()
    }

    /// Unit vector pointing to the left of the direction of travel.
    pub fn left_normal(&self) -> Pt2D {
        self.direction().perpendicular()
    }

    pub fn reversed(&self) -> Line {
        Line(self.1, self.0)
    }

    /// The point `percent` of the way along, unclamped.
    pub fn percent_along(&self, percent: f64) -> Pt2D {
        self.0 + (self.1 - self.0) * percent
    }

    pub fn middle(&self) -> Pt2D {
        self.percent_along(0.5)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line({} to {})", self.0, self.1)
    }
}

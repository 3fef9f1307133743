use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{Bounds, Line, Pt2D, EPSILON_DIST};

/// An ordered sequence of at least two points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    pts: Vec<Pt2D>,
}

/// Where a point falls relative to a polyline, as produced by `PolyLine::linear_coords`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearCoords {
    /// Distance along the polyline to `closest`. Outside [0, length] only when the point projects
    /// past a true end and ends weren't allowed.
    pub a: f64,
    /// Signed perpendicular distance. Positive means the point is to the left of the direction of
    /// travel.
    pub b: f64,
    pub closest: Pt2D,
    /// Index of the segment `closest` lies on; segment `i` runs from point `i` to point `i + 1`.
    pub segment: usize,
    /// How far along that segment, from 0 to 1.
    pub fraction: f64,
    /// Total length of the polyline.
    pub length: f64,
}

impl PolyLine {
    pub fn new(pts: Vec<Pt2D>) -> Result<PolyLine> {
        if pts.len() < 2 {
            bail!("A PolyLine needs at least 2 points, not {}", pts.len());
        }
        Ok(PolyLine { pts })
    }

    /// Like `new`, but panics on fewer than two points. Only for callers that just built the
    /// points themselves.
    pub fn must_new(pts: Vec<Pt2D>) -> PolyLine {
        PolyLine::new(pts).unwrap()
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    pub fn into_points(self) -> Vec<Pt2D> {
        self.pts
    }

    pub fn len(&self) -> usize {
        self.pts.len()
    }

    pub fn first_pt(&self) -> Pt2D {
        self.pts[0]
    }

    pub fn last_pt(&self) -> Pt2D {
        self.pts[self.pts.len() - 1]
    }

    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.pts.windows(2).map(|pair| Line::new(pair[0], pair[1]))
    }

    pub fn length(&self) -> f64 {
        self.lines().map(|l| l.length()).sum()
    }

    pub fn get_bounds(&self) -> Bounds {
        Bounds::from(&self.pts)
    }

    pub fn reversed(&self) -> PolyLine {
        let mut pts = self.pts.clone();
        pts.reverse();
        PolyLine { pts }
    }

    /// Replace the first or last point.
    pub fn with_end_pt(mut self, is_start: bool, pt: Pt2D) -> PolyLine {
        if is_start {
            self.pts[0] = pt;
        } else {
            let last = self.pts.len() - 1;
            self.pts[last] = pt;
        }
        self
    }

    /// Splits at an interior vertex. The vertex appears at the end of the first piece and the
    /// start of the second.
    pub fn split_at_index(&self, idx: usize) -> Result<(PolyLine, PolyLine)> {
        if idx == 0 || idx >= self.pts.len() - 1 {
            bail!(
                "Can't split a PolyLine with {} points at index {}",
                self.pts.len(),
                idx
            );
        }
        Ok((
            PolyLine {
                pts: self.pts[..=idx].to_vec(),
            },
            PolyLine {
                pts: self.pts[idx..].to_vec(),
            },
        ))
    }

    /// Removes consecutive points closer than `threshold`. The first and last points always
    /// survive. Returns None if the result would collapse below two points.
    pub fn dedup(&self, threshold: f64) -> Option<(PolyLine, usize)> {
        let mut pts: Vec<Pt2D> = Vec::with_capacity(self.pts.len());
        for pt in &self.pts {
            if pts.last().map(|last| last.approx_eq(*pt, threshold)) != Some(true) {
                pts.push(*pt);
            }
        }
        // Keep the true last point, even if a nearby interior point was kept before it
        let last = self.last_pt();
        if let Some(kept) = pts.last_mut() {
            *kept = last;
        }
        let removed = self.pts.len() - pts.len();
        PolyLine::new(pts).ok().map(|pl| (pl, removed))
    }

    /// Projects `pt` onto this polyline, keeping the candidate with the smallest perpendicular
    /// distance.
    ///
    /// Beyond an interior vertex, a segment's projection is clamped to that vertex. Beyond a true
    /// end of the polyline, the projection is clamped only if `allow_ends` is set; otherwise the
    /// segment is extended, so `a` can be negative or exceed the length.
    pub fn linear_coords(&self, pt: Pt2D, allow_ends: bool) -> LinearCoords {
        let last_segment = self.pts.len() - 2;
        let mut best: Option<LinearCoords> = None;
        let mut dist_so_far = 0.0;

        for (idx, line) in self.lines().enumerate() {
            let len = line.length();
            if len < EPSILON_DIST {
                continue;
            }
            let forward = line.direction();
            let across = forward.perpendicular();
            let rel = pt - line.pt1();
            let v = rel.dot(across);
            let mut u = rel.dot(forward);

            let mut clamped = false;
            if u < 0.0 && (idx != 0 || allow_ends) {
                u = 0.0;
                clamped = true;
            } else if u > len && (idx != last_segment || allow_ends) {
                u = len;
                clamped = true;
            }

            let closest = line.pt1() + forward * u;
            let b = if clamped {
                let dist = pt.dist_to(closest);
                if v < 0.0 {
                    -dist
                } else {
                    dist
                }
            } else {
                v
            };

            if best.map(|prev| b.abs() < prev.b.abs()).unwrap_or(true) {
                best = Some(LinearCoords {
                    a: dist_so_far + u,
                    b,
                    closest,
                    segment: idx,
                    fraction: u / len,
                    length: 0.0,
                });
            }
            dist_so_far += len;
        }

        // Every segment was degenerate; the whole polyline is one location.
        let mut result = best.unwrap_or_else(|| LinearCoords {
            a: 0.0,
            b: pt.dist_to(self.pts[0]),
            closest: self.pts[0],
            segment: 0,
            fraction: 0.0,
            length: 0.0,
        });
        result.length = dist_so_far;
        result
    }

    /// Unsigned distance from a point to this polyline.
    pub fn dist_to_pt(&self, pt: Pt2D, allow_ends: bool) -> f64 {
        self.linear_coords(pt, allow_ends).b.abs()
    }

    /// For every vertex, the vector that moves it one unit to the left of the polyline, keeping
    /// the shifted edges parallel to the original segments. End vertices use their only segment's
    /// normal. Interior vertices use the bisector of the adjacent normals, lengthened through
    /// turns sharper than `colinear_dot` by up to `max_miter`.
    pub fn miter_offsets(&self, colinear_dot: f64, max_miter: f64) -> Vec<Pt2D> {
        let normals: Vec<Pt2D> = self.lines().map(|l| l.left_normal()).collect();
        let last = self.pts.len() - 1;
        let mut offsets = Vec::with_capacity(self.pts.len());

        for idx in 0..self.pts.len() {
            if idx == 0 {
                offsets.push(normals[0]);
                continue;
            }
            if idx == last {
                offsets.push(normals[last - 1]);
                continue;
            }

            let n1 = normals[idx - 1];
            let n2 = normals[idx];
            if n1 == Pt2D::ZERO || n2 == Pt2D::ZERO {
                offsets.push(if n1 == Pt2D::ZERO { n2 } else { n1 });
                continue;
            }
            let bisector = (n1 + n2).normalize();
            if bisector == Pt2D::ZERO {
                // The polyline doubles back on itself
                offsets.push(n1);
                continue;
            }
            if n1.dot(n2) >= colinear_dot {
                offsets.push(bisector);
                continue;
            }
            // The bisector makes half the turn angle with each normal; dividing by the cosine of
            // that keeps the shifted segments at exactly unit distance.
            let half_cos = bisector.dot(n1);
            let factor = (1.0 / half_cos).min(max_miter);
            offsets.push(bisector * factor);
        }
        offsets
    }
}

impl fmt::Display for PolyLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "PolyLine::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}

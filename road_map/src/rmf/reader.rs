use std::io::Read;

use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt};

use geom::{Bounds, Pt2D};

use crate::rmf::FormatVersion;
use crate::{IntersectionType, LightStatus, LinkDefaults, Projection, SurfaceType};

const MAX_WKT_LEN: usize = 1 << 20;

/// Reads the primitive fields of an RMF file, choosing each field's width from the version in the
/// header.
pub(crate) struct RmfReader<R: Read> {
    inner: R,
    pub version: FormatVersion,
}

/// Per-link widths, in meters.
pub(crate) struct LinkWidths {
    pub sidewalk: f32,
    pub curb_height: f32,
    pub margin: f32,
    pub lane: f32,
    pub parking: f32,
}

impl<R: Read> RmfReader<R> {
    /// Consumes and checks the header.
    pub fn new(mut inner: R) -> Result<RmfReader<R>> {
        let mut header = [0; 11];
        inner
            .read_exact(&mut header)
            .context("file too short for an RMF header")?;
        if &header[..7] != b"RMFFile" {
            bail!("not an RMF file; the header is {:?}", String::from_utf8_lossy(&header));
        }
        let raw = String::from_utf8_lossy(&header[7..]);
        let version = FormatVersion::parse(raw.trim_end_matches('\0'))?;
        if !version.is_supported() {
            bail!(
                "RMF version {} is unsupported; only {} through {} can be read",
                version,
                FormatVersion::OLDEST_READABLE,
                FormatVersion::CURRENT
            );
        }
        Ok(RmfReader { inner, version })
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(self.inner.read_i32::<LittleEndian>()?)
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(self.inner.read_f32::<LittleEndian>()?)
    }

    pub fn f64(&mut self) -> Result<f64> {
        Ok(self.inner.read_f64::<LittleEndian>()?)
    }

    /// A count that must not be negative.
    pub fn count(&mut self, what: &str) -> Result<usize> {
        let x = self.i32()?;
        usize::try_from(x).map_err(|_| anyhow!("negative {} count {}", what, x))
    }

    /// A fixed, NUL-terminated section marker.
    pub fn marker(&mut self, expected: &[u8]) -> Result<()> {
        let mut buf = vec![0; expected.len()];
        self.inner
            .read_exact(&mut buf)
            .with_context(|| format!("missing {:?} marker", String::from_utf8_lossy(expected)))?;
        if buf != expected {
            bail!(
                "expected the {:?} marker, found {:?}",
                String::from_utf8_lossy(expected),
                String::from_utf8_lossy(&buf)
            );
        }
        Ok(())
    }

    pub fn projection(&mut self) -> Result<Projection> {
        if self.version.has_wkt_projection() {
            let len = self.count("projection length")?;
            if len > MAX_WKT_LEN {
                bail!("projection is {} bytes long; the file is probably corrupt", len);
            }
            let mut wkt = vec![0; len];
            self.inner.read_exact(&mut wkt)?;
            let wkt = String::from_utf8_lossy(&wkt)
                .trim_end_matches('\0')
                .to_string();
            Ok(Projection::Wkt(wkt))
        } else {
            let utm = self.i32()? != 0;
            let zone = self.i32()?;
            let datum = self.i32()?;
            Ok(Projection::Legacy { utm, zone, datum })
        }
    }

    /// Stored as left, right, bottom, top.
    pub fn extent(&mut self) -> Result<Bounds> {
        let mut values = [0.0; 4];
        for value in &mut values {
            *value = if self.version.has_double_extent() {
                self.f64()?
            } else {
                self.i32()? as f64
            };
        }
        Ok(Bounds {
            min_x: values[0],
            max_x: values[1],
            min_y: values[2],
            max_y: values[3],
        })
    }

    pub fn coord(&mut self) -> Result<Pt2D> {
        if self.version.has_double_coords() {
            let x = self.f64()?;
            let y = self.f64()?;
            Ok(Pt2D::new(x, y))
        } else {
            let x = self.i32()?;
            let y = self.i32()?;
            Ok(Pt2D::new(x as f64, y as f64))
        }
    }

    pub fn link_flags(&mut self) -> Result<u32> {
        let raw = self.i32()? as u32;
        if self.version.has_separate_flags() {
            Ok(raw)
        } else {
            Ok(raw >> 16)
        }
    }

    /// Older files don't store these; the defaults stand in.
    pub fn link_widths(&mut self, defaults: &LinkDefaults) -> Result<LinkWidths> {
        if !self.version.has_link_widths() {
            return Ok(LinkWidths {
                sidewalk: defaults.sidewalk_width,
                curb_height: defaults.curb_height,
                margin: defaults.margin_width,
                lane: defaults.lane_width,
                parking: defaults.parking_width,
            });
        }
        Ok(LinkWidths {
            sidewalk: self.f32()?,
            curb_height: self.f32()?,
            margin: self.f32()?,
            lane: self.f32()?,
            parking: self.f32()?,
        })
    }

    pub fn surface(&mut self) -> Result<SurfaceType> {
        let x = self.i32()?;
        SurfaceType::from_i32(x).ok_or_else(|| anyhow!("unknown surface type {}", x))
    }

    pub fn intersection_type(&mut self) -> Result<IntersectionType> {
        let x = self.i32()?;
        IntersectionType::from_i32(x).ok_or_else(|| anyhow!("unknown intersection type {}", x))
    }

    pub fn light_status(&mut self) -> Result<LightStatus> {
        let x = self.i32()?;
        LightStatus::from_i32(x).ok_or_else(|| anyhow!("unknown light status {}", x))
    }
}

use std::fmt;

use anyhow::Result;

/// An RMF format version, stored in hundredths so that 1.89 sits between 1.8 and 1.9.
///
/// Every layout difference between versions is answered by one of the predicates here, so the
/// reader never compares version numbers itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FormatVersion(u32);

impl FormatVersion {
    pub const V1_7: FormatVersion = FormatVersion(170);
    pub const V1_8: FormatVersion = FormatVersion(180);
    pub const V1_89: FormatVersion = FormatVersion(189);
    pub const V1_9: FormatVersion = FormatVersion(190);
    pub const V2_0: FormatVersion = FormatVersion(200);

    pub const OLDEST_READABLE: FormatVersion = FormatVersion::V1_7;
    pub const CURRENT: FormatVersion = FormatVersion::V2_0;

    /// Parses something like "2.0" or "1.89".
    pub fn parse(raw: &str) -> Result<FormatVersion> {
        let (major, minor) = match raw.trim().split_once('.') {
            Some(pair) => pair,
            None => bail!("RMF version {:?} has no decimal point", raw),
        };
        let major: u32 = major
            .parse()
            .map_err(|_| anyhow!("RMF version {:?} has a bad major number", raw))?;
        if minor.is_empty() || minor.len() > 2 || !minor.chars().all(|c| c.is_ascii_digit()) {
            bail!("RMF version {:?} has a bad minor number", raw);
        }
        let mut hundredths: u32 = minor.parse()?;
        if minor.len() == 1 {
            hundredths *= 10;
        }
        Ok(FormatVersion(major * 100 + hundredths))
    }

    pub fn is_supported(self) -> bool {
        self >= FormatVersion::OLDEST_READABLE && self <= FormatVersion::CURRENT
    }

    /// Projection as a length-prefixed WKT string, rather than three integers
    pub fn has_wkt_projection(self) -> bool {
        self >= FormatVersion::V1_9
    }

    /// Map extent as doubles, rather than integers
    pub fn has_double_extent(self) -> bool {
        self >= FormatVersion::V1_9
    }

    /// Node and link coordinates as doubles, rather than integers
    pub fn has_double_coords(self) -> bool {
        self >= FormatVersion::V1_8
    }

    /// Link flags in their own word, rather than the high half of a combined one
    pub fn has_separate_flags(self) -> bool {
        self >= FormatVersion::V1_89
    }

    /// Sidewalk, curb, margin, lane and parking widths stored per link
    pub fn has_link_widths(self) -> bool {
        self >= FormatVersion::V2_0
    }

    /// The 11 bytes at the start of a file, NUL padded.
    pub fn header(self) -> [u8; 11] {
        let mut header = [0; 11];
        let text = format!("RMFFile{}", self);
        let len = text.len().min(header.len());
        header[..len].copy_from_slice(&text.as_bytes()[..len]);
        header
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 % 10 == 0 {
            write!(f, "{}.{}", self.0 / 100, (self.0 % 100) / 10)
        } else {
            write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
        }
    }
}

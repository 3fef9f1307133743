use serde::{Deserialize, Serialize};

const WGS84_GEOGCS: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#;

/// The coordinate reference system of a map. The network doesn't reproject anything; it only needs
/// to know whether coordinates are degrees or meters, and to carry the description through files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Well-known text, as stored by RMF 1.9 and later. Empty means unknown, treated as meters.
    Wkt(String),
    /// The integer encoding used by files older than 1.9. A negative zone is in the southern
    /// hemisphere.
    Legacy { utm: bool, zone: i32, datum: i32 },
}

impl Default for Projection {
    fn default() -> Projection {
        Projection::Wkt(String::new())
    }
}

impl Projection {
    /// Are coordinates longitude and latitude?
    pub fn is_geographic(&self) -> bool {
        match self {
            Projection::Wkt(wkt) => wkt.trim_start().to_uppercase().starts_with("GEOGCS"),
            Projection::Legacy { utm, .. } => !utm,
        }
    }

    pub fn to_wkt(&self) -> String {
        match self {
            Projection::Wkt(wkt) => wkt.clone(),
            Projection::Legacy { utm: false, .. } => WGS84_GEOGCS.to_string(),
            Projection::Legacy {
                utm: true,
                zone,
                datum,
            } => {
                let hemisphere = if *zone < 0 { "S" } else { "N" };
                let zone = zone.abs();
                let false_northing = if hemisphere == "S" { 10_000_000 } else { 0 };
                format!(
                    r#"PROJCS["UTM Zone {zone}{hemisphere} (legacy datum {datum})",{WGS84_GEOGCS},PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",{}],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",{false_northing}],UNIT["metre",1]]"#,
                    zone * 6 - 183
                )
            }
        }
    }
}

//! Well-known text, for diagnostics and tests.

use crate::engine::Engine;
use crate::errors::{GeomError, Result};
use crate::geometry::Geometry;
use geo_types::Geometry as GeoGeometry;
use std::convert::TryFrom;
use std::str::FromStr;
use wkt::{ToWkt, Wkt};

pub fn parse_wkt(wkt_str: &str) -> Result<GeoGeometry<f64>> {
    let wkt = Wkt::<f64>::from_str(wkt_str).map_err(|e| GeomError::Parse(e.to_string()))?;
    GeoGeometry::try_from(wkt).map_err(|e: wkt::conversion::Error| GeomError::Parse(e.to_string()))
}

impl Geometry {
    pub fn to_wkt(&self) -> Result<String> {
        if self.has_non_finite() {
            return Err(GeomError::Serialization(format!(
                "{} has non-finite coordinates",
                self.geom_type()
            )));
        }
        Ok(self.geo().wkt_string())
    }
}

impl Engine {
    pub fn from_wkt(&self, wkt_str: &str) -> Result<Geometry> {
        Ok(Geometry::new(self, parse_wkt(wkt_str)?))
    }
}

//! ISO well-known binary, 2D only.
//!
//! Encoding and decoding go through the `wkb` crate. Before decoding, the
//! element headers are walked once to reject input this crate does not
//! accept: extended (Z, M or SRID) types, empty points, trailing bytes and
//! collections nested too deeply to decode safely.

use crate::config::WkbByteOrder;
use crate::engine::Engine;
use crate::errors::{GeomError, Result};
use crate::geometry::Geometry;
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use geo::CoordsIter;
use geo_traits::to_geo::ToGeoGeometry;
use geo_types::{Geometry as GeoGeometry, GeometryCollection, LineString};
use std::borrow::Cow;
use std::io::Cursor;
use wkb::writer::{write_geometry, WriteOptions};
use wkb::Endianness;

const POINT: u32 = 1;
const LINE_STRING: u32 = 2;
const POLYGON: u32 = 3;
const MULTI_POINT: u32 = 4;
const GEOMETRY_COLLECTION: u32 = 7;

const COORD_SIZE: u64 = 16;
// Smallest possible member of a multi geometry or collection.
const HEADER_SIZE: u64 = 5;

/// Deepest nesting of multi geometries and collections accepted on read.
pub const MAX_NESTING: usize = 32;

/// Line, Rect and Triangle have no WKB type of their own.
fn iso_form(geom: &GeoGeometry<f64>) -> Cow<'_, GeoGeometry<f64>> {
    match geom {
        GeoGeometry::Line(l) => Cow::Owned(LineString::from(*l).into()),
        GeoGeometry::Rect(r) => Cow::Owned(r.to_polygon().into()),
        GeoGeometry::Triangle(t) => Cow::Owned(t.to_polygon().into()),
        GeoGeometry::GeometryCollection(gc)
            if gc.0.iter().any(|g| matches!(iso_form(g), Cow::Owned(_))) =>
        {
            let members = gc.0.iter().map(|g| iso_form(g).into_owned()).collect();
            Cow::Owned(GeoGeometry::GeometryCollection(GeometryCollection::new_from(members)))
        }
        _ => Cow::Borrowed(geom),
    }
}

/// Encode a geometry as WKB.
pub fn write_wkb(geom: &GeoGeometry<f64>, order: WkbByteOrder) -> Result<Vec<u8>> {
    if let Some(coord) = geom
        .coords_iter()
        .find(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(GeomError::Serialization(format!(
            "non-finite coordinate ({}, {})",
            coord.x, coord.y
        )));
    }
    let endianness = match order {
        WkbByteOrder::Little => Endianness::LittleEndian,
        WkbByteOrder::Big => Endianness::BigEndian,
    };
    let mut buf = Vec::new();
    write_geometry(&mut buf, &*iso_form(geom), &WriteOptions { endianness })
        .map_err(|e| GeomError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn truncated(e: std::io::Error) -> GeomError {
    GeomError::Parse(format!("truncated WKB: {}", e))
}

struct Layout<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Layout<'a> {
    fn remaining(&self) -> u64 {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position())
    }

    /// Read a count and make sure the input could hold that many items.
    fn count<B: ByteOrder>(&mut self, item_size: u64) -> Result<u32> {
        let n = self.cursor.read_u32::<B>().map_err(truncated)?;
        if u64::from(n) * item_size > self.remaining() {
            return Err(GeomError::Parse(format!(
                "count {} exceeds remaining {} bytes",
                n,
                self.remaining()
            )));
        }
        Ok(n)
    }

    fn skip_path<B: ByteOrder>(&mut self) -> Result<()> {
        let n = self.count::<B>(COORD_SIZE)?;
        let end = self.cursor.position() + u64::from(n) * COORD_SIZE;
        self.cursor.set_position(end);
        Ok(())
    }

    /// Step over one element header and its own coordinates. Multi
    /// geometries and collections return their member count.
    fn element(&mut self) -> Result<Option<u32>> {
        match self.cursor.read_u8().map_err(truncated)? {
            0 => self.body::<BigEndian>(),
            1 => self.body::<LittleEndian>(),
            other => Err(GeomError::Parse(format!("invalid byte order {}", other))),
        }
    }

    fn body<B: ByteOrder>(&mut self) -> Result<Option<u32>> {
        match self.cursor.read_u32::<B>().map_err(truncated)? {
            POINT => {
                let x = self.cursor.read_f64::<B>().map_err(truncated)?;
                let y = self.cursor.read_f64::<B>().map_err(truncated)?;
                if x.is_nan() && y.is_nan() {
                    return Err(GeomError::Parse("empty point".to_owned()));
                }
                Ok(None)
            }
            LINE_STRING => self.skip_path::<B>().map(|_| None),
            POLYGON => {
                let rings = self.count::<B>(4)?;
                for _ in 0..rings {
                    self.skip_path::<B>()?;
                }
                Ok(None)
            }
            MULTI_POINT..=GEOMETRY_COLLECTION => self.count::<B>(HEADER_SIZE).map(Some),
            other => Err(GeomError::Parse(format!(
                "unsupported WKB geometry type {:#x}",
                other
            ))),
        }
    }
}

/// Walk the element tree without recursion.
fn check_layout(bytes: &[u8]) -> Result<()> {
    let mut layout = Layout {
        cursor: Cursor::new(bytes),
    };
    // Elements still to visit at each nesting level.
    let mut pending: Vec<u32> = vec![1];
    while let Some(remaining) = pending.last_mut() {
        if *remaining == 0 {
            pending.pop();
            continue;
        }
        *remaining -= 1;
        if let Some(members) = layout.element()? {
            if pending.len() > MAX_NESTING {
                return Err(GeomError::Parse(format!(
                    "geometry nested deeper than {} levels",
                    MAX_NESTING
                )));
            }
            pending.push(members);
        }
    }
    match layout.remaining() {
        0 => Ok(()),
        n => Err(GeomError::Parse(format!("{} trailing bytes after geometry", n))),
    }
}

/// Decode WKB in either byte order.
pub fn read_wkb(bytes: &[u8]) -> Result<GeoGeometry<f64>> {
    check_layout(bytes)?;
    let wkb = wkb::reader::read_wkb(bytes).map_err(|e| GeomError::Parse(e.to_string()))?;
    wkb.try_to_geometry()
        .ok_or_else(|| GeomError::Parse("geometry has no geo-types equivalent".to_owned()))
}

impl Engine {
    /// Serialize with the byte order from the engine's configuration.
    pub fn to_wkb(&self, geom: &Geometry) -> Result<Vec<u8>> {
        if let Some(index) = geom.first_non_finite() {
            return Err(GeomError::Serialization(format!(
                "{} has a non-finite coordinate at {}",
                geom.geom_type(),
                index
            )));
        }
        let wkb = write_wkb(geom.geo(), self.config().wkb_byte_order)?;
        if wkb.is_empty() {
            return Err(GeomError::Serialization(format!(
                "empty WKB for {}",
                geom.geom_type()
            )));
        }
        Ok(wkb)
    }

    pub fn from_wkb(&self, bytes: &[u8]) -> Result<Geometry> {
        Ok(Geometry::new(self, read_wkb(bytes)?))
    }
}

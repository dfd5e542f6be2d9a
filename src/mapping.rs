//! Hand-off of finished geometries to the table mapping.
//!
//! A [`TableMapper`] decides from the tags alone which destination tables a
//! feature lands in. This module only builds the geometry those tables need
//! and pairs its WKB with the original tags.

use crate::construction::{line_string_wkb, point_wkb, polygon_wkb, WkbGeometry};
use crate::engine::Engine;
use crate::errors::Result;
use crate::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

pub type Tags = HashMap<String, String>;

/// Matches any value of a key in a [`TagTableMapping`].
pub const ANY_VALUE: &str = "__any__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    Point,
    LineString,
    Polygon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestTable {
    pub name: String,
    pub table_type: TableType,
    #[serde(default)]
    pub sub_mapping: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAssignment {
    pub table: DestTable,
    pub order: usize,
}

pub trait TableMapper {
    /// Tables for a feature with `tags`. `closed` is set for ways whose first
    /// and last node coincide.
    fn assign(&self, tags: &Tags, closed: bool) -> Vec<TableAssignment>;
}

impl<F> TableMapper for F
where
    F: Fn(&Tags, bool) -> Vec<TableAssignment>,
{
    fn assign(&self, tags: &Tags, closed: bool) -> Vec<TableAssignment> {
        self(tags, closed)
    }
}

/// A key/value lookup table, the simplest useful [`TableMapper`].
///
/// Polygon tables only receive closed features.
#[derive(Debug, Clone, Default)]
pub struct TagTableMapping {
    tables: HashMap<String, HashMap<String, Vec<TableAssignment>>>,
}

impl TagTableMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `key=value` to `table`. Use [`ANY_VALUE`] to match every value.
    /// Assignments are ordered by insertion.
    pub fn add(&mut self, key: &str, value: &str, table: DestTable) {
        let order = self.tables.values().flat_map(|vals| vals.values()).map(Vec::len).sum();
        self.tables
            .entry(key.to_owned())
            .or_default()
            .entry(value.to_owned())
            .or_default()
            .push(TableAssignment { table, order });
    }
}

impl TableMapper for TagTableMapping {
    fn assign(&self, tags: &Tags, closed: bool) -> Vec<TableAssignment> {
        let mut assignments: Vec<TableAssignment> = tags
            .iter()
            .filter_map(|(key, value)| self.tables.get(key).map(|vals| (vals, value)))
            .flat_map(|(vals, value)| {
                vals.get(value.as_str())
                    .into_iter()
                    .chain(vals.get(ANY_VALUE))
                    .flatten()
            })
            .filter(|a| closed || a.table.table_type != TableType::Polygon)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.order);
        assignments.dedup_by(|a, b| a.table == b.table);
        assignments
    }
}

/// A serialized geometry with its tags and destination tables.
#[derive(Debug)]
pub struct Feature {
    pub id: i64,
    pub geometry: WkbGeometry,
    pub tags: Tags,
    pub tables: Vec<TableAssignment>,
}

fn tables_of(assignments: &[TableAssignment], table_type: TableType) -> Vec<TableAssignment> {
    assignments
        .iter()
        .filter(|a| a.table.table_type == table_type)
        .cloned()
        .collect()
}

fn is_closed(coords: &[Coordinate]) -> bool {
    coords.len() >= 4 && coords.first() == coords.last()
}

/// The point feature for a node, or `None` when no point table wants it.
pub fn build_node_feature(
    engine: &Engine,
    mapper: &impl TableMapper,
    id: i64,
    tags: Tags,
    coord: Coordinate,
) -> Result<Option<Feature>> {
    let tables = tables_of(&mapper.assign(&tags, false), TableType::Point);
    if tables.is_empty() {
        return Ok(None);
    }
    let geometry = point_wkb(engine, coord.x, coord.y)?;
    Ok(Some(Feature {
        id,
        geometry,
        tags,
        tables,
    }))
}

/// Features for a way: a line string for line tables, and a polygon for
/// polygon tables when the way is closed.
pub fn build_way_features(
    engine: &Engine,
    mapper: &impl TableMapper,
    id: i64,
    tags: Tags,
    coords: &[Coordinate],
) -> Result<Vec<Feature>> {
    let closed = is_closed(coords);
    let assignments = mapper.assign(&tags, closed);
    let mut features = Vec::new();

    let line_tables = tables_of(&assignments, TableType::LineString);
    if !line_tables.is_empty() {
        features.push(Feature {
            id,
            geometry: line_string_wkb(engine, coords)?,
            tags: tags.clone(),
            tables: line_tables,
        });
    }
    let polygon_tables = tables_of(&assignments, TableType::Polygon);
    if closed && !polygon_tables.is_empty() {
        features.push(Feature {
            id,
            geometry: polygon_wkb(engine, coords)?,
            tags,
            tables: polygon_tables,
        });
    }
    Ok(features)
}

/// Features built so far, and a count of those skipped after a
/// recoverable construction failure.
#[derive(Debug, Default)]
pub struct FeatureBatch {
    pub features: Vec<Feature>,
    pub skipped: usize,
}

impl FeatureBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_node(
        &mut self,
        engine: &Engine,
        mapper: &impl TableMapper,
        id: i64,
        tags: Tags,
        coord: Coordinate,
    ) -> Result<()> {
        let built = build_node_feature(engine, mapper, id, tags, coord).map(Option::into_iter);
        self.absorb("node", id, built)
    }

    pub fn push_way(
        &mut self,
        engine: &Engine,
        mapper: &impl TableMapper,
        id: i64,
        tags: Tags,
        coords: &[Coordinate],
    ) -> Result<()> {
        let built = build_way_features(engine, mapper, id, tags, coords);
        self.absorb("way", id, built)
    }

    /// Unrecoverable errors end the batch; others skip the element.
    fn absorb<I>(&mut self, kind: &str, id: i64, built: Result<I>) -> Result<()>
    where
        I: IntoIterator<Item = Feature>,
    {
        match built {
            Ok(features) => {
                self.features.extend(features);
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                warn!(target: "geom_engine", kind, id, error = %e, "skipping element");
                self.skipped += 1;
                Ok(())
            }
            Err(e) => {
                debug!(target: "geom_engine", kind, id, "batch aborted");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GeomError;
    use crate::GeometryType;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn table(name: &str, table_type: TableType) -> DestTable {
        DestTable {
            name: name.to_owned(),
            table_type,
            sub_mapping: None,
        }
    }

    fn mapping() -> TagTableMapping {
        let mut mapping = TagTableMapping::new();
        mapping.add("amenity", "cafe", table("pois", TableType::Point));
        mapping.add("highway", ANY_VALUE, table("roads", TableType::LineString));
        mapping.add("building", ANY_VALUE, table("buildings", TableType::Polygon));
        mapping.add("barrier", "fence", table("barriers", TableType::LineString));
        mapping
    }

    fn coords(raw: &[(f64, f64)]) -> Vec<Coordinate> {
        raw.iter().copied().map(Coordinate::from).collect()
    }

    #[test]
    fn lookup_respects_values_and_closure() {
        let mapping = mapping();
        let cafe = mapping.assign(&tags(&[("amenity", "cafe")]), false);
        assert_eq!(cafe.len(), 1);
        assert_eq!(cafe[0].table.name, "pois");
        assert!(mapping.assign(&tags(&[("amenity", "bank")]), false).is_empty());
        assert!(mapping.assign(&tags(&[("building", "yes")]), false).is_empty());
        let both = mapping.assign(&tags(&[("building", "yes"), ("barrier", "fence")]), true);
        let names: Vec<_> = both.iter().map(|a| a.table.name.as_str()).collect();
        assert_eq!(names, vec!["buildings", "barriers"]);
    }

    #[test]
    fn closures_are_mappers() {
        let engine = Engine::default_engine().unwrap();
        let everything = |_: &Tags, _: bool| {
            vec![TableAssignment {
                table: table("all", TableType::Point),
                order: 0,
            }]
        };
        let feature = build_node_feature(&engine, &everything, 1, Tags::new(), (1., 2.).into())
            .unwrap()
            .unwrap();
        assert_eq!(feature.geometry.geom.geom_type(), GeometryType::Point);
        assert_eq!(feature.geometry.wkb.len(), 21);
    }

    #[test]
    fn closed_way_becomes_line_and_polygon() {
        let engine = Engine::default_engine().unwrap();
        let ring = coords(&[(0., 0.), (1., 0.), (1., 1.), (0., 1.), (0., 0.)]);
        let features = build_way_features(
            &engine,
            &mapping(),
            7,
            tags(&[("building", "yes"), ("highway", "service")]),
            &ring,
        )
        .unwrap();
        let types: Vec<_> = features.iter().map(|f| f.geometry.geom.geom_type()).collect();
        assert_eq!(types, vec![GeometryType::LineString, GeometryType::Polygon]);
        assert_eq!(features[1].tags.get("building").map(String::as_str), Some("yes"));
    }

    #[test]
    fn open_way_is_never_a_polygon() {
        let engine = Engine::default_engine().unwrap();
        let line = coords(&[(0., 0.), (1., 0.), (1., 1.)]);
        let features =
            build_way_features(&engine, &mapping(), 8, tags(&[("building", "yes")]), &line)
                .unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn batch_skips_bad_elements() {
        let engine = Engine::default_engine().unwrap();
        let mapping = mapping();
        let mut batch = FeatureBatch::new();
        let road = tags(&[("highway", "primary")]);
        batch
            .push_way(&engine, &mapping, 1, road.clone(), &coords(&[(0., 0.), (1., 1.)]))
            .unwrap();
        batch
            .push_way(&engine, &mapping, 2, road.clone(), &coords(&[(0., 0.)]))
            .unwrap();
        batch
            .push_node(&engine, &mapping, 3, tags(&[("amenity", "cafe")]), (f64::NAN, 0.).into())
            .unwrap();
        batch
            .push_node(&engine, &mapping, 4, tags(&[("amenity", "cafe")]), (5., 5.).into())
            .unwrap();
        let ids: Vec<_> = batch.features.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(batch.skipped, 2);
    }

    #[test]
    fn unrecoverable_errors_end_the_batch() {
        let mut batch = FeatureBatch::new();
        let result = batch.absorb::<Vec<Feature>>(
            "way",
            1,
            Err(GeomError::IndexCreate("out of memory".to_owned())),
        );
        assert!(result.is_err());
        assert_eq!(batch.skipped, 0);
    }

    #[test]
    fn dest_table_from_json() {
        let parsed: DestTable =
            serde_json::from_str(r#"{"name": "roads", "table_type": "linestring"}"#).unwrap();
        assert_eq!(parsed, table("roads", TableType::LineString));
    }
}

//! Geometry model shared by the canonical document and the map mirrors.
//!
//! The same [`Geometry`] type carries coordinates in either geographic
//! (lon/lat) or projected space; which one is a property of the container
//! holding it, not of the value itself.

use crate::error::CoordinateFormatError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A coordinate pair, `(x, y)`. In geographic space `x` is longitude and
/// `y` is latitude. Serializes as a two element JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord(pub f64, pub f64);

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self(x, y)
    }

    pub fn x(&self) -> f64 {
        self.0
    }

    pub fn y(&self) -> f64 {
        self.1
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite() && self.1.is_finite()
    }

    /// Component-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Coord, tolerance: f64) -> bool {
        (self.0 - other.0).abs() <= tolerance && (self.1 - other.1).abs() <= tolerance
    }
}

/// The geometry kinds the editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiLineString,
    MultiPolygon,
}

impl GeometryKind {
    /// All supported kinds, in chooser order.
    pub const ALL: [GeometryKind; 5] = [
        GeometryKind::Point,
        GeometryKind::LineString,
        GeometryKind::Polygon,
        GeometryKind::MultiLineString,
        GeometryKind::MultiPolygon,
    ];

    /// Array nesting depth of this kind's coordinates above the coordinate
    /// pair (0 for a bare pair).
    pub fn depth(&self) -> usize {
        match self {
            GeometryKind::Point => 0,
            GeometryKind::LineString => 1,
            GeometryKind::Polygon | GeometryKind::MultiLineString => 2,
            GeometryKind::MultiPolygon => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "point" => Ok(GeometryKind::Point),
            "linestring" => Ok(GeometryKind::LineString),
            "polygon" => Ok(GeometryKind::Polygon),
            "multilinestring" => Ok(GeometryKind::MultiLineString),
            "multipolygon" => Ok(GeometryKind::MultiPolygon),
            other => Err(format!("unsupported geometry kind '{}'", other)),
        }
    }
}

/// A geometry value. Serializes as a GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Vec<Coord>>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
        }
    }

    /// Visits every coordinate pair in document order.
    pub fn for_each_coord<F: FnMut(&Coord)>(&self, mut f: F) {
        match self {
            Geometry::Point(c) => f(c),
            Geometry::LineString(line) => line.iter().for_each(f),
            Geometry::Polygon(rings) | Geometry::MultiLineString(rings) => {
                rings.iter().flatten().for_each(f)
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().for_each(f),
        }
    }

    /// Returns a copy with `f` applied to every coordinate pair.
    pub fn map_coords<F: Fn(Coord) -> Coord>(&self, f: F) -> Geometry {
        let line = |l: &Vec<Coord>| l.iter().map(|c| f(*c)).collect::<Vec<_>>();
        match self {
            Geometry::Point(c) => Geometry::Point(f(*c)),
            Geometry::LineString(l) => Geometry::LineString(line(l)),
            Geometry::Polygon(rings) => Geometry::Polygon(rings.iter().map(line).collect()),
            Geometry::MultiLineString(lines) => {
                Geometry::MultiLineString(lines.iter().map(line).collect())
            }
            Geometry::MultiPolygon(polys) => Geometry::MultiPolygon(
                polys
                    .iter()
                    .map(|rings| rings.iter().map(line).collect())
                    .collect(),
            ),
        }
    }

    /// Axis-aligned bounding box, `None` for empty or non-finite geometry.
    pub fn extent(&self) -> Option<Extent> {
        let mut extent: Option<Extent> = None;
        let mut finite = true;
        self.for_each_coord(|c| {
            if !c.is_finite() {
                finite = false;
                return;
            }
            match extent.as_mut() {
                Some(e) => e.expand(c),
                None => extent = Some(Extent::from_coord(c)),
            }
        });
        if finite {
            extent
        } else {
            None
        }
    }

    /// Converts the geometry to its raw coordinate tree.
    pub fn to_tree(&self) -> CoordinateTree {
        let line = |l: &Vec<Coord>| {
            CoordinateTree::Branch(l.iter().map(|c| CoordinateTree::Leaf(*c)).collect())
        };
        let rings = |r: &Vec<Vec<Coord>>| CoordinateTree::Branch(r.iter().map(line).collect());
        match self {
            Geometry::Point(c) => CoordinateTree::Leaf(*c),
            Geometry::LineString(l) => line(l),
            Geometry::Polygon(r) | Geometry::MultiLineString(r) => rings(r),
            Geometry::MultiPolygon(p) => CoordinateTree::Branch(p.iter().map(rings).collect()),
        }
    }

    /// Coordinates as a JSON value (`[[x, y], ...]` nesting per kind).
    pub fn coordinates_json(&self) -> Value {
        self.to_tree().to_json()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: max_x.max(min_x),
            max_y: max_y.max(min_y),
        }
    }

    pub fn from_coord(c: &Coord) -> Self {
        Self::new(c.0, c.1, c.0, c.1)
    }

    pub fn expand(&mut self, c: &Coord) {
        self.min_x = self.min_x.min(c.0);
        self.min_y = self.min_y.min(c.1);
        self.max_x = self.max_x.max(c.0);
        self.max_y = self.max_y.max(c.1);
    }

    pub fn merge(&mut self, other: &Extent) {
        self.expand(&Coord(other.min_x, other.min_y));
        self.expand(&Coord(other.max_x, other.max_y));
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn largest_dimension(&self) -> f64 {
        self.width().max(self.height())
    }

    pub fn center(&self) -> Coord {
        Coord((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// True when the box has collapsed to a single position.
    pub fn is_point(&self) -> bool {
        self.width() == 0.0 && self.height() == 0.0
    }

    pub fn contains(&self, c: &Coord, tolerance: f64) -> bool {
        c.0 >= self.min_x - tolerance
            && c.0 <= self.max_x + tolerance
            && c.1 >= self.min_y - tolerance
            && c.1 <= self.max_y + tolerance
    }
}

/// Raw nested coordinate arrays, independent of any geometry kind.
///
/// The nesting depth is discovered by walking down to the coordinate pairs,
/// so text edited by hand can be checked against the kind it claims to be.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateTree {
    Leaf(Coord),
    Branch(Vec<CoordinateTree>),
}

impl CoordinateTree {
    /// Strict parse: every leaf must be exactly two finite numbers.
    pub fn from_json(value: &Value) -> Result<Self, CoordinateFormatError> {
        parse_node(value, "$", false)
    }

    /// Lenient parse used at ingestion: leaves may carry extra ordinates
    /// (altitude, measure) which are dropped.
    pub fn from_json_lenient(value: &Value) -> Result<Self, CoordinateFormatError> {
        parse_node(value, "$", true)
    }

    /// Parses coordinate text (JSON nested arrays).
    pub fn from_text(text: &str) -> Result<Self, CoordinateFormatError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CoordinateFormatError::InvalidJson {
                reason: e.to_string(),
            })?;
        Self::from_json(&value)
    }

    /// Nesting depth above the coordinate pairs. Fails when siblings
    /// disagree about their depth.
    pub fn depth(&self) -> Result<usize, CoordinateFormatError> {
        match self {
            CoordinateTree::Leaf(_) => Ok(0),
            CoordinateTree::Branch(children) => {
                let mut depth = None;
                for child in children {
                    let d = child.depth()?;
                    match depth {
                        None => depth = Some(d),
                        Some(existing) if existing != d => {
                            return Err(CoordinateFormatError::RaggedNesting {
                                expected: existing,
                                found: d,
                            })
                        }
                        _ => {}
                    }
                }
                Ok(depth.unwrap_or(0) + 1)
            }
        }
    }

    /// Returns a copy with `f` applied to every leaf pair.
    pub fn map_leaves<F: Fn(Coord) -> Coord>(&self, f: &F) -> CoordinateTree {
        match self {
            CoordinateTree::Leaf(c) => CoordinateTree::Leaf(f(*c)),
            CoordinateTree::Branch(children) => {
                CoordinateTree::Branch(children.iter().map(|c| c.map_leaves(f)).collect())
            }
        }
    }

    /// Visits every leaf pair.
    pub fn for_each_leaf<F: FnMut(&Coord)>(&self, f: &mut F) {
        match self {
            CoordinateTree::Leaf(c) => f(c),
            CoordinateTree::Branch(children) => {
                for child in children {
                    child.for_each_leaf(f);
                }
            }
        }
    }

    /// Builds a geometry of `kind`, checking the nesting depth first.
    pub fn into_geometry(self, kind: GeometryKind) -> Result<Geometry, CoordinateFormatError> {
        let found = self.depth()?;
        if found != kind.depth() {
            return Err(CoordinateFormatError::DepthMismatch {
                kind,
                expected: kind.depth(),
                found,
            });
        }
        Ok(match kind {
            GeometryKind::Point => Geometry::Point(self.leaf()?),
            GeometryKind::LineString => Geometry::LineString(self.line()?),
            GeometryKind::Polygon => Geometry::Polygon(self.lines()?),
            GeometryKind::MultiLineString => Geometry::MultiLineString(self.lines()?),
            GeometryKind::MultiPolygon => Geometry::MultiPolygon(
                self.children()?
                    .into_iter()
                    .map(|p| p.lines())
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            CoordinateTree::Leaf(c) => serde_json::json!([c.0, c.1]),
            CoordinateTree::Branch(children) => {
                Value::Array(children.iter().map(|c| c.to_json()).collect())
            }
        }
    }

    fn leaf(self) -> Result<Coord, CoordinateFormatError> {
        match self {
            CoordinateTree::Leaf(c) => Ok(c),
            CoordinateTree::Branch(_) => Err(CoordinateFormatError::UnexpectedBranch),
        }
    }

    fn children(self) -> Result<Vec<CoordinateTree>, CoordinateFormatError> {
        match self {
            CoordinateTree::Branch(children) => Ok(children),
            CoordinateTree::Leaf(_) => Err(CoordinateFormatError::UnexpectedLeaf),
        }
    }

    fn line(self) -> Result<Vec<Coord>, CoordinateFormatError> {
        self.children()?.into_iter().map(|c| c.leaf()).collect()
    }

    fn lines(self) -> Result<Vec<Vec<Coord>>, CoordinateFormatError> {
        self.children()?.into_iter().map(|c| c.line()).collect()
    }
}

fn parse_node(value: &Value, path: &str, lenient: bool) -> Result<CoordinateTree, CoordinateFormatError> {
    let items = value
        .as_array()
        .ok_or_else(|| CoordinateFormatError::NotAnArray {
            path: path.to_string(),
        })?;
    if items.is_empty() {
        return Err(CoordinateFormatError::Empty {
            path: path.to_string(),
        });
    }

    if items[0].is_number() {
        let arity_ok = if lenient { items.len() >= 2 } else { items.len() == 2 };
        if !arity_ok {
            return Err(CoordinateFormatError::BadLeaf {
                path: path.to_string(),
                len: items.len(),
            });
        }
        let mut pair = [0.0_f64; 2];
        for (i, slot) in pair.iter_mut().enumerate() {
            let n = items[i]
                .as_f64()
                .ok_or_else(|| CoordinateFormatError::NotANumber {
                    path: format!("{}[{}]", path, i),
                })?;
            if !n.is_finite() {
                return Err(CoordinateFormatError::NotANumber {
                    path: format!("{}[{}]", path, i),
                });
            }
            *slot = n;
        }
        if items[2..].iter().any(|v| !v.is_number()) {
            return Err(CoordinateFormatError::NotANumber {
                path: format!("{}[2]", path),
            });
        }
        return Ok(CoordinateTree::Leaf(Coord(pair[0], pair[1])));
    }

    let children = items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_node(item, &format!("{}[{}]", path, i), lenient))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CoordinateTree::Branch(children))
}

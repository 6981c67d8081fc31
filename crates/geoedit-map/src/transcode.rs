//! Geometry coordinate transcoding between geographic and projected space.
//!
//! Geographic coordinates are longitude/latitude in degrees. Projected
//! coordinates are spherical (web) mercator metres, the space the map engine
//! renders in.
//!
//! Conversion works on raw coordinate trees as well as typed geometries. The
//! tree form discovers nesting by walking down to coordinate pairs, so text
//! that does not match its claimed kind is still transcoded consistently and
//! the mismatch is reported separately.

use geoedit_core::constants::{EARTH_RADIUS_M, HALF_WORLD_M, MAX_MERCATOR_LATITUDE};
use geoedit_core::{Coord, CoordinateFormatError, CoordinateTree, Geometry, GeometryKind};
use serde_json::Value;
use std::f64::consts::FRAC_PI_4;

/// Conversion direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// lon/lat degrees to mercator metres
    ToProjected,
    /// mercator metres to lon/lat degrees
    ToGeographic,
}

impl Direction {
    pub fn apply(self, c: Coord) -> Coord {
        match self {
            Direction::ToProjected => to_projected(c),
            Direction::ToGeographic => to_geographic(c),
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            Direction::ToProjected => Direction::ToGeographic,
            Direction::ToGeographic => Direction::ToProjected,
        }
    }
}

/// Projects a lon/lat pair to mercator metres.
///
/// Latitudes beyond the mercator limit are clamped to it.
pub fn to_projected(c: Coord) -> Coord {
    let lat = c.y().clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    let x = EARTH_RADIUS_M * c.x().to_radians();
    let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    Coord(x, y.clamp(-HALF_WORLD_M, HALF_WORLD_M))
}

/// Unprojects mercator metres to a lon/lat pair.
pub fn to_geographic(c: Coord) -> Coord {
    let lon = (c.x() / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (c.y() / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    Coord(lon, lat)
}

/// Transcodes every leaf pair of a coordinate tree.
pub fn transcode_tree(tree: &CoordinateTree, direction: Direction) -> CoordinateTree {
    tree.map_leaves(&|c| direction.apply(c))
}

/// Transcodes raw nested coordinate arrays.
///
/// Malformed nesting (a leaf that is not two finite numbers, an empty
/// array) is reported without producing any output.
pub fn transcode_json(value: &Value, direction: Direction) -> Result<Value, CoordinateFormatError> {
    let tree = CoordinateTree::from_json(value)?;
    Ok(transcode_tree(&tree, direction).to_json())
}

/// Transcodes a typed geometry.
pub fn transcode(geometry: &Geometry, direction: Direction) -> Geometry {
    geometry.map_coords(|c| direction.apply(c))
}

/// Checks that every pair of a geographic geometry is a valid lon/lat.
pub fn validate_geographic(geometry: &Geometry) -> Result<(), CoordinateFormatError> {
    let mut bad = None;
    geometry.for_each_coord(|c| {
        if bad.is_none() && !is_valid_lon_lat(c) {
            bad = Some(*c);
        }
    });
    match bad {
        Some(c) => Err(CoordinateFormatError::OutOfRange {
            lon: c.x(),
            lat: c.y(),
        }),
        None => Ok(()),
    }
}

pub fn is_valid_lon_lat(c: &Coord) -> bool {
    c.is_finite() && c.x().abs() <= 180.0 && c.y().abs() <= 90.0
}

/// Parses hand-edited geographic coordinate text into a geometry of `kind`.
pub fn geometry_from_text(kind: GeometryKind, text: &str) -> Result<Geometry, CoordinateFormatError> {
    let geometry = CoordinateTree::from_text(text)?.into_geometry(kind)?;
    validate_geographic(&geometry)?;
    Ok(geometry)
}

/// Renders a geometry's coordinates as pretty JSON text.
pub fn geometry_to_text(geometry: &Geometry) -> String {
    format!("{:#}", geometry.coordinates_json())
}

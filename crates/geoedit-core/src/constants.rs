//! Shared numeric constants.

/// WGS84 semi-major axis used by spherical (web) mercator, in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Half the width of the projected world, in metres.
pub const HALF_WORLD_M: f64 = std::f64::consts::PI * EARTH_RADIUS_M;

/// Latitude at which spherical mercator reaches `HALF_WORLD_M`.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Map resolution at zoom 0 for 256 px tiles, in metres per pixel.
pub const ZOOM0_RESOLUTION: f64 = 2.0 * HALF_WORLD_M / 256.0;

/// Tolerance used when comparing geographic coordinates.
pub const COORD_EPSILON: f64 = 1e-9;

/// Default view center (lon, lat) shown when the document is empty.
pub const DEFAULT_CENTER_LON_LAT: (f64, f64) = (47.5769, 40.1431);

/// Default zoom shown when the document is empty.
pub const DEFAULT_ZOOM: f64 = 7.0;

/// Deepest zoom level the camera may reach.
pub const MAX_ZOOM: f64 = 28.0;

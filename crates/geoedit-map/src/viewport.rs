//! Map viewport and pixel/projected coordinate conversion.
//!
//! Handles conversion between pixel coordinates (screen space) and projected
//! coordinates (mercator metres). The view is described by a projected center
//! and a zoom level; resolution halves with every zoom step.

use geoedit_core::constants::{MAX_ZOOM, ZOOM0_RESOLUTION};
use geoedit_core::{Coord, Extent};
use std::fmt;

/// Represents the map view (center, zoom and surface size).
#[derive(Debug, Clone, PartialEq)]
pub struct MapViewport {
    center: Coord,
    zoom: f64,
    width: f64,
    height: f64,
}

impl MapViewport {
    /// Creates a viewport for a surface of the given pixel size, centered on
    /// the projected origin at zoom 0.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            center: Coord(0.0, 0.0),
            zoom: 0.0,
            width,
            height,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Sets the surface dimensions (typically called when the window resizes).
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// A surface with zero area cannot be drawn on or fitted to.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Coord {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Sets the zoom level, clamped to `[0, MAX_ZOOM]`.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(0.0, MAX_ZOOM);
        }
    }

    /// Metres per pixel at the current zoom.
    pub fn resolution(&self) -> f64 {
        resolution_for_zoom(self.zoom)
    }

    /// Centers the view on a projected coordinate.
    pub fn center_on(&mut self, center: Coord) {
        if center.is_finite() {
            self.center = center;
        }
    }

    /// Converts pixel coordinates to projected coordinates.
    ///
    /// Pixel coordinates have (0,0) at the top-left with +Y going down;
    /// projected +Y goes north.
    ///
    /// ```text
    /// x = center_x + (pixel_x - width / 2) * resolution
    /// y = center_y - (pixel_y - height / 2) * resolution
    /// ```
    pub fn pixel_to_projected(&self, pixel_x: f64, pixel_y: f64) -> Coord {
        let res = self.resolution();
        Coord(
            self.center.x() + (pixel_x - self.width / 2.0) * res,
            self.center.y() - (pixel_y - self.height / 2.0) * res,
        )
    }

    /// Converts projected coordinates to pixel coordinates.
    pub fn projected_to_pixel(&self, c: Coord) -> (f64, f64) {
        let res = self.resolution();
        (
            (c.x() - self.center.x()) / res + self.width / 2.0,
            self.height / 2.0 - (c.y() - self.center.y()) / res,
        )
    }

    /// Fits a projected extent into the view.
    ///
    /// `padding` is reserved on every edge, in pixels. The resulting zoom never
    /// exceeds `max_zoom`; a degenerate extent is shown at `max_zoom`.
    pub fn fit_extent(&mut self, extent: &Extent, padding: f64, max_zoom: f64) {
        if !self.has_area() {
            return;
        }
        let available_w = (self.width - 2.0 * padding).max(1.0);
        let available_h = (self.height - 2.0 * padding).max(1.0);
        let resolution = (extent.width() / available_w).max(extent.height() / available_h);

        let zoom = if resolution > 0.0 {
            zoom_for_resolution(resolution).min(max_zoom)
        } else {
            max_zoom
        };
        self.set_zoom(zoom);
        self.center_on(extent.center());
    }

    /// The projected extent currently visible.
    pub fn visible_extent(&self) -> Extent {
        let top_left = self.pixel_to_projected(0.0, 0.0);
        let bottom_right = self.pixel_to_projected(self.width, self.height);
        Extent::new(top_left.x(), bottom_right.y(), bottom_right.x(), top_left.y())
    }
}

/// Metres per pixel at a zoom level.
pub fn resolution_for_zoom(zoom: f64) -> f64 {
    ZOOM0_RESOLUTION / 2f64.powf(zoom)
}

/// Zoom level at which one pixel covers `resolution` metres.
pub fn zoom_for_resolution(resolution: f64) -> f64 {
    (ZOOM0_RESOLUTION / resolution).log2()
}

impl fmt::Display for MapViewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zoom: {:.2} | Center: ({:.1}, {:.1}) | {}x{}",
            self.zoom,
            self.center.x(),
            self.center.y(),
            self.width,
            self.height
        )
    }
}

impl Default for MapViewport {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}

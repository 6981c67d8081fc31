//! Data model of the editing core.
//!
//! - [`CanonicalDocument`] / [`CanonicalFeature`]: the authoritative feature
//!   collection, always in geographic coordinates
//! - [`Geometry`] and [`CoordinateTree`]: typed and raw coordinate forms
//! - [`FeatureId`] / [`PropertyValue`]: ids and scalar attribute values
//! - [`InteractionMode`]: the active user interaction

pub mod feature;
pub mod geometry;
pub mod mode;
pub mod property;

pub use feature::{CanonicalDocument, CanonicalFeature};
pub use geometry::{Coord, CoordinateTree, Extent, Geometry, GeometryKind};
pub use mode::{EditField, InteractionMode};
pub use property::{
    FeatureId, Properties, PropertyValue, GEOMETRY_TYPE_PROPERTY, ID_PROPERTY,
};

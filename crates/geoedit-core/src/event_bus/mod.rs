//! # Event Bus Module
//!
//! Publish/subscribe channel between the editing core and its surfaces
//! (map view, table view, status line).
//!
//! - The document store publishes [`DocumentEvent`]s after every mutation
//! - The session publishes selection, mode, ingestion and rejection events
//! - Surfaces subscribe by category and never hold mutable access to state
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geoedit_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(EventFilter::only(EventCategory::Selection), |event| {
//!     if let AppEvent::Selection(change) = event {
//!         println!("{}", change.description());
//!     }
//! });
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;

//! Editor session.
//!
//! `EditorSession` owns the document store, the selection, the interaction
//! mode and the map bridge, and is the only surface the UI and table layers
//! talk to. Every document mutation is followed, synchronously and before
//! the call returns, by a bridge sync and the selection/camera follow-up.

mod editing;
mod file_io;
mod gestures;

pub use file_io::{IngestOutcome, IngestTicket};
pub use gestures::ClickOutcome;

use crate::bridge::{MapBridge, MapEngine, StyleSheet};
use crate::document_store::DocumentStore;
use crate::import::Importer;
use crate::interaction::ModeMachine;
use crate::selection_manager::SelectionManager;
use crate::transcode::geometry_to_text;
use geoedit_core::{
    AppEvent, CanonicalDocument, DocumentChange, DocumentEvent, Error, ErrorEvent, EventBus,
    EventCategory, EventFilter, Extent, FeatureId, GeometryKind, InteractionMode, ModeEvent,
    SelectionEvent, SubscriptionId,
};
use geoedit_settings::Config;
use serde::Serialize;
use std::sync::Arc;

/// Overview of the current document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub features: usize,
    pub revision: u64,
    pub geometry_kinds: Vec<GeometryKind>,
    /// Geographic bounding box, if any feature has a geometry.
    pub extent: Option<Extent>,
}

pub struct EditorSession<E: MapEngine> {
    config: Config,
    bus: Arc<EventBus>,
    store: DocumentStore,
    bridge: MapBridge<E>,
    selection: SelectionManager,
    modes: ModeMachine,
    importer: Importer,
    /// Last ingestion ticket handed out.
    ingest_issued: u64,
    /// Ticket of the ingestion currently shown, 0 if none.
    ingest_applied: u64,
}

impl<E: MapEngine> EditorSession<E> {
    pub fn new(engine: E, config: Config) -> Self {
        Self::with_bus(engine, config, Arc::new(EventBus::new()))
    }

    /// Creates a session publishing on an existing bus.
    pub fn with_bus(engine: E, config: Config, bus: Arc<EventBus>) -> Self {
        let bridge = MapBridge::new(engine, StyleSheet::from_settings(&config.style));
        let importer = Importer::new(config.import.clone());
        let mut session = Self {
            store: DocumentStore::new(Arc::clone(&bus)),
            bridge,
            selection: SelectionManager::new(),
            modes: ModeMachine::new(),
            importer,
            ingest_issued: 0,
            ingest_applied: 0,
            config,
            bus,
        };
        session.bridge.fit_document(&session.config.viewport);
        session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The current document value.
    pub fn document(&self) -> Arc<CanonicalDocument> {
        self.store.document()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn mode(&self) -> &InteractionMode {
        self.modes.mode()
    }

    pub fn selected(&self) -> Option<&FeatureId> {
        self.selection.selected()
    }

    pub fn bridge(&self) -> &MapBridge<E> {
        &self.bridge
    }

    pub fn engine(&self) -> &E {
        self.bridge.engine()
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.bridge.engine_mut()
    }

    /// Replaces the importer, e.g. to register an archive decoder.
    pub fn set_importer(&mut self, importer: Importer) {
        self.importer = importer;
    }

    /// Calls `listener` with every new document value.
    pub fn on_document_change<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CanonicalDocument) + Send + Sync + 'static,
    {
        self.bus
            .subscribe(EventFilter::only(EventCategory::Document), move |event| {
                if let AppEvent::Document(DocumentEvent::Changed { document, .. }) = event {
                    listener(document);
                }
            })
    }

    /// Calls `listener` with the selected id after every selection change.
    pub fn on_selection_change<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(Option<&FeatureId>) + Send + Sync + 'static,
    {
        self.bus
            .subscribe(EventFilter::only(EventCategory::Selection), move |event| {
                if let AppEvent::Selection(SelectionEvent::Changed { selected, .. }) = event {
                    listener(selected.as_ref());
                }
            })
    }

    /// Calls `listener` with the new mode after every transition.
    pub fn on_mode_change<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&InteractionMode) + Send + Sync + 'static,
    {
        self.bus
            .subscribe(EventFilter::only(EventCategory::Mode), move |event| {
                if let AppEvent::Mode(ModeEvent::Changed { to, .. }) = event {
                    listener(to);
                }
            })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Selects a feature (or clears the selection with `None`) and fits the
    /// camera to it. Unknown ids clear the selection.
    ///
    /// Returns the resulting selection.
    pub fn select(&mut self, id: Option<FeatureId>) -> Option<FeatureId> {
        let document = self.store.document();
        let event = self.selection.select(id, &document);
        self.bridge.restyle(self.selection.selected());
        if let Some(event) = event {
            self.publish(AppEvent::Selection(event));
        }
        let selected = self.selection.selected().cloned();
        if let Some(id) = &selected {
            self.bridge.fit_feature(id, &self.config.viewport);
        }
        selected
    }

    /// Empties the document. Any interaction in progress is cancelled and
    /// the selection cleared.
    pub fn clear(&mut self) {
        self.store.clear();
        self.after_document_change(DocumentChange::Cleared);
    }

    /// Pretty JSON coordinates of a feature, for the coordinate editor.
    pub fn geometry_text(&self, id: &FeatureId) -> Option<String> {
        self.store
            .get(id)
            .and_then(|f| f.geometry.as_ref())
            .map(geometry_to_text)
    }

    /// Distinct geometry kinds in the document.
    pub fn geometry_kinds(&self) -> Vec<GeometryKind> {
        self.store.document().geometry_kinds()
    }

    pub fn summary(&self) -> DocumentSummary {
        let document = self.store.document();
        DocumentSummary {
            features: document.len(),
            revision: self.store.revision(),
            geometry_kinds: document.geometry_kinds(),
            extent: document.extent(),
        }
    }

    /// Flushes work queued while the map surface was not ready.
    pub fn on_engine_ready(&mut self) -> bool {
        self.bridge.on_ready()
    }

    fn after_document_change(&mut self, change: DocumentChange) {
        let document = self.store.document();
        let report = self.bridge.sync(&document, self.store.revision());

        if !matches!(change, DocumentChange::Cleared | DocumentChange::PropertyUpdated { .. })
            && self.moving_target_lost(&document)
        {
            self.leave_mode();
        }

        match &change {
            DocumentChange::Cleared => {
                self.leave_mode();
                if let Some(event) = self.selection.clear() {
                    self.publish(AppEvent::Selection(event));
                }
                self.bridge.restyle(None);
                self.bridge.fit_document(&self.config.viewport);
            }
            DocumentChange::Replaced => {
                let stale_target = self
                    .modes
                    .mode()
                    .target()
                    .is_some_and(|id| !document.contains(id));
                if stale_target || report.interrupted_gesture.is_some() {
                    self.leave_mode();
                }
                if let Some(event) = self.selection.reconcile(&document) {
                    self.publish(AppEvent::Selection(event));
                }
                self.bridge.restyle(self.selection.selected());
                self.bridge.fit_document(&self.config.viewport);
            }
            DocumentChange::GeometryUpdated { id } | DocumentChange::FeatureUpserted { id } => {
                if report.updated.contains(id) && self.selection.is_selected(id) {
                    self.bridge.fit_feature(id, &self.config.viewport);
                }
            }
            DocumentChange::PropertyUpdated { .. } => {}
        }
    }

    /// True when `Moving` points at a feature that is gone or no longer a
    /// Point.
    fn moving_target_lost(&self, document: &CanonicalDocument) -> bool {
        match self.modes.mode() {
            InteractionMode::Moving { id } => {
                document.get(id).and_then(|f| f.geometry_kind()) != Some(GeometryKind::Point)
            }
            _ => false,
        }
    }

    /// Detaches any gesture listener and returns to `Idle`.
    fn leave_mode(&mut self) {
        self.bridge.stop_gesture();
        let event = self.modes.reset();
        self.publish_mode(event);
    }

    fn publish(&self, event: AppEvent) {
        self.bus.publish(event);
    }

    fn publish_mode(&self, event: Option<ModeEvent>) {
        if let Some(event) = event {
            self.publish(AppEvent::Mode(event));
        }
    }

    /// Reports a rejected user operation and hands the error back.
    fn reject(&self, operation: &str, err: impl Into<Error>) -> Error {
        let err = err.into();
        tracing::warn!("{} rejected: {}", operation, err);
        self.publish(AppEvent::Error(ErrorEvent::Rejected {
            operation: operation.to_string(),
            message: err.to_string(),
        }));
        err
    }
}

impl<E: MapEngine> std::fmt::Debug for EditorSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("store", &self.store)
            .field("mode", self.modes.mode())
            .field("selected", &self.selection.selected())
            .field("ingest_applied", &self.ingest_applied)
            .finish()
    }
}

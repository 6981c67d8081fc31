//! Ingestion sequencing, file import and GeoJSON export.

use super::EditorSession;
use crate::bridge::MapEngine;
use crate::import::ImportFormat;
use crate::ingest::{normalize, IngestInput};
use chrono::Utc;
use geoedit_core::{AppEvent, DocumentChange, Error, IngestEvent, Result};
use serde::Serialize;
use std::path::Path;

/// Sequence ticket of one ingestion, issued before decoding starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngestTicket(u64);

impl IngestTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// What happened to an ingestion result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// The result replaced the document.
    Applied { features: usize, dropped: usize },
    /// A newer ingestion had already been applied; the result was ignored.
    Discarded { current: u64 },
}

impl<E: MapEngine> EditorSession<E> {
    /// Issues the next ingestion ticket.
    pub fn begin_ingest(&mut self) -> IngestTicket {
        self.ingest_issued += 1;
        IngestTicket(self.ingest_issued)
    }

    /// Normalizes `input` and replaces the document with the result in one
    /// step, unless an ingestion with a later ticket has already been
    /// applied. On failure the document is left unchanged.
    pub fn apply_ingest(&mut self, ticket: IngestTicket, input: IngestInput) -> Result<IngestOutcome> {
        if ticket.0 <= self.ingest_applied {
            tracing::warn!(
                "Discarding ingestion #{} (already showing #{})",
                ticket.0,
                self.ingest_applied
            );
            self.publish(AppEvent::Ingest(IngestEvent::Discarded {
                sequence: ticket.0,
                current: self.ingest_applied,
            }));
            return Ok(IngestOutcome::Discarded {
                current: self.ingest_applied,
            });
        }

        let report = match normalize(input) {
            Ok(report) => report,
            Err(err) => return Err(self.fail_ingest(ticket, err.into())),
        };
        let features = report.document.len();
        let dropped = report.dropped_count();
        if let Err(err) = self.store.replace(report.document) {
            return Err(self.fail_ingest(ticket, err.into()));
        }
        self.ingest_applied = ticket.0;
        self.after_document_change(DocumentChange::Replaced);

        tracing::info!(
            "Ingestion #{} applied: {} features, {} dropped",
            ticket.0,
            features,
            dropped
        );
        self.publish(AppEvent::Ingest(IngestEvent::Applied {
            sequence: ticket.0,
            features,
            dropped,
            at: Utc::now(),
        }));
        Ok(IngestOutcome::Applied { features, dropped })
    }

    /// Reports a failed ingestion and hands the error back.
    pub fn fail_ingest(&self, ticket: IngestTicket, err: Error) -> Error {
        tracing::warn!("Ingestion #{} failed: {}", ticket.0, err);
        self.publish(AppEvent::Ingest(IngestEvent::Failed {
            sequence: ticket.0,
            message: err.to_string(),
        }));
        err
    }

    /// Ingests already-decoded input immediately.
    pub fn ingest(&mut self, input: IngestInput) -> Result<IngestOutcome> {
        let ticket = self.begin_ingest();
        self.apply_ingest(ticket, input)
    }

    /// Decodes in-memory file contents of a known format and ingests them.
    pub fn import_bytes(&mut self, format: ImportFormat, bytes: &[u8]) -> Result<IngestOutcome> {
        let ticket = self.begin_ingest();
        match self.importer.decode(format, bytes) {
            Ok(input) => self.apply_ingest(ticket, input),
            Err(err) => Err(self.fail_ingest(ticket, err.into())),
        }
    }

    /// Reads, decodes and ingests a file, picking the format by extension.
    pub async fn import_file(&mut self, path: impl AsRef<Path>) -> Result<IngestOutcome> {
        let ticket = self.begin_ingest();
        match self.importer.read_file(path.as_ref()).await {
            Ok(input) => self.apply_ingest(ticket, input),
            Err(err) => Err(self.fail_ingest(ticket, err)),
        }
    }

    /// The document as standalone GeoJSON text.
    pub fn export_document(&self) -> Result<String> {
        Ok(self.store.document().to_geojson_string()?)
    }

    /// Writes the exported document to `path`, creating parent directories.
    pub async fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.export_document()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, text).await?;
        tracing::info!("Exported {} features to {}", self.store.len(), path.display());
        Ok(())
    }
}

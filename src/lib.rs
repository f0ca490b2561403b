//! Search and persistence core for a transcription workspace over
//! digitized early-modern texts.
//!
//! A workspace pairs scanned page images with editable transcriptions,
//! tagging, comments and linked metadata. This crate is the layer between
//! that UI and its backing services: it builds filter/facet queries against
//! a search index (the system of record for the UI), reconciles
//! relevance-ranked search with distinct-by-work grouping, keeps the
//! derived work-level status consistent with page statuses, and talks to
//! the file server that holds durable text and version backups.

pub mod authority;
pub mod collate;
pub mod config;
pub mod error;
pub mod fileserver;
pub mod index;
pub mod model;
pub mod service;
pub mod workspace;

pub use config::Config;
pub use error::{Error, Result};
pub use workspace::Workspace;

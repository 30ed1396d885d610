//! Output formats for radio projects.
//!
//! This crate turns a [`radio_model::Project`] into the files the game reads,
//! reads RadioData documents back into a project, and persists projects
//! between sessions.
//!
//! # Features
//!
//! - **RadioData XML** export and import, joined to the model by line guid
//! - **Recorded media** script plus translation file, joined by key
//! - **Round-trip verification** of the RadioData export
//! - **Atomic writes** for every file this crate produces
//!
//! # RadioData layout
//!
//! ```text
//! <RadioData>
//!   <ChannelEntry ID name freq>
//!     <BroadcastEntry ID timestamp endstamp day>
//!       <LineEntry ID [r g b]>text</LineEntry>
//!     </BroadcastEntry>
//!   </ChannelEntry>
//! </RadioData>
//! ```
//!
//! # Architecture
//!
//! - `document` - In-memory RadioData tree
//! - `radio_xml` - Tree to XML and back (quick-xml)
//! - `export` / `import` - Project to tree and tree to project
//! - `recorded_media` - Script and translation rendering
//! - `project_file` - JSON project files
//! - `verify` - Export, re-parse and compare
//! - `error.rs` - Error types

pub mod common;
pub mod document;
mod error;
pub mod export;
pub mod import;
pub mod project_file;
pub mod radio_xml;
pub mod recorded_media;
pub mod verify;

pub use document::{BroadcastNode, ChannelNode, LineNode, RadioDocument};
pub use error::{CodecError, Result};
pub use export::{
    ExportIssue, ExportReport, build_document, export_radio_data, export_radio_data_string,
};
pub use import::{
    ImportIssue, ImportReport, import_document, import_new_project, import_radio_data,
};
pub use project_file::{CURRENT_SCHEMA_VERSION, ProjectFile, load_project, save_project};
pub use radio_xml::{decode_document, parse_document, write_document};
pub use recorded_media::{
    RecordedMediaExport, export_recorded_media, parse_translation, write_recorded_media,
};
pub use verify::{VerifyIssue, VerifyReport, verify_document, verify_round_trip};

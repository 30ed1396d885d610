//! Domain model for radio projects.
//!
//! A [`Project`] owns voices, broadcasts (with their lines), channels (with
//! their schedules), recorded media entries, CDs and VHS tapes. Entities refer
//! to each other by typed id; lines carry a [`Guid`] that joins them to the
//! exported documents.

pub mod color;
pub mod context;
pub mod domain;
pub mod error;
pub mod ids;
pub mod project;

pub use color::{Rgb, decode_hex_color, encode_hex_color};
pub use context::{AppContext, ContextConfig, Selection};
pub use domain::{
    Broadcast, Cd, Channel, ChannelScheduleEntry, Line, MediaCategory, RecordedMediaEntry,
    RecordedMediaLine, VhsTape, Voice,
};
pub use error::{EntityKind, ModelError, Result};
pub use ids::{BroadcastId, CdId, ChannelId, Guid, MediaId, VhsId, VoiceId, new_guid};
pub use project::Project;

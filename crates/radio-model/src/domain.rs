//! Entity types owned by a [`crate::Project`].
//!
//! Identity fields and cross-collection references are private so that they
//! can only change through the project, which keeps references resolvable.

use serde::{Deserialize, Serialize};

use crate::color::{Rgb, decode_hex_color};
use crate::error::ModelError;
use crate::ids::{BroadcastId, CdId, ChannelId, Guid, MediaId, VhsId, VoiceId, new_guid};

/// A speaking voice. Lines refer to it by id to pick up its color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    id: VoiceId,
    pub name: String,
    /// `RRGGBB` with optional `#`. `None` means uncolored.
    pub color: Option<String>,
}

impl Voice {
    pub fn new(id: VoiceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: None,
        }
    }

    /// Set the color; an empty or blank string clears it.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.set_color(color);
        self
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        let color = color.into();
        self.color = if color.trim().is_empty() {
            None
        } else {
            Some(color)
        };
    }

    pub fn id(&self) -> &VoiceId {
        &self.id
    }

    /// Decoded color. `Ok(None)` when uncolored, `Err` when malformed.
    pub fn rgb(&self) -> Result<Option<Rgb>, ModelError> {
        self.color.as_deref().map(decode_hex_color).transpose()
    }
}

/// One scripted line of a broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    guid: Guid,
    pub text: String,
    /// `None` is a narration-less line. Set through [`crate::Project::set_line_voice`].
    pub(crate) voice_id: Option<VoiceId>,
}

impl Line {
    /// Create a line with a freshly minted guid.
    pub fn new(text: impl Into<String>, voice_id: Option<VoiceId>) -> Self {
        Self::with_guid(new_guid(), text, voice_id)
    }

    /// Create a line with a known guid (importer path).
    pub fn with_guid(guid: Guid, text: impl Into<String>, voice_id: Option<VoiceId>) -> Self {
        Self {
            guid,
            text: text.into(),
            voice_id,
        }
    }

    pub fn guid(&self) -> &Guid {
        &self.guid
    }

    pub fn voice_id(&self) -> Option<&VoiceId> {
        self.voice_id.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    id: BroadcastId,
    pub title: String,
    lines: Vec<Line>,
}

impl Broadcast {
    pub fn new(id: BroadcastId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn id(&self) -> &BroadcastId {
        &self.id
    }

    /// Lines in playback order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, guid: &Guid) -> Option<&Line> {
        self.lines.iter().find(|line| &line.guid == guid)
    }

    pub fn line_mut(&mut self, guid: &Guid) -> Option<&mut Line> {
        self.lines.iter_mut().find(|line| &line.guid == guid)
    }

    /// Move the line at `from` to position `to`. Returns false when out of range.
    pub fn move_line(&mut self, from: usize, to: usize) -> bool {
        if from >= self.lines.len() || to >= self.lines.len() {
            return false;
        }
        let line = self.lines.remove(from);
        self.lines.insert(to, line);
        true
    }

    pub fn remove_line(&mut self, guid: &Guid) -> Option<Line> {
        let index = self.lines.iter().position(|line| &line.guid == guid)?;
        Some(self.lines.remove(index))
    }

    pub(crate) fn push_line(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub(crate) fn lines_mut(&mut self) -> &mut [Line] {
        &mut self.lines
    }
}

/// A scheduled airing of a broadcast on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelScheduleEntry {
    broadcast_id: BroadcastId,
    pub day: i32,
    /// Seconds into the day.
    pub start: f64,
    pub end: f64,
}

impl ChannelScheduleEntry {
    pub fn new(broadcast_id: BroadcastId, day: i32, start: f64, end: f64) -> Self {
        Self {
            broadcast_id,
            day,
            start,
            end,
        }
    }

    pub fn broadcast_id(&self) -> &BroadcastId {
        &self.broadcast_id
    }

    /// Start truncated toward zero, as persisted in documents.
    pub fn timestamp(&self) -> i64 {
        truncate_seconds(self.start)
    }

    /// End truncated toward zero, as persisted in documents.
    pub fn endstamp(&self) -> i64 {
        truncate_seconds(self.end)
    }
}

fn truncate_seconds(value: f64) -> i64 {
    if value.is_finite() {
        value.trunc() as i64
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    id: ChannelId,
    pub name: String,
    pub frequency: f64,
    schedule: Vec<ChannelScheduleEntry>,
}

impl Channel {
    pub fn new(id: ChannelId, name: impl Into<String>, frequency: f64) -> Self {
        Self {
            id,
            name: name.into(),
            frequency,
            schedule: Vec::new(),
        }
    }

    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    pub fn schedule(&self) -> &[ChannelScheduleEntry] {
        &self.schedule
    }

    pub(crate) fn schedule_mut(&mut self) -> &mut Vec<ChannelScheduleEntry> {
        &mut self.schedule
    }
}

/// Category of a recorded media item as understood by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaCategory {
    Cd,
    Vhs,
    HomeVhs,
    Retail,
    Other(String),
}

impl MediaCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cd => "CDs",
            Self::Vhs => "Retail-VHS",
            Self::HomeVhs => "Home-VHS",
            Self::Retail => "Retail",
            Self::Other(name) => name,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "CDs" | "CD" => Self::Cd,
            "Retail-VHS" | "VHS" => Self::Vhs,
            "Home-VHS" => Self::HomeVhs,
            "Retail" => Self::Retail,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedMediaLine {
    guid: Guid,
    pub text: String,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    /// Engine effect codes, e.g. `BOR-1`.
    pub codes: Option<String>,
}

impl RecordedMediaLine {
    /// White line with a fresh guid.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            guid: new_guid(),
            text: text.into(),
            r: 1.0,
            g: 1.0,
            b: 1.0,
            codes: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, rgb: Rgb) -> Self {
        let (r, g, b) = rgb.to_unit();
        self.r = r;
        self.g = g;
        self.b = b;
        self
    }

    #[must_use]
    pub fn with_codes(mut self, codes: impl Into<String>) -> Self {
        let codes = codes.into();
        self.codes = if codes.trim().is_empty() {
            None
        } else {
            Some(codes)
        };
        self
    }

    pub fn guid(&self) -> &Guid {
        &self.guid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedMediaEntry {
    id: MediaId,
    pub title: String,
    pub author: String,
    pub category: MediaCategory,
    /// Relative spawn weight.
    pub spawn: i32,
    pub extra: String,
    lines: Vec<RecordedMediaLine>,
}

impl RecordedMediaEntry {
    pub fn new(id: MediaId, title: impl Into<String>, category: MediaCategory) -> Self {
        Self {
            id,
            title: title.into(),
            author: String::new(),
            category,
            spawn: 0,
            extra: String::new(),
            lines: Vec::new(),
        }
    }

    pub fn id(&self) -> &MediaId {
        &self.id
    }

    pub fn lines(&self) -> &[RecordedMediaLine] {
        &self.lines
    }

    pub fn line_mut(&mut self, guid: &Guid) -> Option<&mut RecordedMediaLine> {
        self.lines.iter_mut().find(|line| &line.guid == guid)
    }

    pub fn remove_line(&mut self, guid: &Guid) -> Option<RecordedMediaLine> {
        let index = self.lines.iter().position(|line| &line.guid == guid)?;
        Some(self.lines.remove(index))
    }

    pub(crate) fn push_line(&mut self, line: RecordedMediaLine) {
        self.lines.push(line);
    }
}

/// A compilation CD whose tracks are broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cd {
    id: CdId,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub notes: Option<String>,
    track_ids: Vec<BroadcastId>,
}

impl Cd {
    pub fn new(id: CdId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            artist: String::new(),
            year: None,
            notes: None,
            track_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tracks(mut self, track_ids: Vec<BroadcastId>) -> Self {
        self.track_ids = track_ids;
        self
    }

    pub fn id(&self) -> &CdId {
        &self.id
    }

    pub fn track_ids(&self) -> &[BroadcastId] {
        &self.track_ids
    }

    pub(crate) fn track_ids_mut(&mut self) -> &mut Vec<BroadcastId> {
        &mut self.track_ids
    }
}

/// A VHS tape whose segments are broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VhsTape {
    id: VhsId,
    pub title: String,
    pub studio: String,
    pub year: Option<i32>,
    pub notes: Option<String>,
    broadcast_ids: Vec<BroadcastId>,
}

impl VhsTape {
    pub fn new(id: VhsId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            studio: String::new(),
            year: None,
            notes: None,
            broadcast_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_broadcasts(mut self, broadcast_ids: Vec<BroadcastId>) -> Self {
        self.broadcast_ids = broadcast_ids;
        self
    }

    pub fn id(&self) -> &VhsId {
        &self.id
    }

    pub fn broadcast_ids(&self) -> &[BroadcastId] {
        &self.broadcast_ids
    }

    pub(crate) fn broadcast_ids_mut(&mut self) -> &mut Vec<BroadcastId> {
        &mut self.broadcast_ids
    }
}

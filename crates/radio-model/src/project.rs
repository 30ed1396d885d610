//! The `Project` aggregate root.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::Rgb;
use crate::domain::{
    Broadcast, Cd, Channel, ChannelScheduleEntry, Line, RecordedMediaEntry, RecordedMediaLine,
    VhsTape, Voice,
};
use crate::error::{EntityKind, ModelError, Result};
use crate::ids::{BroadcastId, CdId, ChannelId, Guid, MediaId, VhsId, VoiceId};

/// All entities of one radio project.
///
/// Collections keep insertion order, which is the export order. Entities refer
/// to each other by id only; every mutation entry point checks that the ids it
/// stores resolve, and every removal strips the dangling references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    voices: Vec<Voice>,
    broadcasts: Vec<Broadcast>,
    channels: Vec<Channel>,
    recorded_media: Vec<RecordedMediaEntry>,
    cds: Vec<Cd>,
    vhs_tapes: Vec<VhsTape>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
            && self.broadcasts.is_empty()
            && self.channels.is_empty()
            && self.recorded_media.is_empty()
            && self.cds.is_empty()
            && self.vhs_tapes.is_empty()
    }

    // ------------------------------------------------------------------
    // Voices
    // ------------------------------------------------------------------

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice(&self, id: &VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|voice| voice.id() == id)
    }

    pub fn voice_mut(&mut self, id: &VoiceId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|voice| voice.id() == id)
    }

    pub fn add_voice(&mut self, voice: Voice) -> Result<()> {
        if self.voice(voice.id()).is_some() {
            return Err(duplicate(EntityKind::Voice, voice.id()));
        }
        self.voices.push(voice);
        Ok(())
    }

    /// Remove a voice; lines that used it become narration-less.
    pub fn remove_voice(&mut self, id: &VoiceId) -> Option<Voice> {
        let index = self.voices.iter().position(|voice| voice.id() == id)?;
        let removed = self.voices.remove(index);
        let mut cleared = 0usize;
        for broadcast in &mut self.broadcasts {
            for line in broadcast.lines_mut() {
                if line.voice_id.as_ref() == Some(id) {
                    line.voice_id = None;
                    cleared += 1;
                }
            }
        }
        debug!(voice = %id, cleared, "removed voice");
        Some(removed)
    }

    // ------------------------------------------------------------------
    // Broadcasts and lines
    // ------------------------------------------------------------------

    pub fn broadcasts(&self) -> &[Broadcast] {
        &self.broadcasts
    }

    pub fn broadcast(&self, id: &BroadcastId) -> Option<&Broadcast> {
        self.broadcasts.iter().find(|broadcast| broadcast.id() == id)
    }

    pub fn broadcast_mut(&mut self, id: &BroadcastId) -> Option<&mut Broadcast> {
        self.broadcasts
            .iter_mut()
            .find(|broadcast| broadcast.id() == id)
    }

    /// Add an empty broadcast. Lines are added through [`Project::add_line`].
    pub fn add_broadcast(&mut self, broadcast: Broadcast) -> Result<()> {
        if self.broadcast(broadcast.id()).is_some() {
            return Err(duplicate(EntityKind::Broadcast, broadcast.id()));
        }
        for line in broadcast.lines() {
            if self.contains_guid(line.guid()) {
                return Err(ModelError::DuplicateGuid(line.guid().to_string()));
            }
        }
        self.broadcasts.push(broadcast);
        Ok(())
    }

    /// Append a new line with a fresh guid and return that guid.
    pub fn add_line(
        &mut self,
        broadcast_id: &BroadcastId,
        text: impl Into<String>,
        voice_id: Option<VoiceId>,
    ) -> Result<Guid> {
        if let Some(voice_id) = &voice_id {
            if self.voice(voice_id).is_none() {
                return Err(unresolved(EntityKind::Voice, voice_id));
            }
        }
        let mut line = Line::new(text, voice_id);
        while self.contains_guid(line.guid()) {
            line = Line::new(std::mem::take(&mut line.text), line.voice_id.take());
        }
        let guid = line.guid().clone();
        self.adopt_line(broadcast_id, line)?;
        Ok(guid)
    }

    /// Append a line that already carries a guid, e.g. one read from a document.
    ///
    /// The guid must not be in use anywhere in the project.
    pub fn adopt_line(&mut self, broadcast_id: &BroadcastId, line: Line) -> Result<()> {
        if self.contains_guid(line.guid()) {
            return Err(ModelError::DuplicateGuid(line.guid().to_string()));
        }
        let broadcast = self
            .broadcast_mut(broadcast_id)
            .ok_or_else(|| unresolved(EntityKind::Broadcast, broadcast_id))?;
        broadcast.push_line(line);
        Ok(())
    }

    /// Set or clear the voice of a line.
    pub fn set_line_voice(&mut self, guid: &Guid, voice_id: Option<VoiceId>) -> Result<()> {
        if let Some(voice_id) = &voice_id {
            if self.voice(voice_id).is_none() {
                return Err(unresolved(EntityKind::Voice, voice_id));
            }
        }
        let line = self
            .broadcasts
            .iter_mut()
            .find_map(|broadcast| broadcast.line_mut(guid))
            .ok_or_else(|| unresolved(EntityKind::Line, guid))?;
        line.voice_id = voice_id;
        Ok(())
    }

    /// Remove a broadcast and every schedule entry, CD track and VHS segment
    /// that referenced it.
    pub fn remove_broadcast(&mut self, id: &BroadcastId) -> Option<Broadcast> {
        let index = self
            .broadcasts
            .iter()
            .position(|broadcast| broadcast.id() == id)?;
        let removed = self.broadcasts.remove(index);
        for channel in &mut self.channels {
            channel
                .schedule_mut()
                .retain(|entry| entry.broadcast_id() != id);
        }
        for cd in &mut self.cds {
            cd.track_ids_mut().retain(|track| track != id);
        }
        for tape in &mut self.vhs_tapes {
            tape.broadcast_ids_mut().retain(|segment| segment != id);
        }
        debug!(broadcast = %id, "removed broadcast and its references");
        Some(removed)
    }

    /// Whether a guid is used by any line or recorded media line.
    pub fn contains_guid(&self, guid: &Guid) -> bool {
        self.broadcasts
            .iter()
            .any(|broadcast| broadcast.line(guid).is_some())
            || self
                .recorded_media
                .iter()
                .any(|entry| entry.lines().iter().any(|line| line.guid() == guid))
    }

    /// Locate the broadcast owning a line.
    pub fn find_line(&self, guid: &Guid) -> Option<(&Broadcast, &Line)> {
        self.broadcasts
            .iter()
            .find_map(|broadcast| broadcast.line(guid).map(|line| (broadcast, line)))
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|channel| channel.id() == id)
    }

    pub fn channel_mut(&mut self, id: &ChannelId) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|channel| channel.id() == id)
    }

    pub fn add_channel(&mut self, channel: Channel) -> Result<()> {
        if self.channel(channel.id()).is_some() {
            return Err(duplicate(EntityKind::Channel, channel.id()));
        }
        for entry in channel.schedule() {
            self.require_broadcast(entry.broadcast_id())?;
        }
        self.channels.push(channel);
        Ok(())
    }

    pub fn add_schedule_entry(
        &mut self,
        channel_id: &ChannelId,
        entry: ChannelScheduleEntry,
    ) -> Result<()> {
        self.require_broadcast(entry.broadcast_id())?;
        let channel = self
            .channel_mut(channel_id)
            .ok_or_else(|| unresolved(EntityKind::Channel, channel_id))?;
        channel.schedule_mut().push(entry);
        Ok(())
    }

    /// Replace a channel's whole schedule. Every entry must resolve.
    pub fn replace_schedule(
        &mut self,
        channel_id: &ChannelId,
        schedule: Vec<ChannelScheduleEntry>,
    ) -> Result<()> {
        for entry in &schedule {
            self.require_broadcast(entry.broadcast_id())?;
        }
        let channel = self
            .channel_mut(channel_id)
            .ok_or_else(|| unresolved(EntityKind::Channel, channel_id))?;
        *channel.schedule_mut() = schedule;
        Ok(())
    }

    pub fn remove_channel(&mut self, id: &ChannelId) -> Option<Channel> {
        let index = self.channels.iter().position(|channel| channel.id() == id)?;
        Some(self.channels.remove(index))
    }

    // ------------------------------------------------------------------
    // Recorded media
    // ------------------------------------------------------------------

    pub fn recorded_media(&self) -> &[RecordedMediaEntry] {
        &self.recorded_media
    }

    pub fn recorded_media_entry(&self, id: &MediaId) -> Option<&RecordedMediaEntry> {
        self.recorded_media.iter().find(|entry| entry.id() == id)
    }

    pub fn recorded_media_entry_mut(&mut self, id: &MediaId) -> Option<&mut RecordedMediaEntry> {
        self.recorded_media.iter_mut().find(|entry| entry.id() == id)
    }

    pub fn add_recorded_media(&mut self, entry: RecordedMediaEntry) -> Result<()> {
        if self.recorded_media_entry(entry.id()).is_some() {
            return Err(duplicate(EntityKind::RecordedMedia, entry.id()));
        }
        for line in entry.lines() {
            if self.contains_guid(line.guid()) {
                return Err(ModelError::DuplicateGuid(line.guid().to_string()));
            }
        }
        self.recorded_media.push(entry);
        Ok(())
    }

    /// Append a recorded media line and return its guid.
    pub fn add_recorded_media_line(
        &mut self,
        media_id: &MediaId,
        text: impl Into<String>,
        color: Option<Rgb>,
        codes: Option<String>,
    ) -> Result<Guid> {
        if self.recorded_media_entry(media_id).is_none() {
            return Err(unresolved(EntityKind::RecordedMedia, media_id));
        }
        let text = text.into();
        let mut line = RecordedMediaLine::new(text.clone());
        while self.contains_guid(line.guid()) {
            line = RecordedMediaLine::new(text.clone());
        }
        if let Some(rgb) = color {
            line = line.with_color(rgb);
        }
        if let Some(codes) = codes {
            line = line.with_codes(codes);
        }
        let guid = line.guid().clone();
        if let Some(entry) = self.recorded_media_entry_mut(media_id) {
            entry.push_line(line);
        }
        Ok(guid)
    }

    pub fn remove_recorded_media(&mut self, id: &MediaId) -> Option<RecordedMediaEntry> {
        let index = self
            .recorded_media
            .iter()
            .position(|entry| entry.id() == id)?;
        Some(self.recorded_media.remove(index))
    }

    // ------------------------------------------------------------------
    // CDs and VHS tapes
    // ------------------------------------------------------------------

    pub fn cds(&self) -> &[Cd] {
        &self.cds
    }

    pub fn cd(&self, id: &CdId) -> Option<&Cd> {
        self.cds.iter().find(|cd| cd.id() == id)
    }

    pub fn cd_mut(&mut self, id: &CdId) -> Option<&mut Cd> {
        self.cds.iter_mut().find(|cd| cd.id() == id)
    }

    pub fn add_cd(&mut self, cd: Cd) -> Result<()> {
        if self.cd(cd.id()).is_some() {
            return Err(duplicate(EntityKind::Cd, cd.id()));
        }
        for track in cd.track_ids() {
            self.require_broadcast(track)?;
        }
        self.cds.push(cd);
        Ok(())
    }

    pub fn add_cd_track(&mut self, cd_id: &CdId, track: BroadcastId) -> Result<()> {
        self.require_broadcast(&track)?;
        let cd = self
            .cd_mut(cd_id)
            .ok_or_else(|| unresolved(EntityKind::Cd, cd_id))?;
        cd.track_ids_mut().push(track);
        Ok(())
    }

    pub fn remove_cd(&mut self, id: &CdId) -> Option<Cd> {
        let index = self.cds.iter().position(|cd| cd.id() == id)?;
        Some(self.cds.remove(index))
    }

    pub fn vhs_tapes(&self) -> &[VhsTape] {
        &self.vhs_tapes
    }

    pub fn vhs(&self, id: &VhsId) -> Option<&VhsTape> {
        self.vhs_tapes.iter().find(|tape| tape.id() == id)
    }

    pub fn vhs_mut(&mut self, id: &VhsId) -> Option<&mut VhsTape> {
        self.vhs_tapes.iter_mut().find(|tape| tape.id() == id)
    }

    pub fn add_vhs(&mut self, tape: VhsTape) -> Result<()> {
        if self.vhs(tape.id()).is_some() {
            return Err(duplicate(EntityKind::VhsTape, tape.id()));
        }
        for segment in tape.broadcast_ids() {
            self.require_broadcast(segment)?;
        }
        self.vhs_tapes.push(tape);
        Ok(())
    }

    pub fn add_vhs_segment(&mut self, vhs_id: &VhsId, segment: BroadcastId) -> Result<()> {
        self.require_broadcast(&segment)?;
        let tape = self
            .vhs_mut(vhs_id)
            .ok_or_else(|| unresolved(EntityKind::VhsTape, vhs_id))?;
        tape.broadcast_ids_mut().push(segment);
        Ok(())
    }

    pub fn remove_vhs(&mut self, id: &VhsId) -> Option<VhsTape> {
        let index = self.vhs_tapes.iter().position(|tape| tape.id() == id)?;
        Some(self.vhs_tapes.remove(index))
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    /// Check every invariant a deserialized project may have lost: unique ids
    /// per collection, globally unique guids, and resolvable references.
    ///
    /// Returns the first violation found.
    pub fn check_integrity(&self) -> Result<()> {
        check_unique(EntityKind::Voice, self.voices.iter().map(|v| v.id().as_str()))?;
        check_unique(
            EntityKind::Broadcast,
            self.broadcasts.iter().map(|b| b.id().as_str()),
        )?;
        check_unique(
            EntityKind::Channel,
            self.channels.iter().map(|c| c.id().as_str()),
        )?;
        check_unique(
            EntityKind::RecordedMedia,
            self.recorded_media.iter().map(|e| e.id().as_str()),
        )?;
        check_unique(EntityKind::Cd, self.cds.iter().map(|c| c.id().as_str()))?;
        check_unique(
            EntityKind::VhsTape,
            self.vhs_tapes.iter().map(|t| t.id().as_str()),
        )?;

        let mut guids = HashSet::new();
        let line_guids = self
            .broadcasts
            .iter()
            .flat_map(|b| b.lines().iter().map(Line::guid));
        let media_guids = self
            .recorded_media
            .iter()
            .flat_map(|e| e.lines().iter().map(RecordedMediaLine::guid));
        for guid in line_guids.chain(media_guids) {
            if !guids.insert(guid) {
                return Err(ModelError::DuplicateGuid(guid.to_string()));
            }
        }

        for broadcast in &self.broadcasts {
            for line in broadcast.lines() {
                if let Some(voice_id) = &line.voice_id {
                    if self.voice(voice_id).is_none() {
                        return Err(unresolved(EntityKind::Voice, voice_id));
                    }
                }
            }
        }
        let referenced = self
            .channels
            .iter()
            .flat_map(|c| c.schedule().iter().map(ChannelScheduleEntry::broadcast_id))
            .chain(self.cds.iter().flat_map(|cd| cd.track_ids().iter()))
            .chain(self.vhs_tapes.iter().flat_map(|t| t.broadcast_ids().iter()));
        for broadcast_id in referenced {
            self.require_broadcast(broadcast_id)?;
        }
        Ok(())
    }

    fn require_broadcast(&self, id: &BroadcastId) -> Result<()> {
        if self.broadcast(id).is_none() {
            return Err(unresolved(EntityKind::Broadcast, id));
        }
        Ok(())
    }
}

fn check_unique<'a>(kind: EntityKind, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ModelError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn duplicate(kind: EntityKind, id: impl std::fmt::Display) -> ModelError {
    ModelError::DuplicateId {
        kind,
        id: id.to_string(),
    }
}

fn unresolved(kind: EntityKind, id: impl std::fmt::Display) -> ModelError {
    ModelError::UnresolvedReference {
        kind,
        id: id.to_string(),
    }
}

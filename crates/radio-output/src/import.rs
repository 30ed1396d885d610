//! RadioData to project import.
//!
//! Import merges a document into a project: channels and broadcasts are looked
//! up by id (or created), line guids are adopted verbatim, and each channel's
//! schedule is replaced by the document's. Colors are not read back; they are
//! derived from voices on export only.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, info_span, warn};

use radio_model::{
    Broadcast, BroadcastId, Channel, ChannelId, ChannelScheduleEntry, Guid, Line, Project,
    new_guid,
};

use crate::common::read_bytes;
use crate::document::{BroadcastNode, ChannelNode, LineNode, RadioDocument};
use crate::error::{CodecError, Result};
use crate::radio_xml::{decode_document, normalize_line_text, parse_document};

/// A recoverable problem met while importing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportIssue {
    /// A line had no usable identity; a fresh guid was assigned.
    MissingGuid { broadcast: String, assigned: Guid },
    /// A line's guid already belongs to another broadcast or media line.
    ConflictingGuid {
        broadcast: String,
        guid: Guid,
        assigned: Guid,
    },
}

impl std::fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingGuid {
                broadcast,
                assigned,
            } => write!(
                f,
                "line in broadcast {broadcast} has no identity, assigned {assigned}"
            ),
            Self::ConflictingGuid {
                broadcast,
                guid,
                assigned,
            } => write!(
                f,
                "line {guid} in broadcast {broadcast} is already used elsewhere, assigned {assigned}"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub channels_created: usize,
    pub channels_updated: usize,
    /// Broadcasts materialized because the project did not have them.
    pub broadcasts_created: usize,
    pub lines_added: usize,
    pub lines_updated: usize,
    pub issues: Vec<ImportIssue>,
}

/// Merge a parsed document into `project`.
///
/// The merge runs on a copy and is committed only when it succeeds, so a
/// failed import leaves `project` untouched.
pub fn import_document(project: &mut Project, document: &RadioDocument) -> Result<ImportReport> {
    let mut staged = project.clone();
    let mut importer = Importer {
        project: &mut staged,
        report: ImportReport::default(),
        merged_broadcasts: HashSet::new(),
        schedules: Vec::new(),
    };
    for channel in &document.channels {
        importer.channel(channel)?;
    }
    let report = importer.finish()?;
    *project = staged;
    Ok(report)
}

/// Import a document into an empty project.
pub fn import_new_project(document: &RadioDocument) -> Result<(Project, ImportReport)> {
    let mut project = Project::new();
    let report = import_document(&mut project, document)?;
    Ok((project, report))
}

/// Read, parse and merge a RadioData file.
pub fn import_radio_data(project: &mut Project, path: &Path) -> Result<ImportReport> {
    let span = info_span!("import_radio_data", path = %path.display());
    let _guard = span.enter();

    let bytes = read_bytes(path)?;
    let xml = decode_document(&bytes)?;
    let document = parse_document(&xml)?;
    let report = import_document(project, &document)?;
    info!(
        channels_created = report.channels_created,
        broadcasts_created = report.broadcasts_created,
        lines_added = report.lines_added,
        lines_updated = report.lines_updated,
        issues = report.issues.len(),
        "imported RadioData from {}",
        path.display()
    );
    Ok(report)
}

struct Importer<'a> {
    project: &'a mut Project,
    report: ImportReport,
    /// Broadcasts whose lines were already merged by this import. A broadcast
    /// scheduled several times carries the same lines each time.
    merged_broadcasts: HashSet<BroadcastId>,
    schedules: Vec<(ChannelId, Vec<ChannelScheduleEntry>)>,
}

impl Importer<'_> {
    fn channel(&mut self, node: &ChannelNode) -> Result<()> {
        let id = ChannelId::new(node.id.as_str()).map_err(invalid_id)?;
        match self.project.channel_mut(&id) {
            Some(channel) => {
                channel.name.clone_from(&node.name);
                channel.frequency = node.frequency;
                self.report.channels_updated += 1;
            }
            None => {
                self.project
                    .add_channel(Channel::new(id.clone(), node.name.as_str(), node.frequency))?;
                self.report.channels_created += 1;
            }
        }

        let mut entries = Vec::with_capacity(node.broadcasts.len());
        for broadcast in &node.broadcasts {
            entries.push(self.broadcast(broadcast)?);
        }
        match self.schedules.iter_mut().find(|(channel, _)| channel == &id) {
            Some((_, schedule)) => schedule.extend(entries),
            None => self.schedules.push((id, entries)),
        }
        Ok(())
    }

    fn broadcast(&mut self, node: &BroadcastNode) -> Result<ChannelScheduleEntry> {
        let id = BroadcastId::new(node.id.as_str()).map_err(invalid_id)?;
        if self.project.broadcast(&id).is_none() {
            debug!(broadcast = %id, "materializing broadcast referenced by the document");
            self.project
                .add_broadcast(Broadcast::new(id.clone(), node.id.as_str()))?;
            self.report.broadcasts_created += 1;
        }
        if self.merged_broadcasts.insert(id.clone()) {
            for line in &node.lines {
                self.line(&id, line)?;
            }
        }
        // Stamps are whole seconds in the document and stay whole here.
        Ok(ChannelScheduleEntry::new(
            id,
            node.day,
            node.timestamp as f64,
            node.endstamp as f64,
        ))
    }

    fn line(&mut self, broadcast: &BroadcastId, node: &LineNode) -> Result<()> {
        let guid = match &node.id {
            Some(guid) => {
                let owner = self
                    .project
                    .find_line(guid)
                    .map(|(owner, _)| owner.id().clone());
                match owner {
                    Some(owner) if &owner == broadcast => {
                        self.update_line(broadcast, guid, &node.text);
                        return Ok(());
                    }
                    None if !self.project.contains_guid(guid) => guid.clone(),
                    _ => {
                        let assigned = self.fresh_guid();
                        let issue = ImportIssue::ConflictingGuid {
                            broadcast: broadcast.to_string(),
                            guid: guid.clone(),
                            assigned: assigned.clone(),
                        };
                        warn!("{issue}");
                        self.report.issues.push(issue);
                        assigned
                    }
                }
            }
            None => {
                let assigned = self.fresh_guid();
                let issue = ImportIssue::MissingGuid {
                    broadcast: broadcast.to_string(),
                    assigned: assigned.clone(),
                };
                warn!("{issue}");
                self.report.issues.push(issue);
                assigned
            }
        };
        self.project
            .adopt_line(broadcast, Line::with_guid(guid, node.text.as_str(), None))?;
        self.report.lines_added += 1;
        Ok(())
    }

    fn update_line(&mut self, broadcast: &BroadcastId, guid: &Guid, text: &str) {
        let Some(line) = self
            .project
            .broadcast_mut(broadcast)
            .and_then(|b| b.line_mut(guid))
        else {
            return;
        };
        // Parsed text is normalized, so compare normalized forms.
        if normalize_line_text(&line.text) != text {
            line.text = text.to_string();
            self.report.lines_updated += 1;
        }
    }

    fn fresh_guid(&self) -> Guid {
        let mut guid = new_guid();
        while self.project.contains_guid(&guid) {
            guid = new_guid();
        }
        guid
    }

    fn finish(self) -> Result<ImportReport> {
        for (channel, schedule) in self.schedules {
            self.project.replace_schedule(&channel, schedule)?;
        }
        Ok(self.report)
    }
}

fn invalid_id(error: radio_model::ModelError) -> CodecError {
    CodecError::malformed(error.to_string())
}

#[cfg(test)]
mod tests {
    use radio_model::{Rgb, Voice, VoiceId};

    use super::*;

    fn guid(value: &str) -> Guid {
        Guid::parse(value).unwrap()
    }

    fn line(id: Option<&str>, text: &str) -> LineNode {
        LineNode {
            id: id.map(guid),
            text: text.to_string(),
            rgb: None,
        }
    }

    fn document(lines: Vec<LineNode>) -> RadioDocument {
        RadioDocument {
            channels: vec![ChannelNode {
                id: "kpz".to_string(),
                name: "KPZ".to_string(),
                frequency: 98.4,
                broadcasts: vec![BroadcastNode {
                    id: "news".to_string(),
                    day: 3,
                    timestamp: 60,
                    endstamp: 120,
                    lines,
                }],
            }],
        }
    }

    #[test]
    fn test_import_adopts_guids_verbatim() {
        let doc = document(vec![line(Some("X-1"), "first"), line(Some("X-2"), "second")]);
        let (project, report) = import_new_project(&doc).unwrap();
        let (broadcast, line) = project.find_line(&guid("X-1")).unwrap();
        assert_eq!(broadcast.id().as_str(), "news");
        assert_eq!(line.text, "first");
        assert_eq!(line.voice_id(), None);
        assert_eq!(report.lines_added, 2);
        assert_eq!(report.broadcasts_created, 1);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_import_ignores_document_colors() {
        let mut node = line(Some("X-1"), "first");
        node.rgb = Some(Rgb::new(1, 2, 3));
        let (project, _) = import_new_project(&document(vec![node])).unwrap();
        assert!(project.voices().is_empty());
        assert_eq!(project.find_line(&guid("X-1")).unwrap().1.voice_id(), None);
    }

    #[test]
    fn test_import_assigns_guid_when_missing() {
        let (project, report) = import_new_project(&document(vec![line(None, "anon")])).unwrap();
        let broadcast = project.broadcast(&BroadcastId::new("news").unwrap()).unwrap();
        assert_eq!(broadcast.lines().len(), 1);
        assert!(broadcast.lines()[0].guid().is_uuid());
        assert!(matches!(report.issues[0], ImportIssue::MissingGuid { .. }));
    }

    #[test]
    fn test_import_schedule_uses_whole_seconds() {
        let (project, report) = import_new_project(&document(vec![])).unwrap();
        let channel = project.channel(&ChannelId::new("kpz").unwrap()).unwrap();
        assert_eq!(report.channels_created, 1);
        assert_eq!(channel.frequency, 98.4);
        let entry = &channel.schedule()[0];
        assert_eq!((entry.day, entry.start, entry.end), (3, 60.0, 120.0));
    }

    #[test]
    fn test_import_merges_into_existing_broadcast() {
        let mut project = Project::new();
        let host = VoiceId::new("host").unwrap();
        project
            .add_voice(Voice::new(host.clone(), "Host").with_color("#112233"))
            .unwrap();
        let news = BroadcastId::new("news").unwrap();
        project
            .add_broadcast(Broadcast::new(news.clone(), "Evening News"))
            .unwrap();
        let existing = project.add_line(&news, "old text", Some(host.clone())).unwrap();

        let doc = document(vec![
            line(Some(existing.as_str()), "new text"),
            line(Some("added"), "appended"),
        ]);
        let report = import_document(&mut project, &doc).unwrap();

        let broadcast = project.broadcast(&news).unwrap();
        assert_eq!(broadcast.title, "Evening News");
        assert_eq!(broadcast.lines()[0].text, "new text");
        assert_eq!(broadcast.lines()[0].voice_id(), Some(&host));
        assert_eq!(broadcast.lines()[1].guid().as_str(), "added");
        assert_eq!(report.lines_updated, 1);
        assert_eq!(report.lines_added, 1);
        assert_eq!(report.broadcasts_created, 0);
    }

    #[test]
    fn test_repeated_broadcast_merges_lines_once() {
        let mut doc = document(vec![line(None, "anon"), line(Some("X-1"), "named")]);
        let again = doc.channels[0].broadcasts[0].clone();
        doc.channels[0].broadcasts.push(again);
        let (project, _) = import_new_project(&doc).unwrap();
        let news = project.broadcast(&BroadcastId::new("news").unwrap()).unwrap();
        assert_eq!(news.lines().len(), 2);
        assert_eq!(project.channels()[0].schedule().len(), 2);
    }

    #[test]
    fn test_guid_owned_by_other_broadcast_is_replaced() {
        let mut doc = document(vec![line(Some("X-1"), "first")]);
        let mut other = doc.channels[0].broadcasts[0].clone();
        other.id = "weather".to_string();
        other.lines = vec![line(Some("X-1"), "clash")];
        doc.channels[0].broadcasts.push(other);

        let (project, report) = import_new_project(&doc).unwrap();
        project.check_integrity().unwrap();
        assert_eq!(project.find_line(&guid("X-1")).unwrap().1.text, "first");
        assert!(matches!(
            report.issues[0],
            ImportIssue::ConflictingGuid { .. }
        ));
    }

    #[test]
    fn test_invalid_id_leaves_project_untouched() {
        let mut project = Project::new();
        project
            .add_broadcast(Broadcast::new(BroadcastId::new("keep").unwrap(), "Keep"))
            .unwrap();
        let before = project.clone();
        let mut doc = document(vec![line(Some("X-1"), "first")]);
        doc.channels.push(ChannelNode {
            id: "bad\u{1}id".to_string(),
            name: String::new(),
            frequency: 0.0,
            broadcasts: Vec::new(),
        });
        assert!(matches!(
            import_document(&mut project, &doc),
            Err(CodecError::MalformedDocument { .. })
        ));
        assert_eq!(project, before);
    }
}

//! Project to RadioData export.

use std::path::Path;

use tracing::{debug, info, info_span, warn};

use radio_model::{Broadcast, Channel, Line, ModelError, Project, Rgb};

use crate::common::write_atomic;
use crate::document::{BroadcastNode, ChannelNode, LineNode, RadioDocument};
use crate::error::Result;
use crate::radio_xml::write_document;

/// A recoverable problem met while exporting. The affected node is still
/// written, minus the attribute that could not be derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportIssue {
    /// A schedule entry names a broadcast the project does not have.
    UnresolvedBroadcast { channel: String, broadcast: String },
    /// A line names a voice the project does not have.
    UnresolvedVoice { line: String, voice: String },
    /// A line's voice color is not `RRGGBB`.
    InvalidColor {
        line: String,
        voice: String,
        color: String,
    },
}

impl std::fmt::Display for ExportIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedBroadcast { channel, broadcast } => {
                write!(f, "channel {channel} schedules unknown broadcast {broadcast}")
            }
            Self::UnresolvedVoice { line, voice } => {
                write!(f, "line {line} refers to unknown voice {voice}")
            }
            Self::InvalidColor { line, voice, color } => {
                write!(f, "line {line}: voice {voice} has invalid color {color:?}")
            }
        }
    }
}

/// Counts and issues from one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub channels: usize,
    pub schedule_entries: usize,
    pub lines: usize,
    pub colored_lines: usize,
    pub issues: Vec<ExportIssue>,
}

impl ExportReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Lines whose voice reference did not resolve.
    pub fn unresolved_voice_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, ExportIssue::UnresolvedVoice { .. }))
            .count()
    }
}

/// Build the document tree for a project.
///
/// Never fails: unresolved references and malformed colors only drop the
/// dependent attribute and are recorded in the report.
pub fn build_document(project: &Project) -> (RadioDocument, ExportReport) {
    let mut report = ExportReport::default();
    let channels = project
        .channels()
        .iter()
        .map(|channel| channel_node(project, channel, &mut report))
        .collect();
    report.channels = project.channels().len();
    (RadioDocument { channels }, report)
}

fn channel_node(project: &Project, channel: &Channel, report: &mut ExportReport) -> ChannelNode {
    let mut broadcasts = Vec::with_capacity(channel.schedule().len());
    for entry in channel.schedule() {
        report.schedule_entries += 1;
        let lines = match project.broadcast(entry.broadcast_id()) {
            Some(broadcast) => line_nodes(project, broadcast, report),
            None => {
                let issue = ExportIssue::UnresolvedBroadcast {
                    channel: channel.id().to_string(),
                    broadcast: entry.broadcast_id().to_string(),
                };
                warn!("{issue}; exporting the entry without lines");
                report.issues.push(issue);
                Vec::new()
            }
        };
        broadcasts.push(BroadcastNode {
            id: entry.broadcast_id().to_string(),
            day: entry.day,
            timestamp: entry.timestamp(),
            endstamp: entry.endstamp(),
            lines,
        });
    }
    ChannelNode {
        id: channel.id().to_string(),
        name: channel.name.clone(),
        frequency: channel.frequency,
        broadcasts,
    }
}

fn line_nodes(
    project: &Project,
    broadcast: &Broadcast,
    report: &mut ExportReport,
) -> Vec<LineNode> {
    broadcast
        .lines()
        .iter()
        .map(|line| {
            report.lines += 1;
            let rgb = line_color(project, line, report);
            if rgb.is_some() {
                report.colored_lines += 1;
            }
            LineNode {
                id: Some(line.guid().clone()),
                text: line.text.clone(),
                rgb,
            }
        })
        .collect()
}

/// Color of a line's voice, or `None` when it cannot be derived.
fn line_color(project: &Project, line: &Line, report: &mut ExportReport) -> Option<Rgb> {
    let voice_id = line.voice_id()?;
    let Some(voice) = project.voice(voice_id) else {
        let issue = ExportIssue::UnresolvedVoice {
            line: line.guid().to_string(),
            voice: voice_id.to_string(),
        };
        warn!("{issue}; exporting without color");
        report.issues.push(issue);
        return None;
    };
    match voice.rgb() {
        Ok(rgb) => rgb,
        Err(ModelError::InvalidColor { value, reason }) => {
            debug!(voice = %voice_id, %reason, "skipping color attributes");
            let issue = ExportIssue::InvalidColor {
                line: line.guid().to_string(),
                voice: voice_id.to_string(),
                color: value,
            };
            warn!("{issue}; exporting without color");
            report.issues.push(issue);
            None
        }
        Err(other) => {
            warn!("line {}: {other}; exporting without color", line.guid());
            None
        }
    }
}

/// Render a project as RadioData XML text.
pub fn export_radio_data_string(project: &Project) -> Result<(String, ExportReport)> {
    let (document, report) = build_document(project);
    let xml = write_document(&document)?;
    Ok((xml, report))
}

/// Export a project to a RadioData file. The file is replaced atomically.
pub fn export_radio_data(project: &Project, path: &Path) -> Result<ExportReport> {
    let span = info_span!("export_radio_data", path = %path.display());
    let _guard = span.enter();

    let (xml, report) = export_radio_data_string(project)?;
    write_atomic(path, xml.as_bytes())?;
    info!(
        channels = report.channels,
        lines = report.lines,
        colored = report.colored_lines,
        issues = report.issues.len(),
        "exported RadioData to {}",
        path.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use radio_model::{
        BroadcastId, Channel, ChannelId, ChannelScheduleEntry, Voice, VoiceId,
    };

    use super::*;

    fn project(color: &str) -> (Project, radio_model::Guid) {
        let mut project = Project::new();
        let host = VoiceId::new("host").unwrap();
        project
            .add_voice(Voice::new(host.clone(), "Host").with_color(color))
            .unwrap();
        let news = BroadcastId::new("news").unwrap();
        project
            .add_broadcast(Broadcast::new(news.clone(), "News"))
            .unwrap();
        let guid = project.add_line(&news, "Hello", Some(host)).unwrap();
        project.add_line(&news, "Narration", None).unwrap();
        let ch = ChannelId::new("ch").unwrap();
        project
            .add_channel(Channel::new(ch.clone(), "Ch", 91.0))
            .unwrap();
        project
            .add_schedule_entry(&ch, ChannelScheduleEntry::new(news, 2, 0.9, 59.99))
            .unwrap();
        (project, guid)
    }

    #[test]
    fn test_colored_line_gets_rgb() {
        let (project, guid) = project("#0A0B0C");
        let (document, report) = build_document(&project);
        assert_eq!(document.line(&guid).unwrap().rgb, Some(Rgb::new(10, 11, 12)));
        assert_eq!(report.lines, 2);
        assert_eq!(report.colored_lines, 1);
        assert!(!report.has_issues());
    }

    #[test]
    fn test_malformed_color_degrades() {
        let (project, guid) = project("#0A0B");
        let (document, report) = build_document(&project);
        let line = document.line(&guid).unwrap();
        assert_eq!(line.rgb, None);
        assert_eq!(line.text, "Hello");
        assert!(matches!(report.issues[0], ExportIssue::InvalidColor { .. }));
    }

    #[test]
    fn test_uncolored_voice_is_not_an_issue() {
        let (project, guid) = project("");
        let (document, report) = build_document(&project);
        assert_eq!(document.line(&guid).unwrap().rgb, None);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_stamps_are_truncated() {
        let (project, _) = project("#000000");
        let (document, report) = build_document(&project);
        let node = &document.channels[0].broadcasts[0];
        assert_eq!((node.day, node.timestamp, node.endstamp), (2, 0, 59));
        assert_eq!(report.schedule_entries, 1);
    }

    #[test]
    fn test_unresolved_broadcast_is_reported() {
        let (project, _) = project("#000000");
        let mut json = serde_json::to_value(&project).unwrap();
        json["broadcasts"] = serde_json::json!([]);
        let broken: Project = serde_json::from_value(json).unwrap();
        let (document, report) = build_document(&broken);
        assert!(document.channels[0].broadcasts[0].lines.is_empty());
        assert!(matches!(
            report.issues[0],
            ExportIssue::UnresolvedBroadcast { .. }
        ));
    }
}

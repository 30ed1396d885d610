//! Round-trip verification of the RadioData export.
//!
//! Exports a project to memory, parses the result back and checks it line by
//! line against the model: every exported guid must belong to the broadcast it
//! was written under, the text must survive, and the color attributes must
//! decode to the voice's hex color.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use radio_model::{Guid, Line, Project, Rgb};

use crate::document::RadioDocument;
use crate::error::Result;
use crate::export::{ExportIssue, export_radio_data_string};
use crate::radio_xml::{normalize_line_text, parse_document};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyIssue {
    /// Carried over from the export step.
    Export(ExportIssue),
    /// A line node has no usable ID.
    MissingId { broadcast: String },
    /// A line node's guid is not a line of the broadcast it sits under.
    UnknownGuid { broadcast: String, guid: Guid },
    /// A line of a scheduled broadcast is absent from the document.
    MissingLine { broadcast: String, guid: Guid },
    TextMismatch {
        guid: Guid,
        expected: String,
        found: String,
    },
    ColorMismatch {
        guid: Guid,
        expected: Option<Rgb>,
        found: Option<Rgb>,
    },
}

impl std::fmt::Display for VerifyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Export(issue) => write!(f, "{issue}"),
            Self::MissingId { broadcast } => {
                write!(f, "broadcast {broadcast} has a line without an ID")
            }
            Self::UnknownGuid { broadcast, guid } => {
                write!(f, "broadcast {broadcast} contains unknown line {guid}")
            }
            Self::MissingLine { broadcast, guid } => {
                write!(f, "line {guid} of broadcast {broadcast} was not exported")
            }
            Self::TextMismatch {
                guid,
                expected,
                found,
            } => write!(f, "line {guid}: expected text {expected:?}, found {found:?}"),
            Self::ColorMismatch {
                guid,
                expected,
                found,
            } => write!(
                f,
                "line {guid}: expected color {}, found {}",
                describe(*expected),
                describe(*found)
            ),
        }
    }
}

fn describe(rgb: Option<Rgb>) -> String {
    rgb.map_or_else(|| "none".to_string(), |rgb| rgb.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub lines_checked: usize,
    pub colors_checked: usize,
    pub issues: Vec<VerifyIssue>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Export `project` to memory, parse it back and compare.
pub fn verify_round_trip(project: &Project) -> Result<VerifyReport> {
    let (xml, export) = export_radio_data_string(project)?;
    let document = parse_document(&xml)?;
    let mut report = verify_document(project, &document);
    let mut issues: Vec<VerifyIssue> =
        export.issues.into_iter().map(VerifyIssue::Export).collect();
    issues.append(&mut report.issues);
    report.issues = issues;
    if report.is_clean() {
        info!(lines = report.lines_checked, colors = report.colors_checked, "round trip clean");
    } else {
        warn!(issues = report.issues.len(), "round trip found problems");
    }
    Ok(report)
}

/// Compare a parsed document with the project it was exported from.
pub fn verify_document(project: &Project, document: &RadioDocument) -> VerifyReport {
    let mut report = VerifyReport::default();

    for channel in &document.channels {
        for node in &channel.broadcasts {
            let Some(broadcast) = project
                .broadcasts()
                .iter()
                .find(|b| b.id().as_str() == node.id)
            else {
                // Already reported by the export as an unresolved schedule entry.
                debug!(broadcast = %node.id, "skipping unresolved broadcast");
                continue;
            };

            let mut seen = HashSet::new();
            for line_node in &node.lines {
                report.lines_checked += 1;
                let Some(guid) = &line_node.id else {
                    report.issues.push(VerifyIssue::MissingId {
                        broadcast: node.id.clone(),
                    });
                    continue;
                };
                let Some(line) = broadcast.line(guid) else {
                    report.issues.push(VerifyIssue::UnknownGuid {
                        broadcast: node.id.clone(),
                        guid: guid.clone(),
                    });
                    continue;
                };
                seen.insert(guid.clone());

                let expected_text = normalize_line_text(&line.text);
                if line_node.text != expected_text {
                    report.issues.push(VerifyIssue::TextMismatch {
                        guid: guid.clone(),
                        expected: expected_text,
                        found: line_node.text.clone(),
                    });
                }

                let expected_rgb = expected_color(project, line);
                if expected_rgb.is_some() || line_node.rgb.is_some() {
                    report.colors_checked += 1;
                }
                if line_node.rgb != expected_rgb {
                    report.issues.push(VerifyIssue::ColorMismatch {
                        guid: guid.clone(),
                        expected: expected_rgb,
                        found: line_node.rgb,
                    });
                }
            }

            for line in broadcast.lines() {
                if !seen.contains(line.guid()) {
                    report.issues.push(VerifyIssue::MissingLine {
                        broadcast: node.id.clone(),
                        guid: line.guid().clone(),
                    });
                }
            }
        }
    }
    report
}

/// Color the export should have written: the voice's decoded hex color.
fn expected_color(project: &Project, line: &Line) -> Option<Rgb> {
    let voice = project.voice(line.voice_id()?)?;
    voice.rgb().ok().flatten()
}

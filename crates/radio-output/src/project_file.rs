//! Project file save and load.
//!
//! Projects are stored as pretty-printed JSON wrapped in a small envelope
//! carrying the schema version and the save time.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use radio_model::Project;

use crate::common::{read_text, write_atomic};
use crate::error::{CodecError, Result};

/// Current project file schema.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Conventional extension for project files.
pub const PROJECT_EXTENSION: &str = "radio.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub project: Project,
}

impl ProjectFile {
    pub fn new(project: Project) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            saved_at: Utc::now(),
            project,
        }
    }
}

/// Save a project. The file is replaced atomically.
pub fn save_project(project: &Project, path: &Path) -> Result<()> {
    let file = ProjectFile::new(project.clone());
    let mut json = serde_json::to_string_pretty(&file)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())?;
    tracing::info!("Saved project to {}", path.display());
    Ok(())
}

/// Load a project and check its referential integrity.
pub fn load_project(path: &Path) -> Result<Project> {
    let text = read_text(path)?;
    let file: ProjectFile = serde_json::from_str(&text)?;
    if file.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: file.schema_version,
            max_supported: CURRENT_SCHEMA_VERSION,
            path: path.to_path_buf(),
        });
    }
    file.project.check_integrity()?;
    tracing::info!(
        saved_at = %file.saved_at,
        "Loaded project from {}",
        path.display()
    );
    Ok(file.project)
}

#[cfg(test)]
mod tests {
    use radio_model::{Broadcast, BroadcastId, Voice, VoiceId};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("show.radio.json");

        let mut project = Project::new();
        let host = VoiceId::new("host").unwrap();
        project
            .add_voice(Voice::new(host.clone(), "Host").with_color("#112233"))
            .unwrap();
        let news = BroadcastId::new("news").unwrap();
        project.add_broadcast(Broadcast::new(news.clone(), "News")).unwrap();
        let guid = project.add_line(&news, "Hello", Some(host)).unwrap();

        save_project(&project, &path).unwrap();
        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded, project);
        assert!(loaded.find_line(&guid).is_some());
    }

    #[test]
    fn test_load_future_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.radio.json");
        let json = serde_json::json!({
            "schema_version": 99,
            "saved_at": "2026-01-01T00:00:00Z",
            "project": {}
        });
        std::fs::write(&path, json.to_string()).unwrap();

        assert!(matches!(
            load_project(&path),
            Err(CodecError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_load_rejects_dangling_references() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.radio.json");

        let mut project = Project::new();
        let news = BroadcastId::new("news").unwrap();
        project.add_broadcast(Broadcast::new(news.clone(), "News")).unwrap();
        project.add_line(&news, "Hello", None).unwrap();
        let mut file = serde_json::to_value(ProjectFile::new(project)).unwrap();
        file["project"]["broadcasts"][0]["lines"][0]["voice_id"] = serde_json::json!("ghost");
        std::fs::write(&path, file.to_string()).unwrap();

        assert!(matches!(load_project(&path), Err(CodecError::Model(_))));
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.radio.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_project(&path),
            Err(CodecError::Serialization(_))
        ));
    }
}

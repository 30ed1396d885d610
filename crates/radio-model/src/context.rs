//! Application context: the current project plus transient selection state.
//!
//! Configuration is passed in explicitly; nothing here reads global state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Cd, VhsTape};
use crate::error::{EntityKind, ModelError, Result};
use crate::ids::{CdId, VhsId};
use crate::project::Project;

/// Settings that shape an [`AppContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Load `project_path` on startup.
    pub auto_load_project: bool,
    /// Project file opened by default.
    pub project_path: Option<PathBuf>,
    /// Directory that export commands write to when no path is given.
    pub export_dir: Option<PathBuf>,
}

/// Currently selected collectibles of the editing surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub cd: Option<CdId>,
    pub vhs: Option<VhsId>,
}

#[derive(Debug, Clone, Default)]
pub struct AppContext {
    config: ContextConfig,
    project: Project,
    selection: Selection,
}

impl AppContext {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            project: Project::new(),
            selection: Selection::default(),
        }
    }

    pub fn with_project(config: ContextConfig, project: Project) -> Self {
        Self {
            config,
            project,
            selection: Selection::default(),
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    /// Swap in a new project, returning the old one. Selection is reset.
    pub fn replace_project(&mut self, project: Project) -> Project {
        self.selection = Selection::default();
        std::mem::replace(&mut self.project, project)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Add a CD and select it.
    pub fn add_cd(&mut self, cd: Cd) -> Result<()> {
        let id = cd.id().clone();
        self.project.add_cd(cd)?;
        self.selection.cd = Some(id);
        Ok(())
    }

    /// Add a VHS tape and select it.
    pub fn add_vhs(&mut self, tape: VhsTape) -> Result<()> {
        let id = tape.id().clone();
        self.project.add_vhs(tape)?;
        self.selection.vhs = Some(id);
        Ok(())
    }

    pub fn select_cd(&mut self, id: &CdId) -> Result<()> {
        if self.project.cd(id).is_none() {
            return Err(ModelError::UnresolvedReference {
                kind: EntityKind::Cd,
                id: id.to_string(),
            });
        }
        debug!(cd = %id, "selected cd");
        self.selection.cd = Some(id.clone());
        Ok(())
    }

    pub fn select_vhs(&mut self, id: &VhsId) -> Result<()> {
        if self.project.vhs(id).is_none() {
            return Err(ModelError::UnresolvedReference {
                kind: EntityKind::VhsTape,
                id: id.to_string(),
            });
        }
        debug!(vhs = %id, "selected vhs tape");
        self.selection.vhs = Some(id.clone());
        Ok(())
    }

    /// The selected CD, if it still exists.
    pub fn selected_cd(&self) -> Option<&Cd> {
        self.selection
            .cd
            .as_ref()
            .and_then(|id| self.project.cd(id))
    }

    /// The selected VHS tape, if it still exists.
    pub fn selected_vhs(&self) -> Option<&VhsTape> {
        self.selection
            .vhs
            .as_ref()
            .and_then(|id| self.project.vhs(id))
    }

    pub fn remove_cd(&mut self, id: &CdId) -> Option<Cd> {
        if self.selection.cd.as_ref() == Some(id) {
            self.selection.cd = None;
        }
        self.project.remove_cd(id)
    }

    pub fn remove_vhs(&mut self, id: &VhsId) -> Option<VhsTape> {
        if self.selection.vhs.as_ref() == Some(id) {
            self.selection.vhs = None;
        }
        self.project.remove_vhs(id)
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cd(id: &str) -> Cd {
        Cd::new(CdId::new(id).unwrap(), "Greatest Hits")
    }

    #[test]
    fn add_cd_selects_it() {
        let mut ctx = AppContext::new(ContextConfig::default());
        ctx.add_cd(cd("cd-1")).unwrap();
        assert_eq!(ctx.selected_cd().map(|c| c.id().as_str()), Some("cd-1"));
    }

    #[test]
    fn select_unknown_vhs_fails_and_keeps_selection() {
        let mut ctx = AppContext::new(ContextConfig::default());
        ctx.add_vhs(VhsTape::new(VhsId::new("t1").unwrap(), "Tape"))
            .unwrap();
        assert!(ctx.select_vhs(&VhsId::new("t2").unwrap()).is_err());
        assert_eq!(ctx.selected_vhs().map(|t| t.id().as_str()), Some("t1"));
    }

    #[test]
    fn removing_selected_cd_clears_selection() {
        let mut ctx = AppContext::new(ContextConfig::default());
        ctx.add_cd(cd("cd-1")).unwrap();
        ctx.add_cd(cd("cd-2")).unwrap();
        ctx.select_cd(&CdId::new("cd-1").unwrap()).unwrap();
        ctx.remove_cd(&CdId::new("cd-1").unwrap());
        assert_eq!(ctx.selection().cd, None);
        assert_eq!(ctx.project().cds().len(), 1);
    }

    #[test]
    fn replace_project_resets_selection() {
        let mut ctx = AppContext::new(ContextConfig::default());
        ctx.add_cd(cd("cd-1")).unwrap();
        let old = ctx.replace_project(Project::new());
        assert_eq!(old.cds().len(), 1);
        assert!(ctx.selected_cd().is_none());
        assert_eq!(ctx.selection(), &Selection::default());
    }

    #[test]
    fn config_is_supplied_not_global() {
        let config = ContextConfig {
            auto_load_project: true,
            project_path: Some("station.radio.json".into()),
            export_dir: None,
        };
        let ctx = AppContext::new(config.clone());
        assert_eq!(ctx.config(), &config);
    }
}

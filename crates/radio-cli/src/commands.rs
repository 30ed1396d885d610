use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use radio_model::{AppContext, ContextConfig, Project};
use radio_output::{
    ExportReport, ImportReport, RecordedMediaExport, VerifyReport, export_radio_data,
    import_radio_data, load_project, save_project, verify_round_trip, write_recorded_media,
};

use crate::cli::{ExportArgs, ImportArgs, MediaArgs, NewArgs, ProjectArgs};
use crate::config::Settings;

#[derive(Debug)]
pub struct ExportOutcome {
    pub project_path: PathBuf,
    pub output_path: PathBuf,
    pub report: ExportReport,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub project_path: PathBuf,
    pub input_path: PathBuf,
    pub report: ImportReport,
    /// Whether the merged project was written back.
    pub saved: bool,
}

#[derive(Debug)]
pub struct MediaOutcome {
    pub script_path: PathBuf,
    pub translation_path: PathBuf,
    pub export: RecordedMediaExport,
}

pub fn run_new(args: &NewArgs) -> Result<PathBuf> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        );
    }
    save_project(&Project::new(), &args.path)
        .with_context(|| format!("create project {}", args.path.display()))?;
    Ok(args.path.clone())
}

pub fn run_export(args: &ExportArgs, settings: &Settings) -> Result<ExportOutcome> {
    let (context, project_path) = open_context(&args.project, &settings.context)?;
    let output_path = output_path(
        args.output.as_deref(),
        &settings.context,
        &settings.output.radio_data_file,
    );
    let span = info_span!("export", project = %project_path.display());
    let _guard = span.enter();

    let report = export_radio_data(context.project(), &output_path)
        .with_context(|| format!("export {}", output_path.display()))?;
    Ok(ExportOutcome {
        project_path,
        output_path,
        report,
    })
}

pub fn run_import(args: &ImportArgs, settings: &Settings) -> Result<ImportOutcome> {
    let project_path = resolve_project_path(args.project.project.as_deref(), &settings.context)?;
    let project = if project_path.exists() {
        load_project(&project_path)
            .with_context(|| format!("load project {}", project_path.display()))?
    } else {
        info!("{} does not exist, importing into a new project", project_path.display());
        Project::new()
    };
    let mut context = AppContext::with_project(settings.context.clone(), project);

    let span = info_span!("import", project = %project_path.display());
    let _guard = span.enter();
    let report = import_radio_data(context.project_mut(), &args.input)
        .with_context(|| format!("import {}", args.input.display()))?;

    if !args.dry_run {
        save_project(context.project(), &project_path)
            .with_context(|| format!("save project {}", project_path.display()))?;
    }
    Ok(ImportOutcome {
        project_path,
        input_path: args.input.clone(),
        report,
        saved: !args.dry_run,
    })
}

pub fn run_verify(args: &ProjectArgs, settings: &Settings) -> Result<VerifyReport> {
    let (context, project_path) = open_context(args, &settings.context)?;
    let span = info_span!("verify", project = %project_path.display());
    let _guard = span.enter();
    verify_round_trip(context.project()).context("verify round trip")
}

pub fn run_media(args: &MediaArgs, settings: &Settings) -> Result<MediaOutcome> {
    let (context, _) = open_context(&args.project, &settings.context)?;
    let script_path = output_path(
        args.script.as_deref(),
        &settings.context,
        &settings.output.script_file,
    );
    let translation_path = output_path(
        args.translation.as_deref(),
        &settings.context,
        &settings.output.translation_file,
    );
    let export = write_recorded_media(context.project(), &script_path, &translation_path)
        .context("write recorded media")?;
    Ok(MediaOutcome {
        script_path,
        translation_path,
        export,
    })
}

/// Load the project named on the command line or by the settings.
fn open_context(args: &ProjectArgs, config: &ContextConfig) -> Result<(AppContext, PathBuf)> {
    let path = resolve_project_path(args.project.as_deref(), config)?;
    let project =
        load_project(&path).with_context(|| format!("load project {}", path.display()))?;
    Ok((AppContext::with_project(config.clone(), project), path))
}

pub fn resolve_project_path(explicit: Option<&Path>, config: &ContextConfig) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match (&config.project_path, config.auto_load_project) {
        (Some(path), true) => Ok(path.clone()),
        (Some(_), false) => {
            bail!("no project given; pass --project or enable auto_load_project in the settings")
        }
        (None, _) => bail!("no project given; pass --project or set project_path in the settings"),
    }
}

pub fn output_path(explicit: Option<&Path>, config: &ContextConfig, file_name: &str) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => match &config.export_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        },
    }
}

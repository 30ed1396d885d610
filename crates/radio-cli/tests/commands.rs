//! Integration tests for the radio-studio commands.

use std::path::{Path, PathBuf};

use radio_cli::cli::{ExportArgs, ImportArgs, MediaArgs, NewArgs, ProjectArgs};
use radio_cli::commands::{
    output_path, resolve_project_path, run_export, run_import, run_media, run_new, run_verify,
};
use radio_cli::config::Settings;
use radio_model::{
    Broadcast, BroadcastId, Channel, ChannelId, ChannelScheduleEntry, ContextConfig,
    MediaCategory, MediaId, Project, RecordedMediaEntry, Voice, VoiceId,
};
use radio_output::{load_project, save_project};
use tempfile::tempdir;

fn write_sample_project(path: &Path) {
    let mut project = Project::new();
    let host = VoiceId::new("host").unwrap();
    project
        .add_voice(Voice::new(host.clone(), "Host").with_color("#112233"))
        .unwrap();
    let news = BroadcastId::new("news-1").unwrap();
    project
        .add_broadcast(Broadcast::new(news.clone(), "Morning News"))
        .unwrap();
    project.add_line(&news, "Good morning.", Some(host)).unwrap();
    let channel = ChannelId::new("kpz").unwrap();
    project
        .add_channel(Channel::new(channel.clone(), "KPZ", 98.4))
        .unwrap();
    project
        .add_schedule_entry(&channel, ChannelScheduleEntry::new(news, 1, 12.7, 90.3))
        .unwrap();
    let tape = MediaId::new("tape-1").unwrap();
    project
        .add_recorded_media(RecordedMediaEntry::new(tape.clone(), "Tape", MediaCategory::HomeVhs))
        .unwrap();
    project
        .add_recorded_media_line(&tape, "Hello tape", None, None)
        .unwrap();
    save_project(&project, path).unwrap();
}

fn project_args(path: &Path) -> ProjectArgs {
    ProjectArgs {
        project: Some(path.to_path_buf()),
    }
}

#[test]
fn test_new_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("show.radio.json");
    let args = NewArgs {
        path: path.clone(),
        force: false,
    };
    run_new(&args).unwrap();
    assert!(load_project(&path).unwrap().is_empty());
    assert!(run_new(&args).is_err());
    run_new(&NewArgs { path, force: true }).unwrap();
}

#[test]
fn test_export_then_import_into_new_project() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.radio.json");
    write_sample_project(&source);
    let settings = Settings {
        context: ContextConfig {
            export_dir: Some(dir.path().join("out")),
            ..ContextConfig::default()
        },
        ..Settings::default()
    };

    let exported = run_export(
        &ExportArgs {
            project: project_args(&source),
            output: None,
            strict: true,
        },
        &settings,
    )
    .unwrap();
    assert_eq!(exported.output_path, dir.path().join("out").join("RadioData.xml"));
    assert!(!exported.report.has_issues());

    let target = dir.path().join("target.radio.json");
    let imported = run_import(
        &ImportArgs {
            input: exported.output_path.clone(),
            project: project_args(&target),
            dry_run: false,
        },
        &settings,
    )
    .unwrap();
    assert!(imported.saved);
    assert_eq!(imported.report.lines_added, 1);
    assert_eq!(imported.report.broadcasts_created, 1);

    let source_project = load_project(&source).unwrap();
    let target_project = load_project(&target).unwrap();
    let guid = source_project.broadcasts()[0].lines()[0].guid();
    assert!(target_project.find_line(guid).is_some());
}

#[test]
fn test_import_dry_run_does_not_save() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.radio.json");
    write_sample_project(&source);
    let xml = dir.path().join("RadioData.xml");
    let settings = Settings::default();
    run_export(
        &ExportArgs {
            project: project_args(&source),
            output: Some(xml.clone()),
            strict: false,
        },
        &settings,
    )
    .unwrap();

    let target = dir.path().join("target.radio.json");
    let outcome = run_import(
        &ImportArgs {
            input: xml,
            project: project_args(&target),
            dry_run: true,
        },
        &settings,
    )
    .unwrap();
    assert!(!outcome.saved);
    assert!(!target.exists());
}

#[test]
fn test_verify_and_media_use_auto_loaded_project() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.radio.json");
    write_sample_project(&source);
    let settings = Settings {
        context: ContextConfig {
            auto_load_project: true,
            project_path: Some(source),
            export_dir: Some(dir.path().to_path_buf()),
        },
        ..Settings::default()
    };

    let report = run_verify(&ProjectArgs { project: None }, &settings).unwrap();
    assert!(report.is_clean(), "{:?}", report.issues);
    assert_eq!(report.colors_checked, 1);

    let media = run_media(
        &MediaArgs {
            project: ProjectArgs { project: None },
            script: None,
            translation: None,
        },
        &settings,
    )
    .unwrap();
    assert_eq!(media.export.entries, 1);
    assert!(dir.path().join("recorded_media.lua").exists());
    assert!(dir.path().join("Recorded_Media_EN.txt").exists());
}

#[test]
fn test_project_resolution() {
    let mut config = ContextConfig {
        project_path: Some(PathBuf::from("default.radio.json")),
        ..ContextConfig::default()
    };
    assert!(resolve_project_path(None, &config).is_err());
    assert_eq!(
        resolve_project_path(Some(Path::new("x.radio.json")), &config).unwrap(),
        PathBuf::from("x.radio.json")
    );
    config.auto_load_project = true;
    assert_eq!(
        resolve_project_path(None, &config).unwrap(),
        PathBuf::from("default.radio.json")
    );
    assert_eq!(
        output_path(None, &ContextConfig::default(), "RadioData.xml"),
        PathBuf::from("RadioData.xml")
    );
}

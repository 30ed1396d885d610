//! Tests for radio-model types.

use radio_model::{
    Broadcast, BroadcastId, Channel, ChannelId, ChannelScheduleEntry, ModelError, Project, Voice,
    VoiceId,
};

fn sample_project() -> (Project, BroadcastId) {
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
    project.add_line(&news, "(static)", None).unwrap();
    let channel = ChannelId::new("kpz").unwrap();
    project
        .add_channel(Channel::new(channel.clone(), "KPZ", 98.4))
        .unwrap();
    project
        .add_schedule_entry(
            &channel,
            ChannelScheduleEntry::new(news.clone(), 1, 12.7, 90.3),
        )
        .unwrap();
    (project, news)
}

#[test]
fn project_serializes_and_keeps_guids() {
    let (project, news) = sample_project();
    let json = serde_json::to_string(&project).expect("serialize project");
    let round: Project = serde_json::from_str(&json).expect("deserialize project");
    assert_eq!(round, project);
    round.check_integrity().unwrap();
    let guids = |p: &Project| -> Vec<String> {
        p.broadcast(&news)
            .unwrap()
            .lines()
            .iter()
            .map(|line| line.guid().to_string())
            .collect()
    };
    assert_eq!(guids(&project), guids(&round));
}

#[test]
fn line_order_is_playback_order() {
    let (project, news) = sample_project();
    let texts: Vec<_> = project
        .broadcast(&news)
        .unwrap()
        .lines()
        .iter()
        .map(|line| line.text.as_str())
        .collect();
    assert_eq!(texts, ["Good morning.", "(static)"]);
}

#[test]
fn schedule_entry_requires_existing_broadcast() {
    let (mut project, _) = sample_project();
    let err = project
        .add_schedule_entry(
            &ChannelId::new("kpz").unwrap(),
            ChannelScheduleEntry::new(BroadcastId::new("ghost").unwrap(), 0, 0.0, 1.0),
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::UnresolvedReference { .. }));
    assert_eq!(project.channels()[0].schedule().len(), 1);
}

#[test]
fn integrity_detects_dangling_voice_after_deserialize() {
    let (project, _) = sample_project();
    let mut json = serde_json::to_value(&project).unwrap();
    json["voices"] = serde_json::json!([]);
    let broken: Project = serde_json::from_value(json).unwrap();
    assert!(matches!(
        broken.check_integrity(),
        Err(ModelError::UnresolvedReference { .. })
    ));
}

#[test]
fn missing_collections_default_to_empty() {
    let project: Project = serde_json::from_str("{}").unwrap();
    assert!(project.is_empty());
}

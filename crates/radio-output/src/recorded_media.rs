//! Recorded media script and translation output.
//!
//! Each recorded media entry becomes one `RecMedia["<id>"] = { ... };` table in
//! the script. Everything a player reads is referenced by key (`RM_<id>_title`,
//! `RM_<guid>`) and the text itself goes to the translation file, so the two
//! files join purely by key.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use tracing::{debug, info, info_span};

use radio_model::{Guid, Project, RecordedMediaEntry, RecordedMediaLine};

use crate::common::{RECORDED_MEDIA_PREFIX, escape_lua, unescape_lua, write_atomic};
use crate::error::{CodecError, Result};

/// First line of every script.
pub const SCRIPT_HEADER: &str = "RecMedia = RecMedia or {}";

/// Marker closing each entry table. Appears exactly once per entry.
pub const ENTRY_CLOSE: &str = "};";

const INDENT: &str = "    ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedMediaExport {
    pub script: String,
    pub translation: String,
    pub entries: usize,
    pub lines: usize,
}

/// Translation key of a line.
pub fn line_key(guid: &Guid) -> String {
    format!("{RECORDED_MEDIA_PREFIX}{}", key_fragment(guid.as_str()))
}

/// Translation key of an entry field such as `title`.
pub fn field_key(entry: &RecordedMediaEntry, field: &str) -> String {
    format!(
        "{RECORDED_MEDIA_PREFIX}{}_{field}",
        key_fragment(entry.id().as_str())
    )
}

/// Keys are bare identifiers in the translation file.
fn key_fragment(value: &str) -> String {
    value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Render the script and translation text for every recorded media entry.
///
/// Fails when two entries or lines would share a translation key, since the
/// game could then show one item's text for another.
pub fn export_recorded_media(project: &Project) -> Result<RecordedMediaExport> {
    let mut export = RecordedMediaExport::default();
    let mut script = String::new();
    let mut translation = String::new();
    let mut owners = BTreeMap::new();
    let _ = writeln!(script, "{SCRIPT_HEADER}");

    for entry in project.recorded_media() {
        script.push('\n');
        write_entry(&mut script, entry);
        write_translations(&mut translation, &mut owners, entry)?;
        export.entries += 1;
        export.lines += entry.lines().len();
        debug!(entry = %entry.id(), lines = entry.lines().len(), "rendered recorded media");
    }

    export.script = script;
    export.translation = translation;
    Ok(export)
}

fn write_entry(out: &mut String, entry: &RecordedMediaEntry) {
    let title_key = field_key(entry, "title");
    let _ = writeln!(out, "RecMedia[\"{}\"] = {{", escape_lua(entry.id().as_str()));
    let _ = writeln!(out, "{INDENT}itemDisplayName = \"{title_key}\",");
    let _ = writeln!(out, "{INDENT}title = \"{title_key}\",");
    if !entry.author.is_empty() {
        let _ = writeln!(out, "{INDENT}author = \"{}\",", field_key(entry, "author"));
    }
    if !entry.extra.is_empty() {
        let _ = writeln!(out, "{INDENT}extra = \"{}\",", field_key(entry, "extra"));
    }
    let _ = writeln!(out, "{INDENT}spawning = {},", entry.spawn);
    let _ = writeln!(
        out,
        "{INDENT}category = \"{}\",",
        escape_lua(entry.category.as_str())
    );
    let _ = writeln!(out, "{INDENT}lines = {{");
    for line in entry.lines() {
        write_line(out, line);
    }
    let _ = writeln!(out, "{INDENT}}},");
    let _ = writeln!(out, "{ENTRY_CLOSE}");
}

fn write_line(out: &mut String, line: &RecordedMediaLine) {
    let _ = write!(
        out,
        "{INDENT}{INDENT}{{ text = \"{}\", r = {:.2}, g = {:.2}, b = {:.2}",
        line_key(line.guid()),
        unit(line.r),
        unit(line.g),
        unit(line.b),
    );
    if let Some(codes) = &line.codes {
        let _ = write!(out, ", codes = \"{}\"", escape_lua(codes));
    }
    let _ = writeln!(out, " }},");
}

fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn write_translations(
    out: &mut String,
    owners: &mut BTreeMap<String, String>,
    entry: &RecordedMediaEntry,
) -> Result<()> {
    let mut fields = vec![("title", &entry.title)];
    if !entry.author.is_empty() {
        fields.push(("author", &entry.author));
    }
    if !entry.extra.is_empty() {
        fields.push(("extra", &entry.extra));
    }
    for (field, value) in fields {
        let key = field_key(entry, field);
        claim_key(owners, &key, || format!("entry {} {field}", entry.id()))?;
        write_assignment(out, &key, value);
    }
    for line in entry.lines() {
        let key = line_key(line.guid());
        claim_key(owners, &key, || format!("line {}", line.guid()))?;
        write_assignment(out, &key, &line.text);
    }
    Ok(())
}

/// Record `key` as taken, failing when something else already holds it.
fn claim_key(
    owners: &mut BTreeMap<String, String>,
    key: &str,
    owner: impl FnOnce() -> String,
) -> Result<()> {
    match owners.get(key) {
        Some(first) => Err(CodecError::DuplicateKey {
            key: key.to_string(),
            first: first.clone(),
            second: owner(),
        }),
        None => {
            owners.insert(key.to_string(), owner());
            Ok(())
        }
    }
}

fn write_assignment(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "{key} = \"{}\"", escape_lua(value));
}

/// Write the script and translation files, each replaced atomically.
pub fn write_recorded_media(
    project: &Project,
    script_path: &Path,
    translation_path: &Path,
) -> Result<RecordedMediaExport> {
    let span = info_span!("write_recorded_media", script = %script_path.display());
    let _guard = span.enter();

    let export = export_recorded_media(project)?;
    write_atomic(script_path, export.script.as_bytes())?;
    write_atomic(translation_path, export.translation.as_bytes())?;
    info!(
        entries = export.entries,
        lines = export.lines,
        "wrote recorded media to {} and {}",
        script_path.display(),
        translation_path.display()
    );
    Ok(export)
}

/// Read a translation file back into a key/value map.
///
/// Blank lines and `--` comments are skipped and a trailing comma is allowed.
/// Lines that are not `key = "value"` and repeated keys make the file
/// malformed.
pub fn parse_translation(text: &str) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        let number = index + 1;
        let malformed =
            |reason: &str| CodecError::malformed(format!("translation line {number}: {reason}"));
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| malformed("expected key = \"value\""))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(malformed("empty key"));
        }
        let value = value.trim();
        let value = value.strip_suffix(',').unwrap_or(value).trim_end();
        let inner = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .ok_or_else(|| malformed("value must be double-quoted"))?;
        if values.insert(key.to_string(), unescape_lua(inner)).is_some() {
            return Err(malformed(&format!("duplicate key {key}")));
        }
    }
    Ok(values)
}

/// `text = "..."` references of a script, in order.
pub fn script_line_references(script: &str) -> Vec<String> {
    const NEEDLE: &str = "text = \"";
    let mut references = Vec::new();
    for line in script.lines() {
        let mut rest = line;
        while let Some(start) = rest.find(NEEDLE) {
            let after = &rest[start + NEEDLE.len()..];
            let Some(end) = after.find('"') else {
                break;
            };
            references.push(after[..end].to_string());
            rest = &after[end + 1..];
        }
    }
    references
}

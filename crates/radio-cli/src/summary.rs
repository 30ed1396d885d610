use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use radio_cli::commands::{ExportOutcome, ImportOutcome, MediaOutcome};
use radio_output::{ExportReport, ImportReport, VerifyReport};

pub fn print_export_summary(outcome: &ExportOutcome) {
    println!("Project: {}", outcome.project_path.display());
    println!("RadioData: {}", outcome.output_path.display());
    let report = &outcome.report;
    print_counts(&[
        ("Channels", report.channels),
        ("Schedule entries", report.schedule_entries),
        ("Lines", report.lines),
        ("Colored lines", report.colored_lines),
    ]);
    print_export_issues(report);
}

pub fn print_import_summary(outcome: &ImportOutcome) {
    println!("RadioData: {}", outcome.input_path.display());
    if outcome.saved {
        println!("Project: {}", outcome.project_path.display());
    } else {
        println!("Project: {} (dry run, not saved)", outcome.project_path.display());
    }
    let report = &outcome.report;
    print_counts(&[
        ("Channels created", report.channels_created),
        ("Channels updated", report.channels_updated),
        ("Broadcasts created", report.broadcasts_created),
        ("Lines added", report.lines_added),
        ("Lines updated", report.lines_updated),
    ]);
    print_import_issues(report);
}

pub fn print_verify_summary(report: &VerifyReport) {
    print_counts(&[
        ("Lines checked", report.lines_checked),
        ("Colors checked", report.colors_checked),
        ("Problems", report.issues.len()),
    ]);
    if report.is_clean() {
        println!("Round trip OK");
        return;
    }
    print_issue_table(report.issues.iter().map(ToString::to_string));
}

pub fn print_media_summary(outcome: &MediaOutcome) {
    println!("Script: {}", outcome.script_path.display());
    println!("Translation: {}", outcome.translation_path.display());
    print_counts(&[
        ("Entries", outcome.export.entries),
        ("Lines", outcome.export.lines),
    ]);
}

fn print_export_issues(report: &ExportReport) {
    if report.has_issues() {
        print_issue_table(report.issues.iter().map(ToString::to_string));
    }
}

fn print_import_issues(report: &ImportReport) {
    if !report.issues.is_empty() {
        print_issue_table(report.issues.iter().map(ToString::to_string));
    }
}

fn print_counts(rows: &[(&str, usize)]) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Item"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), count_cell(*count)]);
    }
    println!("{table}");
}

fn print_issue_table(issues: impl Iterator<Item = String>) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("#"), header_cell("Issue")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (index, issue) in issues.enumerate() {
        table.add_row(vec![
            Cell::new(index + 1).fg(Color::DarkGrey),
            Cell::new(issue).fg(Color::Yellow),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::counts::CountRow;
use crate::events::{EventRow, format_timestamp};
use crate::sequences::Sequence;

pub struct ExportReport {
    pub path: PathBuf,
    pub rows: usize,
    pub counts: usize,
}

/// `<dir>/<prefix>_YYYYmmdd_HHMMSS.xlsx`
pub fn default_export_path(dir: &Path, prefix: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{prefix}_{stamp}.xlsx"))
}

pub fn export_events_xlsx(path: &Path, rows: &[&EventRow], counts: &[CountRow]) -> Result<ExportReport> {
    let event_rows = event_sheet_rows(rows);
    let count_rows = count_sheet_rows(counts);
    write_workbook(path, &[("Events", &event_rows), ("Counts", &count_rows)])?;
    Ok(ExportReport {
        path: path.to_path_buf(),
        rows: rows.len(),
        counts: counts.len(),
    })
}

pub fn export_sequences_xlsx(
    path: &Path,
    sequences: &[Sequence<'_>],
    counts: &[CountRow],
) -> Result<ExportReport> {
    let sequence_rows = sequence_sheet_rows(sequences);
    let count_rows = count_sheet_rows(counts);
    write_workbook(
        path,
        &[("Sequences", &sequence_rows), ("Counts", &count_rows)],
    )?;
    Ok(ExportReport {
        path: path.to_path_buf(),
        rows: sequences.len(),
        counts: counts.len(),
    })
}

pub fn event_sheet_rows(rows: &[&EventRow]) -> Vec<Vec<String>> {
    let mut out = vec![vec![
        "Match".to_string(),
        "Type".to_string(),
        "Period".to_string(),
        "Time".to_string(),
        "X".to_string(),
        "Y".to_string(),
        "End X".to_string(),
        "End Y".to_string(),
        "Player ID".to_string(),
        "Player".to_string(),
        "Team ID".to_string(),
        "Team".to_string(),
    ]];
    for row in rows {
        let event = &row.event;
        out.push(vec![
            row.match_id.to_string(),
            event.event_type.to_string(),
            event.period.to_string(),
            format_timestamp(event.timestamp),
            opt_to_string(event.x.map(format_coord)),
            opt_to_string(event.y.map(format_coord)),
            opt_to_string(event.end_x.map(format_coord)),
            opt_to_string(event.end_y.map(format_coord)),
            opt_to_string(event.player_id),
            opt_to_string(row.player_name.as_deref()),
            opt_to_string(event.team_id),
            opt_to_string(row.team_name.as_deref()),
        ]);
    }
    out
}

pub fn sequence_sheet_rows(sequences: &[Sequence<'_>]) -> Vec<Vec<String>> {
    let mut out = vec![vec![
        "Match".to_string(),
        "Period".to_string(),
        "Reception Time".to_string(),
        "Gap (s)".to_string(),
        "Receiver".to_string(),
        "Team".to_string(),
        "Reception X".to_string(),
        "Reception Y".to_string(),
        "Next Pass X".to_string(),
        "Next Pass Y".to_string(),
        "Passer".to_string(),
    ]];
    for sequence in sequences {
        let (rx, ry) = sequence.reception_point();
        let next = sequence.next_pass.point();
        out.push(vec![
            sequence.match_id().to_string(),
            sequence.delivery.event.period.to_string(),
            format_timestamp(sequence.reception_time()),
            format!("{:.1}", sequence.gap().num_milliseconds() as f64 / 1000.0),
            opt_to_string(sequence.receiver_name()),
            opt_to_string(sequence.receiver_team()),
            format_coord(rx),
            format_coord(ry),
            opt_to_string(next.map(|(x, _)| format_coord(x))),
            opt_to_string(next.map(|(_, y)| format_coord(y))),
            opt_to_string(sequence.delivery.player_name.as_deref()),
        ]);
    }
    out
}

pub fn count_sheet_rows(counts: &[CountRow]) -> Vec<Vec<String>> {
    let mut out = vec![vec![
        "Player".to_string(),
        "Team".to_string(),
        "Count".to_string(),
    ]];
    for row in counts {
        out.push(vec![
            row.player_label().to_string(),
            row.team_label().to_string(),
            row.count.to_string(),
        ]);
    }
    out
}

fn write_workbook(path: &Path, sheets: &[(&str, &Vec<Vec<String>>)]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn format_coord(value: f64) -> String {
    format!("{value:.1}")
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

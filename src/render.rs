use crate::error::Result;
use crate::types::{FileDescriptor, Payload};
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color, Table};
use std::io::Write;

#[must_use]
pub fn directory_table(files: &[FileDescriptor]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_HORIZONTAL_ONLY);
    table.set_header(vec!["Name", "Created (UTC)", "Size", "Format", "URL"]);

    for file in files {
        table.add_row(vec![
            Cell::new(file.name()).add_attribute(Attribute::Bold),
            Cell::new(file.date().format("%Y-%m-%d %H:%M")),
            Cell::new(human_bytes::human_bytes(file.size() as f64)).fg(if file.size() == 0 {
                Color::Yellow
            } else {
                Color::White
            }),
            Cell::new(file.format().label()),
            Cell::new(file.url()),
        ]);
    }

    table
}

pub fn print_directory(project: &str, files: &[FileDescriptor]) {
    if files.is_empty() {
        println!("{}", format!("No files found in project {project}.").yellow());
        return;
    }

    println!("{}", format!("=== Files in OSF project {project} ===").cyan());
    println!("{}", directory_table(files));

    let total: u64 = files.iter().map(FileDescriptor::size).sum();
    println!(
        "{} files, {} total",
        files.len().to_string().green(),
        human_bytes::human_bytes(total as f64).green()
    );
}

/// Short human-readable view of a payload: the first `max_rows` rows of a
/// table, or pretty-printed JSON.
pub fn payload_preview(payload: &Payload, max_rows: usize) -> Result<String> {
    match payload {
        Payload::Table(data) => {
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_HORIZONTAL_ONLY);
            table.set_header(&data.headers);
            for row in data.rows.iter().take(max_rows) {
                table.add_row(row);
            }

            let mut out = table.to_string();
            if data.len() > max_rows {
                out.push_str(&format!("\n  ... and {} more rows.", data.len() - max_rows));
            }
            Ok(out)
        }
        Payload::Json(value) => Ok(serde_json::to_string_pretty(value)?),
    }
}

/// Writes a payload back out: tables as CSV, JSON pretty-printed.
pub fn write_payload(payload: &Payload, out: impl Write) -> Result<()> {
    match payload {
        Payload::Table(data) => write_csv(data, out),
        Payload::Json(value) => {
            let mut out = out;
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
            out.flush()?;
            Ok(())
        }
    }
}

#[cfg(feature = "tabular")]
fn write_csv(data: &crate::types::Table, out: impl Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&data.headers)?;
    for row in &data.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(not(feature = "tabular"))]
fn write_csv(_data: &crate::types::Table, _out: impl Write) -> Result<()> {
    Err(crate::error::Error::CapabilityUnavailable {
        capability: "csv",
        hint: "rebuild osf_fetch with the `tabular` feature enabled".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Table as Rows;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn rows(n: usize) -> Payload {
        Payload::Table(Rows {
            headers: vec!["id".to_string(), "rt".to_string()],
            rows: (0..n).map(|i| vec![i.to_string(), "300".to_string()]).collect(),
        })
    }

    #[test]
    fn test_directory_table_lists_every_file() {
        let date = Utc.with_ymd_and_hms(2021, 6, 1, 9, 30, 0).unwrap();
        let files = vec![
            FileDescriptor::new("session_1", date, "https://osf.io/download/a/", 2048),
            FileDescriptor::new("meta.json", date, "https://osf.io/download/b/", 0),
        ];

        let rendered = directory_table(&files).to_string();
        assert!(rendered.contains("session_1"));
        assert!(rendered.contains("meta.json"));
        assert!(rendered.contains("2021-06-01 09:30"));
        assert!(rendered.contains("https://osf.io/download/b/"));
    }

    #[test]
    fn test_preview_truncates_rows() {
        let preview = payload_preview(&rows(12), 10).unwrap();
        assert!(preview.contains("... and 2 more rows."));

        let preview = payload_preview(&rows(3), 10).unwrap();
        assert!(!preview.contains("more rows"));
    }

    #[test]
    fn test_preview_json() {
        let preview = payload_preview(&Payload::Json(json!({"id": 1})), 10).unwrap();
        assert_eq!(preview, "{\n  \"id\": 1\n}");
    }

    #[cfg(feature = "tabular")]
    #[test]
    fn test_write_payload_csv() {
        let mut out = Vec::new();
        write_payload(&rows(2), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,rt\n0,300\n1,300\n");
    }

    #[test]
    fn test_write_payload_json() {
        let mut out = Vec::new();
        write_payload(&Payload::Json(json!([1, 2])), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[\n  1,\n  2\n]\n");
    }
}

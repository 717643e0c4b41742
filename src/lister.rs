use crate::error::{Error, Result};
use crate::remote::{RemoteFile, RemoteStorage};
use crate::types::{DataFormat, DownloadHandle, FileDescriptor};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info};

/// Lists the files in the first storage container of a project.
///
/// With `after_date` (`DD/MM/YYYY`, UTC midnight) only files created strictly
/// after that day are kept. The order is the order the service enumerates them in.
pub fn list_files(
    api: &impl RemoteStorage,
    project_id: &str,
    after_date: Option<&str>,
) -> Result<Vec<FileDescriptor>> {
    let threshold = after_date.map(parse_after_date).transpose()?;

    let project = api.project(project_id)?;
    let mut storages = api.storages(&project)?.into_iter();
    let storage = storages.next().ok_or_else(|| Error::NoStorage {
        project: project.id.clone(),
    })?;
    for ignored in storages {
        debug!(
            "Project {} also exposes storage '{}', ignored",
            project.id, ignored.provider
        );
    }

    let files = api
        .files(&storage)?
        .into_iter()
        .map(describe)
        .collect::<Result<Vec<_>>>()?;
    let total = files.len();

    let files = match threshold {
        Some(threshold) => filter_after(files, threshold),
        None => files,
    };

    info!(
        "Listed {} of {} files in '{}' ({})",
        files.len(),
        total,
        project.title,
        storage.provider
    );
    Ok(files)
}

fn describe(file: RemoteFile) -> Result<FileDescriptor> {
    let date = parse_timestamp(&file.date_created)?;
    let format = DataFormat::from_name(&file.name);
    Ok(FileDescriptor::listed(
        display_name(&file.name),
        date,
        file.size,
        format,
        DownloadHandle::new(file.download_url),
    ))
}

/// Removes the first ".csv" wherever it sits in the name.
#[must_use]
pub fn display_name(name: &str) -> String {
    name.replacen(".csv", "", 1)
}

/// Parses a `DD/MM/YYYY` day into UTC midnight.
pub fn parse_after_date(input: &str) -> Result<DateTime<Utc>> {
    NaiveDate::parse_from_str(input.trim(), "%d/%m/%Y")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| Error::InvalidDate {
            input: input.to_string(),
        })
}

/// Parses a remote creation timestamp. Offsets are honoured; naive
/// timestamps are taken as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|ts| ts.and_utc())
        .map_err(|_| Error::InvalidTimestamp {
            input: input.to_string(),
        })
}

/// Keeps the files created strictly after `threshold`, preserving order.
#[must_use]
pub fn filter_after(files: Vec<FileDescriptor>, threshold: DateTime<Utc>) -> Vec<FileDescriptor> {
    let mask: Vec<bool> = files.iter().map(|f| f.date() > threshold).collect();
    files
        .into_iter()
        .zip(mask)
        .filter_map(|(file, keep)| keep.then_some(file))
        .collect()
}

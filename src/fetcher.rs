use crate::error::{Error, Result};
use crate::remote::RemoteStorage;
use crate::retry::RetryPolicy;
use crate::types::{DataFormat, FileDescriptor, Payload, Table};
use log::{debug, info, warn};
use serde_json::Value;
use std::io::Read;
use std::thread;

/// Downloads listed files and parses them, retrying while the content is empty.
pub struct Fetcher<'a, S: RemoteStorage> {
    api: &'a S,
    policy: RetryPolicy,
}

impl<'a, S: RemoteStorage> Fetcher<'a, S> {
    #[must_use]
    pub fn new(api: &'a S, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Downloads and parses `file` until a non-empty payload comes back.
    ///
    /// Network and parse errors are returned as-is on the attempt that hit
    /// them; only an empty result is retried.
    pub fn fetch(&self, file: &FileDescriptor) -> Result<Payload> {
        let handle = file.handle().ok_or_else(|| Error::MissingHandle {
            name: file.name().to_string(),
        })?;
        check_capability(file.format())?;

        let attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            debug!(
                "Downloading {} as {} (attempt {attempt}/{attempts})",
                file.name(),
                file.format().label()
            );
            let body = self.api.download(handle)?;
            let payload = parse_payload(file.format(), body)?;

            if !payload.is_empty() {
                info!("Fetched {} ({} records)", file.name(), payload.len());
                return Ok(payload);
            }

            warn!(
                "{} came back empty (attempt {attempt}/{attempts})",
                file.name()
            );
            if attempt < attempts {
                let delay = self.policy.delay_for(attempt);
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
        }

        Err(Error::AttemptsExhausted {
            name: file.name().to_string(),
            attempts,
        })
    }
}

/// Parses a download body in the given format.
pub fn parse_payload(format: DataFormat, body: impl Read) -> Result<Payload> {
    match format {
        DataFormat::Json => Ok(Payload::Json(parse_json(body)?)),
        DataFormat::Tabular => Ok(Payload::Table(parse_table(body)?)),
    }
}

// Bare scalars have no record count, so they cannot be checked for emptiness.
fn parse_json(body: impl Read) -> Result<Value> {
    let value: Value = serde_json::from_reader(body)?;
    let kind = match &value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) | Value::Array(_) | Value::Object(_) => return Ok(value),
    };
    Err(Error::NotACollection { kind })
}

#[cfg(feature = "tabular")]
fn check_capability(_format: DataFormat) -> Result<()> {
    Ok(())
}

#[cfg(not(feature = "tabular"))]
fn check_capability(format: DataFormat) -> Result<()> {
    match format {
        DataFormat::Tabular => Err(csv_unavailable()),
        DataFormat::Json => Ok(()),
    }
}

#[cfg(not(feature = "tabular"))]
fn csv_unavailable() -> Error {
    Error::CapabilityUnavailable {
        capability: "csv",
        hint: "rebuild osf_fetch with the `tabular` feature enabled".to_string(),
    }
}

#[cfg(feature = "tabular")]
fn parse_table(body: impl Read) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(body);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(Error::NoColumns);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

#[cfg(not(feature = "tabular"))]
fn parse_table(_body: impl Read) -> Result<Table> {
    Err(csv_unavailable())
}

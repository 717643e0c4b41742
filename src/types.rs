use chrono::{DateTime, Utc};
use serde_json::Value;

/// How a file's bytes are parsed once downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Tabular,
    Json,
}

impl DataFormat {
    /// Derives the format from a remote file name: anything mentioning
    /// ".json" is JSON, everything else is read as CSV.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.contains(".json") {
            Self::Json
        } else {
            Self::Tabular
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Tabular => "csv",
            Self::Json => "json",
        }
    }
}

/// Capability to download one remote file through the storage that listed it.
///
/// Only a listing can issue one, so a descriptor assembled by hand can be
/// displayed and filtered but never fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadHandle {
    url: String,
}

impl DownloadHandle {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    name: String,
    date: DateTime<Utc>,
    url: String,
    size: u64,
    format: DataFormat,
    handle: Option<DownloadHandle>,
}

impl FileDescriptor {
    /// Builds a descriptor without a download handle.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        date: DateTime<Utc>,
        url: impl Into<String>,
        size: u64,
    ) -> Self {
        let name = name.into();
        let format = DataFormat::from_name(&name);
        Self {
            name,
            date,
            url: url.into(),
            size,
            format,
            handle: None,
        }
    }

    pub(crate) fn listed(
        name: String,
        date: DateTime<Utc>,
        size: u64,
        format: DataFormat,
        handle: DownloadHandle,
    ) -> Self {
        Self {
            name,
            date,
            url: handle.url().to_string(),
            size,
            format,
            handle: Some(handle),
        }
    }

    /// Overrides the format derived from the remote name.
    #[must_use]
    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn format(&self) -> DataFormat {
        self.format
    }

    #[must_use]
    pub fn handle(&self) -> Option<&DownloadHandle> {
        self.handle.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column by header name, in row order.
    #[must_use]
    pub fn column(&self, header: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == header)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map_or("", String::as_str))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Table(Table),
    Json(Value),
}

impl Payload {
    /// Number of records: rows for a table, elements or keys for JSON.
    ///
    /// Bare JSON scalars are rejected when a download is parsed; here `null`
    /// counts as 0 and numbers and booleans as 1.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Table(table) => table.len(),
            Self::Json(Value::Array(items)) => items.len(),
            Self::Json(Value::Object(map)) => map.len(),
            Self::Json(Value::String(s)) => s.chars().count(),
            Self::Json(Value::Null) => 0,
            Self::Json(Value::Bool(_) | Value::Number(_)) => 1,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn format(&self) -> DataFormat {
        match self {
            Self::Table(_) => DataFormat::Tabular,
            Self::Json(_) => DataFormat::Json,
        }
    }
}

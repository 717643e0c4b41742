//! Blocking client for the OSF v2 JSON API.

use crate::error::{Error, Result};
use crate::remote::{Project, RemoteFile, RemoteStorage, Storage};
use crate::types::DownloadHandle;
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.osf.io/v2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OsfClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl OsfClient {
    /// Client for the public OSF API. An empty token sends anonymous requests.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_options(token, DEFAULT_API_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_options(token: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::CapabilityUnavailable {
                capability: "https client",
                hint: format!("the TLS backend could not be initialised ({e})"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: (!token.is_empty()).then(|| token.to_string()),
        })
    }

    fn get(&self, url: &str) -> Result<Response> {
        debug!("GET {url}");
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        check_status(response.status(), url)?;
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url)?;
        Ok(serde_json::from_reader(response)?)
    }

    fn fetch_page(&self, url: &str) -> Result<Page> {
        self.get_json(url)
    }
}

impl RemoteStorage for OsfClient {
    fn project(&self, project_id: &str) -> Result<Project> {
        let url = format!("{}/nodes/{}/", self.base_url, project_id);
        let doc: Document<Node> = self.get_json(&url)?;
        Ok(Project {
            id: doc.data.id,
            title: doc.data.attributes.title,
        })
    }

    fn storages(&self, project: &Project) -> Result<Vec<Storage>> {
        let url = format!("{}/nodes/{}/files/", self.base_url, project.id);
        let entries = collect_pages(&|url: &str| self.fetch_page(url), &url)?;
        Ok(entries
            .into_iter()
            .map(|entry| storage_from_entry(entry, &self.base_url, &project.id))
            .collect())
    }

    fn files(&self, storage: &Storage) -> Result<Vec<RemoteFile>> {
        let mut files = Vec::new();
        walk(&|url: &str| self.fetch_page(url), &storage.files_url, &mut files)?;
        Ok(files)
    }

    fn download(&self, handle: &DownloadHandle) -> Result<Box<dyn Read>> {
        Ok(Box::new(self.get(handle.url())?))
    }
}

fn check_status(status: StatusCode, url: &str) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::Status {
            status,
            url: url.to_string(),
        })
    }
}

/// Follows `links.next` until the listing is exhausted.
fn collect_pages<F>(fetch_page: &F, url: &str) -> Result<Vec<Entry>>
where
    F: Fn(&str) -> Result<Page>,
{
    let mut entries = Vec::new();
    let mut next = Some(url.to_string());
    while let Some(url) = next {
        let page = fetch_page(&url)?;
        entries.extend(page.data);
        next = page.links.next;
    }
    Ok(entries)
}

/// Flattens a listing depth-first; a folder's files come where the folder sits.
fn walk<F>(fetch_page: &F, url: &str, out: &mut Vec<RemoteFile>) -> Result<()>
where
    F: Fn(&str) -> Result<Page>,
{
    for entry in collect_pages(fetch_page, url)? {
        if entry.attributes.kind == "folder" {
            if let Some(children) = entry.files_url() {
                walk(fetch_page, children, out)?;
            }
        } else if let Some(file) = entry.into_remote_file() {
            out.push(file);
        }
    }
    Ok(())
}

fn storage_from_entry(entry: Entry, base_url: &str, project_id: &str) -> Storage {
    let provider = entry
        .attributes
        .provider
        .clone()
        .unwrap_or_else(|| entry.attributes.name.clone());
    let files_url = entry.files_url().map_or_else(
        || format!("{base_url}/nodes/{project_id}/files/{provider}/"),
        str::to_string,
    );
    Storage {
        provider,
        files_url,
    }
}

#[derive(Debug, Deserialize)]
struct Document<T> {
    data: T,
    #[serde(default)]
    links: PageLinks,
}

type Page = Document<Vec<Entry>>;

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Node {
    id: String,
    attributes: NodeAttributes,
}

#[derive(Debug, Deserialize)]
struct NodeAttributes {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct Entry {
    attributes: EntryAttributes,
    #[serde(default)]
    links: EntryLinks,
    #[serde(default)]
    relationships: Relationships,
}

#[derive(Debug, Deserialize)]
struct EntryAttributes {
    kind: String,
    name: String,
    provider: Option<String>,
    size: Option<u64>,
    date_created: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EntryLinks {
    download: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Relationships {
    files: Option<Related>,
}

#[derive(Debug, Deserialize)]
struct Related {
    links: RelatedLinks,
}

#[derive(Debug, Deserialize)]
struct RelatedLinks {
    related: Href,
}

#[derive(Debug, Deserialize)]
struct Href {
    href: String,
}

impl Entry {
    fn files_url(&self) -> Option<&str> {
        self.relationships
            .files
            .as_ref()
            .map(|files| files.links.related.href.as_str())
    }

    // Entries without a download link cannot be fetched, so they are skipped.
    fn into_remote_file(self) -> Option<RemoteFile> {
        let download_url = self.links.download?;
        Some(RemoteFile {
            name: self.attributes.name,
            date_created: self.attributes.date_created.unwrap_or_default(),
            size: self.attributes.size.unwrap_or(0),
            download_url,
        })
    }
}

//! List and download data files stored in an OSF project.
//!
//! [`lister::list_files`] enumerates the first storage container of a project
//! into [`FileDescriptor`]s; [`Fetcher`] downloads one of them and parses it
//! as CSV or JSON.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod lister;
pub mod osf;
pub mod remote;
pub mod render;
pub mod retry;
pub mod types;

pub use config::OsfConfig;
pub use error::{Error, Result};
pub use fetcher::Fetcher;
pub use lister::list_files;
pub use osf::OsfClient;
pub use remote::RemoteStorage;
pub use retry::{Backoff, RetryPolicy};
pub use types::{DataFormat, DownloadHandle, FileDescriptor, Payload, Table};

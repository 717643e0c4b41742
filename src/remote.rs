use crate::error::Result;
use crate::types::DownloadHandle;
use std::io::Read;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub title: String,
}

/// A storage container (provider) attached to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storage {
    pub provider: String,
    pub files_url: String,
}

/// File metadata as reported by the remote service, before any cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub date_created: String,
    pub size: u64,
    pub download_url: String,
}

/// Remote file storage a directory can be listed from and downloaded through.
pub trait RemoteStorage {
    fn project(&self, project_id: &str) -> Result<Project>;

    /// Storage containers of a project, in the order the service reports them.
    fn storages(&self, project: &Project) -> Result<Vec<Storage>>;

    /// Every file in a storage container, folders flattened.
    fn files(&self, storage: &Storage) -> Result<Vec<RemoteFile>>;

    /// Opens a streaming download.
    fn download(&self, handle: &DownloadHandle) -> Result<Box<dyn Read>>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::error::Error;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::io::Cursor;

    /// In-memory storage that counts downloads and replays canned bodies.
    #[derive(Default)]
    pub struct FakeStorage {
        pub project: Option<Project>,
        pub storages: Vec<(Storage, Vec<RemoteFile>)>,
        bodies: RefCell<VecDeque<Vec<u8>>>,
        pub downloads: Cell<u32>,
    }

    impl FakeStorage {
        pub fn with_files(files: Vec<RemoteFile>) -> Self {
            Self {
                project: Some(Project {
                    id: "abc12".to_string(),
                    title: "Test project".to_string(),
                }),
                storages: vec![(
                    Storage {
                        provider: "osfstorage".to_string(),
                        files_url: "fake://osfstorage".to_string(),
                    },
                    files,
                )],
                ..Self::default()
            }
        }

        /// Queues download bodies; the last one repeats forever.
        pub fn with_bodies(self, bodies: &[&str]) -> Self {
            *self.bodies.borrow_mut() = bodies.iter().map(|b| b.as_bytes().to_vec()).collect();
            self
        }
    }

    pub fn remote_file(name: &str, date_created: &str) -> RemoteFile {
        RemoteFile {
            name: name.to_string(),
            date_created: date_created.to_string(),
            size: 128,
            download_url: format!("fake://download/{name}"),
        }
    }

    impl RemoteStorage for FakeStorage {
        fn project(&self, project_id: &str) -> Result<Project> {
            match &self.project {
                Some(p) if p.id == project_id => Ok(p.clone()),
                _ => Err(Error::Status {
                    status: reqwest::StatusCode::NOT_FOUND,
                    url: format!("fake://nodes/{project_id}/"),
                }),
            }
        }

        fn storages(&self, _project: &Project) -> Result<Vec<Storage>> {
            Ok(self.storages.iter().map(|(s, _)| s.clone()).collect())
        }

        fn files(&self, storage: &Storage) -> Result<Vec<RemoteFile>> {
            Ok(self
                .storages
                .iter()
                .find(|(s, _)| s == storage)
                .map(|(_, files)| files.clone())
                .unwrap_or_default())
        }

        fn download(&self, _handle: &DownloadHandle) -> Result<Box<dyn Read>> {
            self.downloads.set(self.downloads.get() + 1);
            let mut bodies = self.bodies.borrow_mut();
            let body = if bodies.len() > 1 {
                bodies.pop_front().unwrap_or_default()
            } else {
                bodies.front().cloned().unwrap_or_default()
            };
            Ok(Box::new(Cursor::new(body)))
        }
    }
}

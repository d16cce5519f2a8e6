use std::io;
use std::path::{Path, PathBuf};

use crate::{CredentialSource, Error, Locator, Result};

/// Serves keytabs from a local directory tree.
///
/// The container maps to a directory directly under `root` and the key to a relative path
/// inside it. Keys that try to climb out of the container (`..`) are refused.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Creates a new [FsSource] rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory containers are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, locator: &Locator) -> Result<PathBuf> {
        if locator.container() == ".." || locator.key_segments().any(|segment| segment == "..") {
            return Err(Error::AccessDenied(locator.clone()));
        }

        let mut path = self.root.join(locator.container());
        path.extend(locator.key_segments());

        Ok(path)
    }
}

impl CredentialSource for FsSource {
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()), err)]
    async fn fetch(&self, locator: &Locator) -> Result<Vec<u8>> {
        let path = self.resolve(locator)?;

        tokio::fs::read(&path).await.map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound(locator.clone()),
            io::ErrorKind::PermissionDenied => Error::AccessDenied(locator.clone()),
            _ => Error::Unavailable(format!("failed to read {}: {err}", path.display())),
        })
    }
}

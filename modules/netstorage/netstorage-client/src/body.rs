use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::error::NetStorageError;

/// Where the bytes of an upload come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// Local file, read fully before the request is sent
    Local(PathBuf),
    /// Remote URL, streamed into the upload without buffering
    Remote(String),
}

impl UploadSource {
    /// Create a source from a local file
    pub fn local(path: impl Into<PathBuf>) -> Self {
        UploadSource::Local(path.into())
    }

    /// Create a source from a remote URL
    pub fn remote(url: impl Into<String>) -> Self {
        UploadSource::Remote(url.into())
    }

    /// Check if the source streams from a remote URL
    pub fn is_remote(&self) -> bool {
        matches!(self, UploadSource::Remote(_))
    }

    /// File name the upload would get when targeting a directory.
    pub(crate) fn file_name(&self) -> Option<String> {
        match self {
            UploadSource::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            UploadSource::Remote(url) => Url::parse(url)
                .ok()
                .and_then(|u| {
                    u.path_segments()
                        .and_then(|mut segments| segments.next_back().map(ToOwned::to_owned))
                })
                .filter(|name| !name.is_empty()),
        }
    }

    /// Reject sources that can never produce a body.
    pub(crate) fn validate(&self) -> Result<(), NetStorageError> {
        match self {
            UploadSource::Local(path) if path.as_os_str().is_empty() => Err(
                NetStorageError::Validation("upload source path is empty".into()),
            ),
            UploadSource::Remote(url) if url.trim().is_empty() => Err(
                NetStorageError::Validation("upload source URL is empty".into()),
            ),
            UploadSource::Remote(url) => Url::parse(url).map(|_| ()).map_err(|e| {
                NetStorageError::Validation(format!("invalid upload source URL '{url}': {e}"))
            }),
            UploadSource::Local(_) => Ok(()),
        }
    }
}

impl From<PathBuf> for UploadSource {
    fn from(p: PathBuf) -> Self {
        UploadSource::Local(p)
    }
}

impl From<&Path> for UploadSource {
    fn from(p: &Path) -> Self {
        UploadSource::Local(p.to_path_buf())
    }
}

impl From<Url> for UploadSource {
    fn from(u: Url) -> Self {
        UploadSource::Remote(u.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sources_rejected() {
        assert!(matches!(
            UploadSource::local("").validate(),
            Err(NetStorageError::Validation(_))
        ));
        assert!(matches!(
            UploadSource::remote("  ").validate(),
            Err(NetStorageError::Validation(_))
        ));
        assert!(matches!(
            UploadSource::remote("not a url").validate(),
            Err(NetStorageError::Validation(_))
        ));
    }

    #[test]
    fn test_valid_sources() {
        assert!(UploadSource::local("data/a.bin").validate().is_ok());
        assert!(UploadSource::remote("https://example.com/a.bin").validate().is_ok());
        assert!(UploadSource::remote("https://example.com/a.bin").is_remote());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            UploadSource::local("/tmp/data/a.bin").file_name().as_deref(),
            Some("a.bin")
        );
        assert_eq!(
            UploadSource::remote("https://example.com/files/b.iso?x=1").file_name().as_deref(),
            Some("b.iso")
        );
        assert_eq!(UploadSource::remote("https://example.com/").file_name(), None);
    }
}

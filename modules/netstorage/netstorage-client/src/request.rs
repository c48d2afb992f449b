use std::path::PathBuf;

use http::Method;

use crate::body::UploadSource;
use crate::error::NetStorageError;
use crate::path;

/// Protocol version sent in every action string.
const ACTION_VERSION: u8 = 1;

/// Confirmation token the API requires before a recursive delete.
const QUICK_DELETE_CONFIRMATION: &str = "imreallyreallysure";

/// Operation understood by the NetStorage API.
///
/// Per-action parameters live on the variant, so a download cannot carry an
/// upload source and an upload always has exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Dir,
    List {
        max_entries: Option<u32>,
        end: Option<String>,
    },
    Du,
    Stat,
    Mkdir,
    Rmdir,
    Mtime {
        mtime: i64,
    },
    Delete,
    QuickDelete,
    Rename {
        destination: String,
    },
    Symlink {
        target: String,
    },
    Upload {
        source: UploadSource,
    },
    /// An empty destination writes into the working directory under the
    /// remote file name.
    Download {
        destination: PathBuf,
    },
}

impl Action {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Dir => "dir",
            Action::List { .. } => "list",
            Action::Du => "du",
            Action::Stat => "stat",
            Action::Mkdir => "mkdir",
            Action::Rmdir => "rmdir",
            Action::Mtime { .. } => "mtime",
            Action::Delete => "delete",
            Action::QuickDelete => "quick-delete",
            Action::Rename { .. } => "rename",
            Action::Symlink { .. } => "symlink",
            Action::Upload { .. } => "upload",
            Action::Download { .. } => "download",
        }
    }

    /// HTTP verb the API requires for this action.
    pub fn method(&self) -> Method {
        match self {
            Action::Dir
            | Action::List { .. }
            | Action::Du
            | Action::Stat
            | Action::Download { .. } => Method::GET,
            Action::Upload { .. } => Method::PUT,
            Action::Mkdir
            | Action::Rmdir
            | Action::Mtime { .. }
            | Action::Delete
            | Action::QuickDelete
            | Action::Rename { .. }
            | Action::Symlink { .. } => Method::POST,
        }
    }

    /// Value of the `X-Akamai-ACS-Action` header.
    pub fn acs_action(&self) -> String {
        let params = match self {
            Action::Dir => "dir&format=xml".to_owned(),
            Action::List { max_entries, end } => {
                let mut params = "list&format=xml".to_owned();
                if let Some(max) = max_entries {
                    params.push_str(&format!("&max_entries={max}"));
                }
                if let Some(end) = end {
                    params.push_str(&format!("&end={}", path::encode(end)));
                }
                params
            }
            Action::Du => "du&format=xml".to_owned(),
            Action::Stat => "stat&format=xml".to_owned(),
            Action::Mkdir => "mkdir".to_owned(),
            Action::Rmdir => "rmdir".to_owned(),
            Action::Mtime { mtime } => format!("mtime&format=xml&mtime={mtime}"),
            Action::Delete => "delete".to_owned(),
            Action::QuickDelete => {
                format!("quick-delete&quick-delete={QUICK_DELETE_CONFIRMATION}")
            }
            Action::Rename { destination } => {
                format!("rename&destination={}", path::encode(destination))
            }
            Action::Symlink { target } => format!("symlink&target={}", path::encode(target)),
            Action::Upload { .. } => "upload&upload-type=binary".to_owned(),
            Action::Download { .. } => "download".to_owned(),
        };
        format!("version={ACTION_VERSION}&action={params}")
    }
}

/// A single NetStorage operation on one resource path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    action: Action,
    path: String,
}

impl ActionRequest {
    /// Create a request; `path` is normalized when the request is sent.
    pub fn new(action: Action, path: impl Into<String>) -> Self {
        Self {
            action,
            path: path.into(),
        }
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Path as supplied by the caller.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> Method {
        self.action.method()
    }

    /// Checks that need no network access.
    pub(crate) fn validate(&self) -> Result<(), NetStorageError> {
        match &self.action {
            Action::Download { .. } if self.path.ends_with('/') => {
                Err(NetStorageError::Validation(format!(
                    "NetStorage path should be a file, not a directory: '{}'",
                    self.path
                )))
            }
            Action::Upload { source } => source.validate(),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acs_action_strings() {
        assert_eq!(Action::Dir.acs_action(), "version=1&action=dir&format=xml");
        assert_eq!(Action::Stat.acs_action(), "version=1&action=stat&format=xml");
        assert_eq!(
            Action::Mtime { mtime: 1_700_000_000 }.acs_action(),
            "version=1&action=mtime&format=xml&mtime=1700000000"
        );
        assert_eq!(
            Action::QuickDelete.acs_action(),
            "version=1&action=quick-delete&quick-delete=imreallyreallysure"
        );
        assert_eq!(
            Action::Upload {
                source: UploadSource::local("a.bin")
            }
            .acs_action(),
            "version=1&action=upload&upload-type=binary"
        );
        assert_eq!(
            Action::Download {
                destination: PathBuf::new()
            }
            .acs_action(),
            "version=1&action=download"
        );
    }

    #[test]
    fn test_acs_action_escapes_targets() {
        assert_eq!(
            Action::Rename {
                destination: "/dir/new name.txt".into()
            }
            .acs_action(),
            "version=1&action=rename&destination=/dir/new%20name.txt"
        );
        assert_eq!(
            Action::Symlink {
                target: "/dir/a&b".into()
            }
            .acs_action(),
            "version=1&action=symlink&target=/dir/a%26b"
        );
    }

    #[test]
    fn test_list_parameters() {
        let action = Action::List {
            max_entries: Some(100),
            end: Some("/dir/z".into()),
        };
        assert_eq!(
            action.acs_action(),
            "version=1&action=list&format=xml&max_entries=100&end=/dir/z"
        );
        let bare = Action::List {
            max_entries: None,
            end: None,
        };
        assert_eq!(bare.acs_action(), "version=1&action=list&format=xml");
    }

    #[test]
    fn test_methods() {
        assert_eq!(Action::Stat.method(), Method::GET);
        assert_eq!(Action::Delete.method(), Method::POST);
        assert_eq!(
            Action::Upload {
                source: UploadSource::local("a")
            }
            .method(),
            Method::PUT
        );
    }

    #[test]
    fn test_download_of_directory_rejected() {
        let request = ActionRequest::new(
            Action::Download {
                destination: PathBuf::new(),
            },
            "/dir/",
        );
        assert!(matches!(
            request.validate(),
            Err(NetStorageError::Validation(_))
        ));

        let request = ActionRequest::new(
            Action::Download {
                destination: PathBuf::new(),
            },
            "/dir/file.txt",
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_upload_requires_non_empty_source() {
        let request = ActionRequest::new(
            Action::Upload {
                source: UploadSource::local(""),
            },
            "/dir/file.txt",
        );
        assert!(request.validate().is_err());
    }
}

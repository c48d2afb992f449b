//! NetStorage Client
//!
//! Signed request client for the NetStorage object-storage API. Every call
//! turns one file operation into a signed HTTP request and resolves exactly
//! once, with either an [`ActionOutcome`] or a [`NetStorageError`].
//!
//! Requests are dispatched with one of three strategies:
//!
//! - uploads from a URL stream the remote body straight into the upload;
//! - downloads buffer the body and write it to a local file;
//! - every other action buffers the body and decodes it into a JSON tree.
//!
//! # Examples
//!
//! ```no_run
//! use netstorage_client::{NetStorageClient, NetStorageConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NetStorageConfig::new(
//!     "example-nsu.akamaihd.net",
//!     "upload-user",
//!     "upload-key",
//!     true,
//! );
//! let client = NetStorageClient::from_config(config)?;
//!
//! let listing = client.dir("/123456/assets").await?;
//! println!("{:?}", listing.payload().as_value());
//!
//! client.upload("build/app.js", "/123456/assets/").await?;
//! client.download("/123456/assets/app.js", "").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Signing and payload decoding sit behind the [`Signer`] and
//! [`PayloadDecoder`] traits and can be replaced through
//! [`NetStorageClient::builder`].

mod auth;
mod body;
mod client;
mod decoder;
mod dispatcher;
mod error;
mod path;
mod request;
mod response;

// Re-export public API
pub use auth::{NetStorageSigner, SignError, SignedHeaders, Signer};
pub use body::UploadSource;
pub use client::{NetStorageClient, NetStorageClientBuilder, NetStorageConfig};
pub use decoder::{DecodeError, PayloadDecoder, XmlPayloadDecoder};
pub use dispatcher::USER_AGENT_VALUE;
pub use error::NetStorageError;
pub use path::normalize;
pub use request::{Action, ActionRequest};
pub use response::{ActionOutcome, DOWNLOAD_DONE, Payload, REQUEST_PROCESSED, ResponseMeta};

// Re-export commonly used types from dependencies
pub use http::{Method, StatusCode};
pub use secrecy::SecretString;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use http::header::{ACCEPT_ENCODING, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tracing::{debug, warn};

use crate::auth::{SignedHeaders, Signer};
use crate::body::UploadSource;
use crate::decoder::PayloadDecoder;
use crate::error::NetStorageError;
use crate::path;
use crate::request::{Action, ActionRequest};
use crate::response::{ActionOutcome, DOWNLOAD_DONE, Payload, REQUEST_PROCESSED, ResponseMeta};

pub(crate) const ACS_ACTION_HEADER: &str = "x-akamai-acs-action";
pub(crate) const ACS_AUTH_DATA_HEADER: &str = "x-akamai-acs-auth-data";
pub(crate) const ACS_AUTH_SIGN_HEADER: &str = "x-akamai-acs-auth-sign";

/// Fixed client identifier sent as `User-Agent`.
pub const USER_AGENT_VALUE: &str = "NetStorageKit-Rust";

/// Signs requests and runs them with the strategy their action calls for.
pub(crate) struct Dispatcher {
    http_client: reqwest::Client,
    hostname: String,
    ssl: bool,
    signer: Arc<dyn Signer>,
    decoder: Arc<dyn PayloadDecoder>,
}

impl Dispatcher {
    pub(crate) fn new(
        http_client: reqwest::Client,
        hostname: String,
        ssl: bool,
        signer: Arc<dyn Signer>,
        decoder: Arc<dyn PayloadDecoder>,
    ) -> Self {
        Self {
            http_client,
            hostname,
            ssl,
            signer,
            decoder,
        }
    }

    pub(crate) fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = signer;
        self
    }

    pub(crate) fn with_decoder(mut self, decoder: Arc<dyn PayloadDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Execute one action and resolve it exactly once.
    #[tracing::instrument(
        name = "netstorage.execute",
        skip_all,
        fields(action = request.action().name(), path = %request.path())
    )]
    pub(crate) async fn execute(
        &self,
        request: ActionRequest,
    ) -> Result<ActionOutcome, NetStorageError> {
        if let Err(err) = request.validate() {
            warn!(error = %err, "rejected before sending");
            return Err(err);
        }

        let canonical_path = path::normalize(request.path());
        let signed = self
            .signer
            .sign(&canonical_path, &request.action().acs_action())?;
        let headers = signed_header_map(&signed)?;
        let url = self.url_for(&canonical_path);

        match request.action() {
            Action::Upload {
                source: UploadSource::Remote(source_url),
            } => {
                debug!(source = %source_url, "streaming remote source into upload");
                self.stream_remote_upload(source_url, &url, headers).await
            }
            _ => self.buffered(&request, &url, headers).await,
        }
    }

    fn url_for(&self, canonical_path: &str) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{scheme}://{}{canonical_path}", self.hostname)
    }

    /// Pipe a remote GET straight into the upload body.
    async fn stream_remote_upload(
        &self,
        source_url: &str,
        target_url: &str,
        headers: HeaderMap,
    ) -> Result<ActionOutcome, NetStorageError> {
        let source = self
            .http_client
            .get(source_url)
            .send()
            .await
            .map_err(NetStorageError::from_transport)?;

        // Whatever the source answers is piped through; only the target's
        // status decides the outcome.
        debug!(status = %source.status(), "remote source responded");

        let stream = source
            .bytes_stream()
            .inspect_err(|e| warn!(error = %e, "remote source stream failed"));

        let resp = self
            .http_client
            .post(target_url)
            .headers(headers)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await
            .map_err(NetStorageError::from_transport)?;

        let status = resp.status();
        debug!(%status, "streamed upload finished");
        if status != StatusCode::OK {
            return Err(NetStorageError::RemoteStatus { status });
        }

        let meta = ResponseMeta::new(status, resp.headers().clone());
        Ok(ActionOutcome::new(meta, Payload::message(REQUEST_PROCESSED)))
    }

    /// Send the request, buffer the whole response and classify it.
    async fn buffered(
        &self,
        request: &ActionRequest,
        url: &str,
        headers: HeaderMap,
    ) -> Result<ActionOutcome, NetStorageError> {
        let mut req_builder = self
            .http_client
            .request(request.method(), url)
            .headers(headers);

        // The file is read before the request exists, so a read failure is
        // the only outcome and nothing is left in flight.
        if let Action::Upload {
            source: UploadSource::Local(source_path),
        } = request.action()
        {
            let contents = tokio::fs::read(source_path)
                .await
                .map_err(|e| NetStorageError::local_io(source_path, e))?;
            debug!(bytes = contents.len(), "read local upload source");
            req_builder = req_builder.body(contents);
        }

        let resp = req_builder
            .send()
            .await
            .map_err(NetStorageError::from_transport)?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(NetStorageError::from_transport)?;
        debug!(%status, bytes = body.len(), "response buffered");

        self.classify(request, ResponseMeta::new(status, headers), body)
            .await
    }

    async fn classify(
        &self,
        request: &ActionRequest,
        meta: ResponseMeta,
        body: Bytes,
    ) -> Result<ActionOutcome, NetStorageError> {
        match request.action() {
            Action::Download { destination } => {
                // The body is written whatever the status; callers read it
                // from the outcome metadata.
                if !meta.status().is_success() {
                    warn!(status = %meta.status(), "download answered with non-success status");
                }
                let target = resolve_destination(request.path(), destination).await?;
                tokio::fs::write(&target, &body)
                    .await
                    .map_err(|e| NetStorageError::local_io(&target, e))?;
                debug!(target = %target.display(), "download written");
                Ok(ActionOutcome::new(meta, Payload::message(DOWNLOAD_DONE)))
            }
            Action::Upload { .. } if body.is_empty() && meta.status() == StatusCode::OK => Ok(
                ActionOutcome::new(meta, Payload::message(REQUEST_PROCESSED)),
            ),
            _ => {
                let value = self.decoder.decode(&body)?;
                Ok(ActionOutcome::new(meta, Payload::Decoded(value)))
            }
        }
    }
}

fn signed_header_map(signed: &SignedHeaders) -> Result<HeaderMap, NetStorageError> {
    let mut headers = HeaderMap::new();
    for (name, value) in [
        (ACS_ACTION_HEADER, &signed.acs_action),
        (ACS_AUTH_DATA_HEADER, &signed.auth_data),
        (ACS_AUTH_SIGN_HEADER, &signed.auth_sign),
    ] {
        let value = HeaderValue::from_str(value)
            .map_err(|e| NetStorageError::BuildError(format!("Invalid header value: {e}")))?;
        headers.insert(HeaderName::from_static(name), value);
    }
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    Ok(headers)
}

/// Local file a download of `remote_path` is written to.
///
/// An empty destination means the remote file name in the working directory,
/// an existing directory gets the remote file name appended, and anything
/// else (including a path that does not exist yet) is used as given.
pub(crate) async fn resolve_destination(
    remote_path: &str,
    destination: &Path,
) -> Result<PathBuf, NetStorageError> {
    let file_name = path::basename(remote_path);
    if destination.as_os_str().is_empty() {
        return Ok(PathBuf::from(file_name));
    }

    match tokio::fs::metadata(destination).await {
        Ok(meta) if meta.is_dir() => Ok(destination.join(file_name)),
        Ok(_) => Ok(destination.to_path_buf()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(destination.to_path_buf()),
        Err(e) => Err(NetStorageError::local_io(destination, e)),
    }
}

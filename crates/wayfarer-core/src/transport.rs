//! HTTP transport
//!
//! This layer owns wire details only: URL resolution, bearer header,
//! JSON/multipart bodies, and turning a response into bytes plus a status.
//! Token selection and 401 recovery live in [`crate::auth`].

use std::future::Future;

use bytes::Bytes;
use reqwest::Client;
use url::form_urlencoded;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::TokenKind;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::{decode_envelope, Ack, Envelope};
use crate::validation::ValidationErrors;

/// HTTP verbs used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One part of a multipart upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadPart {
    /// Plain form field
    Field { name: String, value: String },
    /// File attachment
    File {
        name: String,
        file_name: String,
        mime: String,
        bytes: Bytes,
    },
}

/// Multipart form body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadPayload {
    parts: Vec<UploadPart>,
}

impl UploadPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(UploadPart::Field {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, mime: &str, bytes: impl Into<Bytes>) -> Self {
        self.parts.push(UploadPart::File {
            name: name.to_string(),
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            bytes: bytes.into(),
        });
        self
    }

    pub fn parts(&self) -> &[UploadPart] {
        &self.parts
    }

    /// Value of the first text field called `name`
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            UploadPart::Field { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// All file parts, in insertion order
    pub fn files(&self) -> impl Iterator<Item = &UploadPart> {
        self.parts
            .iter()
            .filter(|p| matches!(p, UploadPart::File { .. }))
    }

    fn into_form(self) -> ClientResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part {
                UploadPart::Field { name, value } => form.text(name, value),
                UploadPart::File {
                    name,
                    file_name,
                    mime,
                    bytes,
                } => {
                    let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                        .file_name(file_name)
                        .mime_str(&mime)
                        .map_err(|e| ClientError::Serialization(format!("bad MIME type: {}", e)))?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

/// Request body variants
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(UploadPayload),
}

/// Percent-encode a caller-supplied ID for use as one path segment.
///
/// `/`, `?`, `#` and `%` cannot escape the segment. Empty and dot-only IDs
/// are rejected since URL resolution would collapse them.
pub fn id_segment(id: &str) -> ClientResult<String> {
    if id.is_empty() || id.chars().all(|c| c == '.') {
        let mut errors = ValidationErrors::new();
        errors.add("id", format!("'{}' is not a valid identifier", id));
        return Err(ClientError::Validation(errors));
    }
    // form encoding turns spaces into '+', which a path would keep literally
    Ok(form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20"))
}

/// A request against the API, independent of any HTTP library
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Token category used for the bearer header; `None` for public endpoints
    pub auth: Option<TokenKind>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            auth: Some(TokenKind::Access),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> ClientResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, payload: UploadPayload) -> Self {
        self.body = RequestBody::Multipart(payload);
        self
    }

    /// Authorize with a specific token category
    pub fn with_token(mut self, kind: TokenKind) -> Self {
        self.auth = Some(kind);
        self
    }

    /// Send without an Authorization header
    pub fn public(mut self) -> Self {
        self.auth = None;
        self
    }
}

/// Status and raw body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// JSON response helper
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, serde_json::to_vec(value).unwrap_or_default())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Convert a non-2xx response into `ClientError::Api`, keeping the
    /// server's `message` when the body has a non-blank one.
    pub fn error_for_status(self) -> ClientResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = serde_json::from_slice::<Ack>(&self.body)
            .ok()
            .and_then(|ack| ack.message)
            .filter(|m| !m.trim().is_empty());
        Err(ClientError::Api {
            status: self.status,
            message,
        })
    }

    /// Decode the envelope after checking the status
    pub fn envelope<T: DeserializeOwned>(self) -> ClientResult<Envelope<T>> {
        let ok = self.error_for_status()?;
        decode_envelope(&ok.body)
    }

    /// Decode `data.attributes` after checking the status
    pub fn attributes<T: DeserializeOwned>(self) -> ClientResult<T> {
        self.envelope()?.into_attributes()
    }

    /// Check the status and return the server message, if any
    pub fn ack(self) -> ClientResult<Option<String>> {
        let ok = self.error_for_status()?;
        Ok(serde_json::from_slice::<Ack>(&ok.body)
            .ok()
            .and_then(|a| a.message))
    }
}

/// Something that can put an [`ApiRequest`] on the wire.
///
/// `bearer` is the token the pipeline selected for this attempt.
pub trait HttpTransport: Send + Sync {
    fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> impl Future<Output = ClientResult<ApiResponse>> + Send;
}

/// reqwest-backed transport resolving paths through [`ClientConfig::endpoint`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    /// Build a transport with the config's base URL and request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Network` when the reqwest client cannot be constructed.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("wayfarer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> ClientResult<ApiResponse> {
        let url = self.config.endpoint(&request.path)?;
        debug!(method = request.method.as_str(), %url, "Dispatching request");

        let mut builder = self
            .client
            .request(request.method.into(), url)
            .header(reqwest::header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(payload) => builder.multipart(payload.clone().into_form()?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(status, bytes = body.len(), "Response received");
        Ok(ApiResponse { status, body })
    }
}

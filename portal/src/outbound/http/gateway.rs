//! Reqwest-backed gateway shared by every API adapter.
//!
//! The gateway owns transport details only: URL building, bearer headers,
//! the single refresh-and-retry on HTTP 401, status mapping and envelope
//! tolerant JSON decoding.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::dto::{ErrorBodyDto, RefreshRequestDto};
use crate::domain::ports::{GatewayError, SessionStore};
use crate::domain::{AuthGrant, ClearReason, DocumentType, DocumentUpload, Token};

const JSON: &str = "application/json";

/// Request body that can be rebuilt for the retry after a token refresh.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// Encoded JSON document.
    Json(Value),
    /// One file plus its `documentType` field.
    Multipart {
        /// Tag sent as the `documentType` part.
        document_type: DocumentType,
        /// File sent as the `file` part.
        file: DocumentUpload,
    },
}

impl RequestBody {
    fn apply(&self, builder: RequestBuilder) -> Result<RequestBuilder, GatewayError> {
        match self {
            Self::Empty => Ok(builder),
            Self::Json(body) => Ok(builder.json(body)),
            Self::Multipart {
                document_type,
                file,
            } => {
                let part = Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.content_type)
                    .map_err(|err| {
                        GatewayError::rejected(
                            StatusCode::BAD_REQUEST.as_u16(),
                            format!("invalid content type {}: {err}", file.content_type),
                        )
                    })?;
                let form = Form::new()
                    .part("file", part)
                    .text("documentType", document_type.as_str());
                Ok(builder.multipart(form))
            }
        }
    }
}

/// One logical API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: RequestBody,
    accept: &'static str,
    authenticated: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            accept: JSON,
            authenticated: true,
        }
    }

    /// `GET` of `path`, relative to the API base.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` to `path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` to `path`.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH` of `path`.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE` of `path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query pairs.
    #[must_use]
    pub fn query(mut self, pairs: Vec<(&'static str, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a decode error when `body` cannot be encoded as JSON.
    pub fn json(mut self, body: &impl Serialize) -> Result<Self, GatewayError> {
        let encoded = serde_json::to_value(body)
            .map_err(|err| GatewayError::decode(format!("request body: {err}")))?;
        self.body = RequestBody::Json(encoded);
        Ok(self)
    }

    /// Attach a document as `multipart/form-data`.
    #[must_use]
    pub fn multipart(mut self, document_type: DocumentType, file: &DocumentUpload) -> Self {
        self.body = RequestBody::Multipart {
            document_type,
            file: file.clone(),
        };
        self
    }

    /// Expected response media type.
    #[must_use]
    pub const fn accept(mut self, media_type: &'static str) -> Self {
        self.accept = media_type;
        self
    }

    /// Send without a bearer token and never refresh.
    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

struct RawResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl RawResponse {
    fn into_result(self) -> Result<Vec<u8>, GatewayError> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            Err(map_status_error(self.status, &self.body))
        }
    }
}

/// Authenticated HTTP client for the loan backend.
pub struct GatewayClient {
    client: Client,
    base: Url,
    sessions: Arc<dyn SessionStore>,
    /// Held while a refresh is in flight; concurrent 401s queue behind it.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl GatewayClient {
    /// Build a gateway rooted at `base` with a fixed request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base: Url,
        timeout: Duration,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: with_trailing_slash(base),
            sessions,
            refresh_gate: tokio::sync::Mutex::new(()),
        })
    }

    /// Session store the gateway reads tokens from.
    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| GatewayError::transport(format!("invalid endpoint {path}: {err}")))
    }

    /// Send `request` and decode its JSON body, unwrapping `{ "data": … }`.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::send`]; additionally returns a decode error for
    /// bodies of the wrong shape.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, GatewayError> {
        let body = self.send(request).await?;
        decode(&body)
    }

    /// Send `request` and return the raw body of a successful response.
    ///
    /// Authenticated requests carry the stored access token. On the first
    /// 401 the refresh token is exchanged once and the request retried once.
    /// Requests rejected together share a single refresh.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionExpired`] after clearing the session
    /// when the refresh fails or the retry is rejected again. Other failures
    /// map from the transport or the response status.
    pub async fn send(&self, request: &ApiRequest) -> Result<Vec<u8>, GatewayError> {
        if !request.authenticated {
            return self.dispatch(request, None).await?.into_result();
        }

        let token = self.sessions.load().map(|session| session.access_token);
        let first = self.dispatch(request, token.as_ref()).await?;
        if first.status != StatusCode::UNAUTHORIZED {
            return first.into_result();
        }

        info!(path = %request.path, "access token rejected; refreshing");
        let access = self.renewed_access_token(token.as_ref()).await?;
        let retried = self.dispatch(request, Some(&access)).await?;
        if retried.status == StatusCode::UNAUTHORIZED {
            warn!(path = %request.path, "refreshed token rejected; ending session");
            return Err(self.expire());
        }
        retried.into_result()
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&Token>,
    ) -> Result<RawResponse, GatewayError> {
        let url = self.endpoint(&request.path)?;
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(ACCEPT, request.accept);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token.filter(|token| !token.is_blank()) {
            builder = builder.bearer_auth(token.expose());
        }
        builder = request.body.apply(builder)?;

        debug!(method = %request.method, path = %request.path, "sending request");
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            bytes = body.len(),
            "response received"
        );
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }

    /// Token to retry with after `rejected` was refused.
    async fn renewed_access_token(&self, rejected: Option<&Token>) -> Result<Token, GatewayError> {
        let _gate = self.refresh_gate.lock().await;
        match self.sessions.load().map(|session| session.access_token) {
            Some(current) if !current.is_blank() && rejected != Some(&current) => {
                debug!("access token already renewed by a concurrent request");
                Ok(current)
            }
            None if rejected.is_some() => {
                debug!("session ended by a concurrent request");
                Err(GatewayError::session_expired())
            }
            _ => self.refresh_access_token().await,
        }
    }

    async fn refresh_access_token(&self) -> Result<Token, GatewayError> {
        let Some(session) = self
            .sessions
            .load()
            .filter(|session| !session.refresh_token.is_blank())
        else {
            warn!("no refresh token stored; ending session");
            return Err(self.expire());
        };

        let body = RefreshRequestDto {
            refresh_token: session.refresh_token.expose(),
        };
        let request = ApiRequest::post("auth/refresh-token").anonymous().json(&body)?;
        let grant = match self.dispatch(&request, None).await {
            Ok(response) => response
                .into_result()
                .and_then(|bytes| decode::<AuthGrant>(&bytes)),
            Err(err) => Err(err),
        };
        let grant = match grant {
            Ok(grant) => grant,
            Err(err) => {
                warn!(error = %err, "token refresh failed; ending session");
                return Err(self.expire());
            }
        };

        let mut rotated = session.with_tokens(grant.access_token, grant.refresh_token);
        if let Some(user) = grant.user {
            rotated.user = user;
        }
        if let Err(err) = self.sessions.save(&rotated) {
            warn!(error = %err, "could not persist refreshed tokens");
        }
        info!("access token refreshed");
        Ok(rotated.access_token)
    }

    fn expire(&self) -> GatewayError {
        if let Err(err) = self.sessions.clear(ClearReason::Expired) {
            warn!(error = %err, "could not clear expired session");
        }
        GatewayError::session_expired()
    }
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Keys that may sit beside `data` in a response envelope.
const ENVELOPE_KEYS: [&str; 4] = ["data", "message", "success", "timestamp"];

/// Decode a JSON body that may be bare or wrapped as `{ "data": … }`.
pub(super) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| GatewayError::decode(format!("invalid JSON payload: {err}")))?;
    serde_json::from_value(unwrap_envelope(value))
        .map_err(|err| GatewayError::decode(err.to_string()))
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut fields)
            if fields.contains_key("data")
                && fields.keys().all(|key| ENVELOPE_KEYS.contains(&key.as_str())) =>
        {
            fields.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::timeout(error.to_string())
    } else {
        GatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GatewayError {
    let message = error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED => GatewayError::unauthorized(message),
        StatusCode::FORBIDDEN => GatewayError::forbidden(message),
        StatusCode::NOT_FOUND => GatewayError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            GatewayError::timeout(message)
        }
        _ if status.is_client_error() => GatewayError::rejected(status.as_u16(), message),
        _ => GatewayError::server(status.as_u16(), message),
    }
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    let from_body = serde_json::from_slice::<ErrorBodyDto>(body)
        .ok()
        .and_then(ErrorBodyDto::into_message);
    if let Some(message) = from_body {
        return message;
    }
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        preview
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network gateway helpers.

    use super::*;
    use crate::domain::ports::InMemorySessionStore;
    use rstest::rstest;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        id: u8,
    }

    #[rstest]
    #[case::bare(br#"{"id":7}"#.as_slice())]
    #[case::wrapped(br#"{"data":{"id":7}}"#.as_slice())]
    #[case::wrapped_with_message(br#"{"success":true,"message":"ok","data":{"id":7}}"#.as_slice())]
    fn decodes_bare_and_enveloped_bodies(#[case] body: &[u8]) {
        assert_eq!(decode::<Sample>(body).expect("decodes"), Sample { id: 7 });
    }

    #[rstest]
    fn object_with_foreign_keys_is_not_treated_as_envelope() {
        let value = serde_json::json!({ "data": 1, "id": 2 });
        assert_eq!(unwrap_envelope(value.clone()), value);
    }

    #[rstest]
    fn malformed_body_is_a_decode_error() {
        let err = decode::<Sample>(b"<html>").expect_err("not JSON");
        assert!(matches!(err, GatewayError::Decode { .. }));
    }

    #[rstest]
    #[case::message(
        br#"{"message":"Loan amount too high","error":"Bad Request"}"#.as_slice(),
        "Loan amount too high"
    )]
    #[case::error_field(br#"{"error":"Bad Request"}"#.as_slice(), "Bad Request")]
    #[case::blank_message(br#"{"message":"  ","error":"Bad Request"}"#.as_slice(), "Bad Request")]
    #[case::plain_text(b"  upstream\n  exploded ".as_slice(), "upstream exploded")]
    #[case::empty(b"".as_slice(), "status 400")]
    fn error_message_prefers_body_fields(#[case] body: &[u8], #[case] expected: &str) {
        assert_eq!(error_message(StatusCode::BAD_REQUEST, body), expected);
    }

    #[rstest]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(200);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }

    #[rstest]
    #[case(StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case(StatusCode::FORBIDDEN, "Forbidden")]
    #[case(StatusCode::NOT_FOUND, "NotFound")]
    #[case(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case(StatusCode::CONFLICT, "Rejected")]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, "Server")]
    fn maps_statuses(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, br#"{"message":"nope"}"#);
        let matched = match expected {
            "Unauthorized" => matches!(error, GatewayError::Unauthorized { .. }),
            "Forbidden" => matches!(error, GatewayError::Forbidden { .. }),
            "NotFound" => matches!(error, GatewayError::NotFound { .. }),
            "Timeout" => matches!(error, GatewayError::Timeout { .. }),
            "Rejected" => matches!(error, GatewayError::Rejected { status: 409, .. }),
            "Server" => matches!(error, GatewayError::Server { status: 500, .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} mapped to {error:?}");
        assert!(error.to_string().contains("nope"));
    }

    #[rstest]
    #[case(
        "http://localhost:8080/api",
        "applications/draft",
        "http://localhost:8080/api/applications/draft"
    )]
    #[case(
        "http://localhost:8080/api/",
        "/auth/login",
        "http://localhost:8080/api/auth/login"
    )]
    #[case(
        "https://loans.example.com",
        "auth/users/me",
        "https://loans.example.com/auth/users/me"
    )]
    fn endpoints_are_joined_under_base(
        #[case] base: &str,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        let gateway = GatewayClient::new(
            Url::parse(base).expect("valid base"),
            Duration::from_secs(5),
            Arc::new(InMemorySessionStore::new()),
        )
        .expect("client builds");
        assert_eq!(gateway.endpoint(path).expect("joins").as_str(), expected);
    }
}

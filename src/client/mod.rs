//! WhatsApp client implementation.
//!
//! Owns the session lifecycle (`start`/`restart`/`close`), the generic
//! request pipeline, and the convenience operations over the messaging and
//! media endpoints.

use crate::config::WhatsappConfig;
use crate::errors::{
    ConfigurationError, ErrorResponse, TransportError, WhatsappError, WhatsappResult,
};
use crate::routes::{PathValue, Route};
use crate::types::{MediaUpload, ResponseBody};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::Method;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A structured request payload.
///
/// The API expects form-encoded flat maps on some endpoints and JSON bodies
/// on others; the shape of the value decides which encoding is used.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Flat key/value mapping, form-encoded on the wire.
    Form(Vec<(String, String)>),
    /// Arbitrary JSON document, sent as compact ASCII-escaped JSON text.
    Json(Value),
}

impl Payload {
    /// Classifies a JSON value: an object whose values are all scalars
    /// becomes [`Payload::Form`], anything else [`Payload::Json`].
    pub fn from_value(value: Value) -> Self {
        match flat_fields(&value) {
            Some(fields) => Payload::Form(fields),
            None => Payload::Json(value),
        }
    }

    fn into_form_fields(self) -> WhatsappResult<Vec<(String, String)>> {
        match self {
            Payload::Form(fields) => Ok(fields),
            Payload::Json(value) => flat_fields(&value).ok_or_else(|| {
                ConfigurationError::InvalidConfiguration {
                    message: "a request with an attachment requires a flat payload".to_string(),
                }
                .into()
            }),
        }
    }
}

/// Returns the form fields for a flat JSON object, or `None` when the value
/// is not an object or holds nested containers or nulls.
fn flat_fields(value: &Value) -> Option<Vec<(String, String)>> {
    let map = value.as_object()?;
    let mut fields = Vec::with_capacity(map.len());
    for (key, value) in map {
        let text = match value {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => return None,
        };
        fields.push((key.clone(), text));
    }
    Some(fields)
}

/// Serializes a JSON value compactly with non-ASCII characters `\u`-escaped.
fn encode_compact_ascii(value: &Value) -> String {
    let compact = value.to_string();
    let mut out = String::with_capacity(compact.len());
    for c in compact.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

/// Per-request options for [`WhatsappClient::request`].
///
/// At most one file attachment is supported per request, enforced here at
/// the type level.
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// Structured payload, if any.
    pub payload: Option<Payload>,
    /// File attachment, if any.
    pub file: Option<MediaUpload>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a payload classified from a JSON value.
    pub fn json(mut self, value: Value) -> Self {
        self.payload = Some(Payload::from_value(value));
        self
    }

    /// Sets an explicit payload.
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attaches a file.
    pub fn file(mut self, upload: MediaUpload) -> Self {
        self.file = Some(upload);
        self
    }
}

/// Client for the WhatsApp Business Cloud API.
///
/// Lifecycle: `Unstarted -> Started -> Closed`. [`start`](Self::start)
/// validates the supplied credentials with one read-only call before
/// committing them; [`close`](Self::close) releases the session but
/// intentionally leaves the credential fields set, so a subsequent call
/// fails with [`WhatsappError::NotStarted`] until
/// [`restart`](Self::restart).
pub struct WhatsappClient {
    config: Arc<WhatsappConfig>,
    session: Option<Client>,
    phone_id: Option<String>,
    token: Option<SecretString>,
    user_agent: String,
}

impl WhatsappClient {
    /// Creates an unstarted client with the given configuration.
    pub fn new(config: WhatsappConfig) -> Self {
        let user_agent = format!(
            "WhatsappBot ({}, {})",
            env!("CARGO_PKG_REPOSITORY"),
            env!("CARGO_PKG_VERSION")
        );

        Self {
            config: Arc::new(config),
            session: None,
            phone_id: None,
            token: None,
            user_agent,
        }
    }

    /// Creates an unstarted client configured from environment variables.
    pub fn from_env() -> WhatsappResult<Self> {
        Ok(Self::new(WhatsappConfig::from_env()?))
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &WhatsappConfig {
        &self.config
    }

    /// The committed phone id, if credentials have been accepted.
    pub fn phone_id(&self) -> Option<&str> {
        self.phone_id.as_deref()
    }

    /// True while a session is open.
    pub fn is_started(&self) -> bool {
        self.session.is_some()
    }

    /// Opens a session and validates the supplied credentials.
    ///
    /// The new credentials are staged, then checked with one
    /// [`fetch_business_profile`](Self::fetch_business_profile) call. On an
    /// API failure the previous credentials are restored and
    /// [`WhatsappError::Credentials`] wraps the underlying error. Transport
    /// faults propagate unchanged.
    pub async fn start(
        &mut self,
        phone_id: impl Into<String>,
        token: impl Into<String>,
    ) -> WhatsappResult<ResponseBody> {
        self.session = Some(self.build_session()?);
        let previous_phone_id = self.phone_id.replace(phone_id.into());
        let previous_token = self.token.replace(SecretString::new(token.into()));

        match self.fetch_business_profile().await {
            Ok(profile) => Ok(profile),
            Err(err) if err.is_api_failure() => {
                self.phone_id = previous_phone_id;
                self.token = previous_token;
                Err(WhatsappError::Credentials(Box::new(err)))
            }
            Err(err) => Err(err),
        }
    }

    /// Replaces the session, keeping the committed credentials.
    pub fn restart(&mut self) -> WhatsappResult<()> {
        self.session = Some(self.build_session()?);
        Ok(())
    }

    /// Releases the session.
    ///
    /// Credentials are retained; call [`restart`](Self::restart) to resume.
    pub fn close(&mut self) {
        self.session = None;
    }

    fn build_session(&self) -> WhatsappResult<Client> {
        let mut builder = ClientBuilder::new().timeout(self.config.timeout);

        if let Some(proxy) = &self.config.proxy {
            let mut outbound = reqwest::Proxy::all(&proxy.url)
                .map_err(|e| ConfigurationError::InvalidProxy(e.to_string()))?;
            if let (Some(username), Some(password)) = (proxy.username.as_deref(), proxy.password())
            {
                outbound = outbound.basic_auth(username, password);
            }
            builder = builder.proxy(outbound);
        }

        Ok(builder.build().map_err(TransportError::from)?)
    }

    fn session(&self) -> WhatsappResult<&Client> {
        self.session.as_ref().ok_or(WhatsappError::NotStarted)
    }

    fn required_phone_id(&self) -> WhatsappResult<&str> {
        self.phone_id.as_deref().ok_or(WhatsappError::NotStarted)
    }

    fn route(&self, method: Method, path: &str, params: &[(&str, PathValue)]) -> Route {
        Route::against(self.config.base_url.as_str(), method, path, params)
    }

    /// Headers carried by every call: the identifying `User-Agent`, plus a
    /// bearer `Authorization` header when a token is held.
    fn base_headers(&self) -> WhatsappResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent).map_err(|_| {
                ConfigurationError::InvalidConfiguration {
                    message: "user agent is not a valid header value".to_string(),
                }
            })?,
        );

        if let Some(token) = &self.token {
            let bearer = format!("Bearer {}", token.expose_secret());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&bearer).map_err(|_| {
                    ConfigurationError::InvalidConfiguration {
                        message: "token is not a valid header value".to_string(),
                    }
                })?,
            );
        }

        Ok(headers)
    }

    /// Performs one HTTP exchange for `route` and maps the outcome.
    ///
    /// Exactly one attempt per call; no retries for any error class,
    /// including 429 rate limiting and transport faults.
    pub async fn request(
        &self,
        route: Route,
        options: RequestOptions,
    ) -> WhatsappResult<ResponseBody> {
        let session = self.session()?;
        let mut builder = session
            .request(route.method().clone(), route.url())
            .headers(self.base_headers()?);

        let RequestOptions { payload, file } = options;
        if let Some(file) = file {
            let mut form = Form::new();
            if let Some(payload) = payload {
                for (name, value) in payload.into_form_fields()? {
                    form = form.text(name, value);
                }
            }
            let part = Part::bytes(file.content.to_vec())
                .file_name(file.filename)
                .mime_str(&file.mime_type)
                .map_err(|e| TransportError::Http(e.to_string()))?;
            form = form.part("file", part);
            builder = builder.multipart(form);
        } else if let Some(payload) = payload {
            builder = match payload {
                Payload::Form(fields) => builder.form(&fields),
                Payload::Json(value) => builder
                    .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                    .body(encode_compact_ascii(&value)),
            };
        }

        let response = builder.send().await.map_err(TransportError::from)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(TransportError::from)?;
        let body = ResponseBody::from_text(text);

        debug!(
            method = %route.method(),
            url = route.url(),
            status,
            body = %body,
            "api request completed"
        );

        if (200..300).contains(&status) {
            Ok(body)
        } else {
            Err(WhatsappError::from_response(status, body))
        }
    }

    /// Fetches the business profile for the current phone id.
    pub async fn fetch_business_profile(&self) -> WhatsappResult<ResponseBody> {
        let route = self.route(
            Method::GET,
            "/{phone_id}/whatsapp_business_profile",
            &[("phone_id", self.required_phone_id()?.into())],
        );
        self.request(route, RequestOptions::new()).await
    }

    /// Sends a message with a caller-supplied payload.
    pub async fn send_message<T: Serialize + ?Sized>(
        &self,
        payload: &T,
    ) -> WhatsappResult<ResponseBody> {
        let value = serde_json::to_value(payload)?;
        let route = self.route(
            Method::POST,
            "/{phone_id}/messages",
            &[("phone_id", self.required_phone_id()?.into())],
        );
        self.request(route, RequestOptions::new().json(value)).await
    }

    /// Marks a received message as read.
    pub async fn mark_message_read(&self, message_id: &str) -> WhatsappResult<ResponseBody> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id,
        });
        let route = self.route(
            Method::POST,
            "/{phone_id}/messages",
            &[("phone_id", self.required_phone_id()?.into())],
        );
        self.request(route, RequestOptions::new().json(payload))
            .await
    }

    /// Uploads a media asset, returning the API's media id mapping.
    pub async fn upload_media(&self, upload: MediaUpload) -> WhatsappResult<ResponseBody> {
        let route = self.route(
            Method::POST,
            "/{phone_id}/media",
            &[("phone_id", self.required_phone_id()?.into())],
        );
        let options = RequestOptions::new()
            .json(json!({"messaging_product": "whatsapp"}))
            .file(upload);
        self.request(route, options).await
    }

    /// Fetches the download URL record for a media id.
    pub async fn fetch_media_url(&self, media_id: &str) -> WhatsappResult<ResponseBody> {
        let route = self.route(Method::GET, "/{media_id}", &[("media_id", media_id.into())]);
        self.request(route, RequestOptions::new()).await
    }

    /// Deletes a media asset by id.
    pub async fn delete_media(&self, media_id: &str) -> WhatsappResult<ResponseBody> {
        let route = self.route(
            Method::DELETE,
            "/{media_id}",
            &[("media_id", media_id.into())],
        );
        self.request(route, RequestOptions::new()).await
    }

    /// Downloads a media asset from an absolute URL returned by
    /// [`fetch_media_url`](Self::fetch_media_url).
    ///
    /// This bypasses the route builder: the URL comes from a prior API
    /// response and points outside the versioned API base. Returns the raw
    /// bytes on HTTP 200.
    pub async fn download_media(&self, media_url: &str) -> WhatsappResult<Bytes> {
        let session = self.session()?;
        let response = session
            .get(media_url)
            .headers(self.base_headers()?)
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status().as_u16();
        debug!(url = media_url, status, "media download completed");

        if status == 200 {
            return Ok(response.bytes().await.map_err(TransportError::from)?);
        }

        let body = ResponseBody::from_text(response.text().await.map_err(TransportError::from)?);
        let meta = ErrorResponse::new(status, body);
        Err(match status {
            404 => WhatsappError::NotFound(meta),
            403 => WhatsappError::Forbidden(meta),
            _ => WhatsappError::Api(meta),
        })
    }
}

impl fmt::Debug for WhatsappClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsappClient")
            .field("phone_id", &self.phone_id)
            .field("has_token", &self.token.is_some())
            .field("started", &self.is_started())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_object_becomes_form_payload() {
        let payload = Payload::from_value(json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": "wamid.X",
        }));

        match payload {
            Payload::Form(mut fields) => {
                fields.sort();
                assert_eq!(
                    fields,
                    vec![
                        ("message_id".to_string(), "wamid.X".to_string()),
                        ("messaging_product".to_string(), "whatsapp".to_string()),
                        ("status".to_string(), "read".to_string()),
                    ]
                );
            }
            Payload::Json(_) => panic!("expected form payload"),
        }
    }

    #[test]
    fn test_nested_object_becomes_json_payload() {
        let value = json!({"to": "123", "type": "text", "text": {"body": "hi"}});
        assert!(matches!(
            Payload::from_value(value),
            Payload::Json(_)
        ));
    }

    #[test]
    fn test_null_values_force_json_payload() {
        let value = json!({"to": "123", "context": null});
        assert!(matches!(Payload::from_value(value), Payload::Json(_)));
    }

    #[test]
    fn test_scalars_stringified_in_form_fields() {
        let payload = Payload::from_value(json!({"limit": 5, "archived": false}));
        match payload {
            Payload::Form(mut fields) => {
                fields.sort();
                assert_eq!(
                    fields,
                    vec![
                        ("archived".to_string(), "false".to_string()),
                        ("limit".to_string(), "5".to_string()),
                    ]
                );
            }
            Payload::Json(_) => panic!("expected form payload"),
        }
    }

    #[test]
    fn test_compact_ascii_encoding() {
        let encoded = encode_compact_ascii(&json!({"text": {"body": "olá"}}));
        assert_eq!(encoded, r#"{"text":{"body":"ol\u00e1"}}"#);
        assert!(encoded.is_ascii());
    }

    #[test]
    fn test_compact_ascii_escapes_surrogate_pairs() {
        let encoded = encode_compact_ascii(&json!({"body": "🎉"}));
        assert_eq!(encoded, r#"{"body":"\ud83c\udf89"}"#);
    }

    #[test]
    fn test_compact_ascii_round_trips() {
        let original = json!({"to": "123", "text": {"body": "héllo wörld"}});
        let decoded: Value = serde_json::from_str(&encode_compact_ascii(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_multipart_rejects_nested_payload() {
        let payload = Payload::Json(json!({"nested": {"x": 1}}));
        assert!(matches!(
            payload.into_form_fields(),
            Err(WhatsappError::Configuration(_))
        ));
    }

    #[test]
    fn test_client_debug_redacts_token() {
        let mut client = WhatsappClient::new(WhatsappConfig::default());
        client.token = Some(SecretString::new("EAAG-secret-token".to_string()));
        let debug = format!("{:?}", client);
        assert!(!debug.contains("EAAG-secret-token"));
    }

    #[test]
    fn test_unstarted_client_has_no_session() {
        let client = WhatsappClient::new(WhatsappConfig::default());
        assert!(!client.is_started());
        assert!(matches!(client.session(), Err(WhatsappError::NotStarted)));
    }
}

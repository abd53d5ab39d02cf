//! Signed HTTP transport for the JSON protocols
//!
//! Two wire styles are supported:
//! - JSON 1.1 RPC: `POST /` with `X-Amz-Target: <prefix>.<Operation>`
//! - REST-JSON: resource paths and HTTP verbs, JSON bodies
//!
//! Both decode error responses into [`ApiError`] using the
//! `x-amzn-ErrorType` header or the `__type` / `code` body fields.
//! Exactly one request is made per call; there are no retries.

use chrono::Utc;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;
use url::Url;

use crate::config::{ClientConfig, Service};
use crate::credentials::Credentials;
use crate::error::{ApiError, ClientError, Result};
use crate::signer::{SignableRequest, SigningParams, sign};

const JSON_1_1: &str = "application/x-amz-json-1.1";
const REST_JSON: &str = "application/json";

/// Output of operations that return no fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Empty {}

/// A REST-JSON request description
#[derive(Debug, Clone)]
pub struct RestRequest {
    method: &'static str,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RestRequest {
    /// `segments` are raw path segments; they are percent-encoded when sent
    pub fn new(method: &'static str, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn json<I: Serialize + ?Sized>(mut self, body: &I) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }
}

/// HTTP transport bound to one service endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    service: Service,
    endpoint: Url,
    region: String,
    credentials: Option<Credentials>,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig, service: Service) -> Result<Self> {
        let endpoint = config.endpoint_for(service)?;
        let credentials = config.credentials.resolve()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            service,
            endpoint,
            region: config.region.clone(),
            credentials,
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Invoke a JSON 1.1 RPC operation
    pub async fn call_json<I, O>(&self, target_prefix: &str, operation: &str, input: &I) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let request = SignableRequest::new("POST", self.endpoint.clone())
            .header("content-type", JSON_1_1)
            .header("x-amz-target", format!("{}.{}", target_prefix, operation))
            .body(serde_json::to_vec(input)?);

        let body = self.send(request, operation).await?;
        decode(&body)
    }

    /// Invoke a REST-JSON operation
    pub async fn call_rest<O: DeserializeOwned>(&self, operation: &str, rest: RestRequest) -> Result<O> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidEndpoint {
                url: self.endpoint.to_string(),
                reason: "endpoint cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(rest.segments.iter());
        if !rest.query.is_empty() {
            url.query_pairs_mut().extend_pairs(rest.query.iter());
        }

        let mut request = SignableRequest::new(rest.method, url);
        if let Some(body) = rest.body {
            request = request.header("content-type", REST_JSON).body(body);
        }

        let body = self.send(request, operation).await?;
        decode(&body)
    }

    async fn send(&self, mut request: SignableRequest, operation: &str) -> Result<Vec<u8>> {
        if let Some(credentials) = &self.credentials {
            let params = SigningParams {
                credentials,
                region: &self.region,
                service: self.service.signing_name,
                time: Utc::now(),
            };
            sign(&mut request, &params);
        }

        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            ClientError::InvalidConfig {
                message: format!("invalid HTTP method {}: {}", request.method, e),
            }
        })?;

        let mut builder = self
            .http
            .request(method, request.url.clone())
            .header(reqwest::header::USER_AGENT, &self.user_agent);
        for (name, value) in &request.headers {
            // reqwest derives Host from the URL
            if name != "host" {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        debug!(
            service = self.service.name,
            operation,
            method = %request.method,
            path = request.url.path(),
            "sending request"
        );

        let response = builder.body(request.body).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let error = parse_error(
            status.as_u16(),
            header(&headers, "x-amzn-errortype"),
            header(&headers, "x-amzn-requestid").map(str::to_string),
            &body,
        );
        debug!(
            service = self.service.name,
            operation,
            status = error.status,
            code = %error.code,
            "request failed"
        );
        Err(ClientError::Api(error))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn decode<O: DeserializeOwned>(body: &[u8]) -> Result<O> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Build an [`ApiError`] from a failed response
pub(crate) fn parse_error(
    status: u16,
    error_type: Option<&str>,
    request_id: Option<String>,
    body: &[u8],
) -> ApiError {
    let json: JsonValue = serde_json::from_slice(body).unwrap_or(JsonValue::Null);
    let field = |name: &str| json.get(name).and_then(JsonValue::as_str).map(str::to_string);

    let code = error_type
        .map(str::to_string)
        .or_else(|| field("__type"))
        .or_else(|| field("code"))
        .map(|raw| sanitize_code(&raw))
        .unwrap_or_else(|| match status {
            404 => "NotFound".to_string(),
            _ => "UnknownError".to_string(),
        });

    let message = field("message")
        .or_else(|| field("Message"))
        .unwrap_or_default();

    ApiError {
        code,
        message,
        status,
        request_id,
    }
}

/// Strip namespace (`ns#Code`) and trailing metadata (`Code:http://...`)
fn sanitize_code(raw: &str) -> String {
    let without_suffix = raw.split(':').next().unwrap_or(raw);
    without_suffix
        .rsplit('#')
        .next()
        .unwrap_or(without_suffix)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_code() {
        assert_eq!(
            sanitize_code("com.amazonaws.codecommit#RepositoryDoesNotExistException"),
            "RepositoryDoesNotExistException"
        );
        assert_eq!(
            sanitize_code("ResourceNotFoundException:http://internal.amazon.com/coral/"),
            "ResourceNotFoundException"
        );
        assert_eq!(sanitize_code("ValidationException"), "ValidationException");
    }

    #[test]
    fn test_parse_error_prefers_header() {
        let error = parse_error(
            404,
            Some("ResourceNotFoundException:http://internal.amazon.com/"),
            Some("req-1".to_string()),
            br#"{"message":"Knowledge base ABC not found"}"#,
        );

        assert_eq!(error.code, "ResourceNotFoundException");
        assert_eq!(error.message, "Knowledge base ABC not found");
        assert_eq!(error.status, 404);
        assert_eq!(error.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_parse_error_from_body() {
        let error = parse_error(
            400,
            None,
            None,
            br#"{"__type":"com.amazonaws.codecommit#RepositoryNameExistsException","Message":"exists"}"#,
        );
        assert_eq!(error.code, "RepositoryNameExistsException");
        assert_eq!(error.message, "exists");

        let unknown = parse_error(503, None, None, b"<html>unavailable</html>");
        assert_eq!(unknown.code, "UnknownError");
        assert_eq!(unknown.message, "");
    }

    #[test]
    fn test_decode_empty_body() {
        let empty: Empty = decode(b"").unwrap();
        assert_eq!(empty, Empty {});
    }
}

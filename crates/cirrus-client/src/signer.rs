//! Signature Version 4 request signing
//!
//! Implements the canonical request / string-to-sign / derived-key scheme used
//! by every service client. Requests are signed over their method, path,
//! sorted query, lowercased headers and a SHA-256 of the body.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use url::Url;

use crate::credentials::Credentials;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// A request in the shape needed for signing
#[derive(Debug, Clone)]
pub struct SignableRequest {
    pub method: String,
    pub url: Url,
    /// Header names are stored lowercased
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl SignableRequest {
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        Self {
            method: method.into(),
            url,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Host header value derived from the URL
    fn host(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }
}

/// Scope of a signature
#[derive(Debug, Clone)]
pub struct SigningParams<'a> {
    pub credentials: &'a Credentials,
    pub region: &'a str,
    pub service: &'a str,
    pub time: DateTime<Utc>,
}

impl SigningParams<'_> {
    fn date(&self) -> String {
        self.time.format("%Y%m%d").to_string()
    }

    fn amz_date(&self) -> String {
        self.time.format("%Y%m%dT%H%M%SZ").to_string()
    }

    fn scope(&self) -> String {
        format!("{}/{}/{}/aws4_request", self.date(), self.region, self.service)
    }
}

/// Sign `request` in place, adding `host`, `x-amz-date`, the session token
/// header when present, and `authorization`
pub fn sign(request: &mut SignableRequest, params: &SigningParams<'_>) {
    let host = request.host();
    request.headers.entry("host".to_string()).or_insert(host);
    request.headers.insert("x-amz-date".to_string(), params.amz_date());
    if let Some(token) = &params.credentials.session_token {
        request
            .headers
            .insert("x-amz-security-token".to_string(), token.clone());
    }

    let signed_headers = signed_headers(request);
    let canonical = canonical_request(request);
    let string_to_sign = string_to_sign(&canonical, params);
    let signature = hex::encode(hmac_sha256(&signing_key(params), string_to_sign.as_bytes()));

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM,
        params.credentials.access_key_id,
        params.scope(),
        signed_headers,
        signature
    );
    request.headers.insert("authorization".to_string(), authorization);
}

/// Canonical request text for the headers currently on `request`
pub fn canonical_request(request: &SignableRequest) -> String {
    let canonical_headers: String = request
        .headers
        .iter()
        .filter(|(name, _)| name.as_str() != "authorization")
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method,
        canonical_uri(&request.url),
        canonical_query(&request.url),
        canonical_headers,
        signed_headers(request),
        hex::encode(Sha256::digest(&request.body))
    )
}

fn signed_headers(request: &SignableRequest) -> String {
    request
        .headers
        .keys()
        .filter(|name| name.as_str() != "authorization")
        .cloned()
        .collect::<Vec<_>>()
        .join(";")
}

fn string_to_sign(canonical_request: &str, params: &SigningParams<'_>) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        params.amz_date(),
        params.scope(),
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    )
}

fn signing_key(params: &SigningParams<'_>) -> Vec<u8> {
    let secret = format!("AWS4{}", params.credentials.secret_access_key);
    let k_date = hmac_sha256(secret.as_bytes(), params.date().as_bytes());
    let k_region = hmac_sha256(&k_date, params.region.as_bytes());
    let k_service = hmac_sha256(&k_region, params.service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Path of the URL, each segment encoded once more on top of the URL's own encoding
fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k), uri_encode(&v)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode everything except unreserved characters
fn uri_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}

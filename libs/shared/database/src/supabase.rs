use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// SQLSTATE raised by Postgres for exclusion constraint violations.
pub const EXCLUSION_VIOLATION: &str = "23P01";
/// SQLSTATE raised by Postgres for unique constraint violations.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Constraint violation ({code}): {message}")]
    Conflict { code: String, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SupabaseError {
    /// True when the store refused a write because it would overlap an
    /// existing row under an exclusion or uniqueness constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, SupabaseError::Conflict { code, .. }
            if code == EXCLUSION_VIOLATION || code == UNIQUE_VIOLATION)
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|e| SupabaseError::InvalidHeader(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| SupabaseError::InvalidHeader(e.to_string()))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(Self::classify_error(status, error_text));
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Header asking PostgREST to echo written rows back.
    pub fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    /// Exact number of rows matching a filtered table path. The total is read
    /// from `Content-Range`, so the server's `max-rows` cap does not apply.
    pub async fn count(&self, path: &str, auth_token: Option<&str>) -> Result<u64, SupabaseError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Counting rows at {}", url);

        let mut headers = self.get_headers(auth_token)?;
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.client.head(&url)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("Count failed ({}) for {}", status, url);
            return Err(Self::classify_error(status, status.to_string()));
        }

        let content_range = response.headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        total_from_content_range(content_range).ok_or_else(|| SupabaseError::Api {
            status: status.as_u16(),
            message: format!("No row count in Content-Range '{}'", content_range),
        })
    }

    fn classify_error(status: StatusCode, error_text: String) -> SupabaseError {
        match status.as_u16() {
            401 | 403 => SupabaseError::Auth(error_text),
            404 => SupabaseError::NotFound(error_text),
            409 => {
                let code = serde_json::from_str::<Value>(&error_text)
                    .ok()
                    .and_then(|body| body.get("code").and_then(|c| c.as_str()).map(str::to_string))
                    .unwrap_or_default();
                SupabaseError::Conflict { code, message: error_text }
            }
            other => SupabaseError::Api { status: other, message: error_text },
        }
    }
}

/// `0-24/1500` and `*/1500` both carry the total after the slash.
fn total_from_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

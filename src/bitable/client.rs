// src/bitable/client.rs
//! HTTP implementation of the destination API.
//!
//! Thin typed wrappers around reqwest for the Feishu open-apis surface.
//! Every response is unwrapped through the `{code, msg, data}` envelope:
//! an operation succeeded only when the HTTP status *and* the
//! application-level code both say so.

use super::record::RecordFields;
use super::schema::FieldKind;
use super::token::{IssuedToken, TokenCache, TokenSource};
use super::{BitableGateway, FieldInfo};
use crate::constants::{
    ERROR_BODY_PREVIEW_LENGTH, FEISHU_BASE_URL, METADATA_TIMEOUT_SECS, TRANSFER_TIMEOUT_SECS,
};
use crate::error::{AppError, FeishuErrorCode};
use crate::types::AppCredentials;
use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Acquires tenant access tokens from the destination's auth endpoint.
pub struct TenantTokenSource {
    http: Client,
    credentials: AppCredentials,
}

impl TenantTokenSource {
    pub fn new(http: Client, credentials: AppCredentials) -> Self {
        Self { http, credentials }
    }
}

#[async_trait::async_trait]
impl TokenSource for TenantTokenSource {
    async fn acquire(&self) -> Result<IssuedToken, AppError> {
        let url = format!("{}/auth/v3/tenant_access_token/internal", FEISHU_BASE_URL);
        let response = self
            .http
            .post(&url)
            .json(&json!({
                "app_id": self.credentials.app_id,
                "app_secret": self.credentials.app_secret,
            }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = unwrap_envelope(status, &response.text().await?, &url)?;

        // The auth endpoint carries its fields at the envelope's top level.
        let secret = required_str(&body, "/tenant_access_token")?;
        let expires_in = body
            .pointer("/expire")
            .and_then(Value::as_u64)
            .unwrap_or(7200);

        Ok(IssuedToken {
            secret,
            expires_in: Duration::from_secs(expires_in),
        })
    }
}

/// A thin wrapper around reqwest Client for Bitable requests, with the
/// token cache underneath every call.
pub struct BitableHttpClient {
    http: Client,
    tokens: TokenCache,
}

impl BitableHttpClient {
    /// Creates a client for the given app credentials.
    pub fn new(credentials: AppCredentials) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(METADATA_TIMEOUT_SECS))
            .build()?;
        let source = TenantTokenSource::new(http.clone(), credentials);
        Ok(Self {
            http,
            tokens: TokenCache::new(Arc::new(source)),
        })
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, AppError> {
        let url = format!("{}/{}", FEISHU_BASE_URL, endpoint);
        log::debug!("POST {}", url);

        let bearer = self.tokens.bearer().await?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let envelope = unwrap_envelope(status, &response.text().await?, &url)?;
        Ok(envelope.pointer("/data").cloned().unwrap_or(Value::Null))
    }

    async fn get(&self, endpoint: &str) -> Result<Value, AppError> {
        let url = format!("{}/{}", FEISHU_BASE_URL, endpoint);
        log::debug!("GET {}", url);

        let bearer = self.tokens.bearer().await?;
        let response = self.http.get(&url).bearer_auth(bearer).send().await?;

        let status = response.status();
        let envelope = unwrap_envelope(status, &response.text().await?, &url)?;
        Ok(envelope.pointer("/data").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait::async_trait]
impl BitableGateway for BitableHttpClient {
    async fn create_app(&self, name: &str) -> Result<String, AppError> {
        let data = self
            .post("bitable/v1/apps", &json!({ "name": name }))
            .await?;
        required_str(&data, "/app/app_token")
    }

    async fn create_table(&self, app_token: &str, name: &str) -> Result<String, AppError> {
        let endpoint = format!("bitable/v1/apps/{}/tables", app_token);
        let data = self
            .post(&endpoint, &json!({ "table": { "name": name } }))
            .await?;
        required_str(&data, "/table/table_id")
    }

    async fn create_field(
        &self,
        app_token: &str,
        table_id: &str,
        name: &str,
        kind: FieldKind,
    ) -> Result<String, AppError> {
        let endpoint = format!("bitable/v1/apps/{}/tables/{}/fields", app_token, table_id);

        let mut field = json!({
            "field_name": name,
            "type": kind.api_type(),
        });
        if let Some(property) = kind.api_property() {
            field["property"] = property;
        }

        let data = self.post(&endpoint, &json!({ "field": field })).await?;
        required_str(&data, "/field/field_id")
    }

    async fn list_fields(
        &self,
        app_token: &str,
        table_id: &str,
    ) -> Result<Vec<FieldInfo>, AppError> {
        let endpoint = format!("bitable/v1/apps/{}/tables/{}/fields", app_token, table_id);
        let data = self.get(&endpoint).await?;

        let items = data
            .pointer("/items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(items
            .iter()
            .filter_map(|item| {
                Some(FieldInfo {
                    field_id: item.get("field_id")?.as_str()?.to_string(),
                    field_name: item.get("field_name")?.as_str()?.to_string(),
                })
            })
            .collect())
    }

    async fn upload_attachment(
        &self,
        app_token: &str,
        table_id: &str,
        field_id: &str,
        path: &Path,
    ) -> Result<String, AppError> {
        let endpoint = format!(
            "bitable/v1/apps/{}/tables/{}/fields/{}/attachments",
            app_token, table_id, field_id
        );
        let url = format!("{}/{}", FEISHU_BASE_URL, endpoint);
        log::debug!("POST (multipart) {}", url);

        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")
            .map_err(|e| AppError::InternalError {
                message: format!("Could not build multipart body: {}", e),
                source: None,
            })?;
        let form = multipart::Form::new().part("file", part);

        let bearer = self.tokens.bearer().await?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(bearer)
            .multipart(form)
            .timeout(Duration::from_secs(TRANSFER_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        let envelope = unwrap_envelope(status, &response.text().await?, &url)?;
        let data = envelope.pointer("/data").cloned().unwrap_or(Value::Null);
        required_str(&data, "/file_token")
    }

    async fn create_records(
        &self,
        app_token: &str,
        table_id: &str,
        chunk: &[RecordFields],
    ) -> Result<Vec<String>, AppError> {
        let endpoint = format!(
            "bitable/v1/apps/{}/tables/{}/records/batch_create",
            app_token, table_id
        );

        let records: Vec<Value> = chunk
            .iter()
            .map(|fields| json!({ "fields": fields }))
            .collect();
        let data = self.post(&endpoint, &json!({ "records": records })).await?;

        Ok(data
            .pointer("/records")
            .and_then(Value::as_array)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| r.get("record_id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Checks both success levels and returns the parsed envelope.
///
/// HTTP status and the application `code` are independent: a 200 with a
/// non-zero code is still a failure, and a non-2xx with an unparseable
/// body falls back to the status alone.
fn unwrap_envelope(status: StatusCode, body: &str, url: &str) -> Result<Value, AppError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if let Some(value) = parsed {
        match value.pointer("/code").and_then(Value::as_i64) {
            Some(0) => return Ok(value),
            Some(code) => {
                let message = value
                    .pointer("/msg")
                    .and_then(Value::as_str)
                    .unwrap_or("no message")
                    .to_string();
                return Err(AppError::FeishuService {
                    code: FeishuErrorCode::from_code(code),
                    message,
                    status,
                });
            }
            None => {}
        }
    }

    let preview: String = body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
    if status.is_success() {
        Err(AppError::MalformedResponse(format!(
            "No application code in response from {}: {}",
            url, preview
        )))
    } else {
        Err(AppError::FeishuService {
            code: FeishuErrorCode::from_http_status(status.as_u16()),
            message: format!("HTTP {} from {}: {}", status, url, preview),
            status,
        })
    }
}

/// Reads a required string at a JSON pointer out of a response payload.
fn required_str(value: &Value, pointer: &str) -> Result<String, AppError> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::MalformedResponse(format!("Response is missing `{}`", pointer))
        })
}

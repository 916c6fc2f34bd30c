//! HTTP implementation of the backend gateway
//!
//! Talks to the assistant backend over JSON. Every gated call attaches the
//! session credential as a bearer token; a missing credential fails before
//! any request is issued.

pub mod auth;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use url::Url;

use crate::core::{
    BackendGateway, GatewayError, PaymentIntent, Session, SyncReport, TokenQuota, UploadReceipt,
};

/// Default backend base URL, overridable via `KBSYNC_API_URL`.
pub const DEFAULT_API_BASE: &str = "http://localhost:1000";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Reqwest-backed gateway.
pub struct HttpGateway {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpGateway {
    /// Build a gateway against the given base URL.
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::Parse(format!("Invalid API base URL: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Build a gateway from the environment, falling back to the default.
    pub fn from_env() -> Result<Self, GatewayError> {
        let base = std::env::var("KBSYNC_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::new(&base)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn bearer(session: &Session) -> Result<String, GatewayError> {
        if session.credential.is_empty() {
            return Err(GatewayError::AuthRequired);
        }
        Ok(format!("Bearer {}", session.credential))
    }

    /// Check the HTTP status and decode the body, mapping 401/403 to
    /// `AuthRequired` and other failures to `Api`.
    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GatewayError::AuthRequired);
        }
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .map(|b| b.message())
                .unwrap_or_else(|_| status.to_string());
            return Err(GatewayError::api(status.as_u16(), message));
        }
        resp.json::<T>()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn url_for(&self, path: &str) -> String {
        self.endpoint(path)
    }
}

/// Backend error body; some routes use `message`, others `error`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn message(self) -> String {
        self.message
            .or(self.error)
            .unwrap_or_else(|| "Request failed".to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionsRequest<'a> {
    connection_string: &'a str,
}

#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    collections: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncRequest<'a> {
    connection_string: &'a str,
    collections: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SyncResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    chunks: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenStatusResponse {
    tokens: u64,
    max_tokens: u64,
    #[serde(default)]
    plan: Option<String>,
    #[serde(default)]
    subscription: Option<String>,
}

impl TokenStatusResponse {
    fn into_quota(self) -> TokenQuota {
        // The subscription flag is ground truth for activation; the numeric
        // balance is display-only.
        let active = self
            .subscription
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("active"))
            .unwrap_or(false);
        TokenQuota {
            available: self.tokens,
            max: self.max_tokens,
            active,
            plan: self.plan,
        }
    }
}

/// Success envelope for the upload route. Error statuses carry the reason in
/// the `error` field, which `decode` already picks up via `ErrorBody`.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanSelectionRequest<'a> {
    plan_id: &'a str,
    amount_due: u32,
}

#[derive(Debug, Deserialize)]
struct PlanSelectionResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn fetch_collections(
        &self,
        session: &Session,
        connection_string: &str,
    ) -> Result<Vec<String>, GatewayError> {
        tracing::debug!("Fetching collection catalog");

        let resp = self
            .client
            .post(self.endpoint("/api/db/collections"))
            .header("Authorization", Self::bearer(session)?)
            .header("Accept", "application/json")
            .json(&CollectionsRequest { connection_string })
            .send()
            .await?;

        let body: CollectionsResponse = Self::decode(resp).await?;
        if !body.success {
            return Err(GatewayError::api(
                200,
                body.message
                    .unwrap_or_else(|| "Collection listing failed".to_string()),
            ));
        }
        Ok(body.collections)
    }

    async fn run_sync(
        &self,
        session: &Session,
        connection_string: &str,
        collections: &BTreeSet<String>,
    ) -> Result<SyncReport, GatewayError> {
        tracing::debug!(count = collections.len(), "Submitting sync job");

        let resp = self
            .client
            .post(self.endpoint("/api/db/sync"))
            .header("Authorization", Self::bearer(session)?)
            .header("Accept", "application/json")
            .json(&SyncRequest {
                connection_string,
                collections: collections.iter().map(String::as_str).collect(),
            })
            .send()
            .await?;

        let body: SyncResponse = Self::decode(resp).await?;
        if !body.success {
            return Err(GatewayError::api(200, body.message));
        }
        Ok(SyncReport {
            accepted: body.success,
            chunks: body.chunks,
            message: body.message,
        })
    }

    async fn fetch_quota(
        &self,
        session: &Session,
        subject_id: &str,
    ) -> Result<TokenQuota, GatewayError> {
        tracing::debug!(subject = subject_id, "Fetching token status");

        let resp = self
            .client
            .get(self.endpoint(&format!("/api/token-status/{}", subject_id)))
            .header("Authorization", Self::bearer(session)?)
            .header("Accept", "application/json")
            .send()
            .await?;

        let body: TokenStatusResponse = Self::decode(resp).await?;
        Ok(body.into_quota())
    }

    async fn upload_knowledge_base(
        &self,
        session: &Session,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadReceipt, GatewayError> {
        tracing::debug!(file = file_name, bytes = contents.len(), "Uploading knowledge base file");

        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("companyId", session.subject_id.clone());

        let resp = self
            .client
            .post(self.endpoint("/api/csv/upload"))
            .header("Authorization", Self::bearer(session)?)
            .header("Accept", "application/json")
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = Self::decode(resp).await?;
        if !body.success {
            return Err(GatewayError::api(
                200,
                body.message.unwrap_or_else(|| "Upload failed".to_string()),
            ));
        }
        Ok(UploadReceipt {
            accepted: body.success,
            message: body
                .message
                .unwrap_or_else(|| "File uploaded successfully".to_string()),
        })
    }

    async fn submit_plan_selection(
        &self,
        session: &Session,
        intent: &PaymentIntent,
    ) -> Result<(), GatewayError> {
        tracing::debug!(plan = %intent.plan_id, "Recording plan selection");

        let resp = self
            .client
            .post(self.endpoint("/api/plans/select"))
            .header("Authorization", Self::bearer(session)?)
            .header("Accept", "application/json")
            .json(&PlanSelectionRequest {
                plan_id: &intent.plan_id,
                amount_due: intent.amount_due,
            })
            .send()
            .await?;

        let body: PlanSelectionResponse = Self::decode(resp).await?;
        if !body.success {
            return Err(GatewayError::api(
                200,
                body.message
                    .unwrap_or_else(|| "Plan selection rejected".to_string()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let gw = HttpGateway::new("http://localhost:1000/").unwrap();
        assert_eq!(
            gw.url_for("/api/db/sync"),
            "http://localhost:1000/api/db/sync"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(HttpGateway::new("not a url").is_err());
    }

    #[test]
    fn test_bearer_requires_credential() {
        let mut session = Session::new("id", "name", "e@x.test", "tok");
        assert_eq!(HttpGateway::bearer(&session).unwrap(), "Bearer tok");

        session.credential.clear();
        assert!(matches!(
            HttpGateway::bearer(&session),
            Err(GatewayError::AuthRequired)
        ));
    }

    #[test]
    fn test_token_status_maps_subscription_flag() {
        let json = r#"{"tokens":5000,"maxTokens":50000,"plan":"Starter","subscription":"active"}"#;
        let body: TokenStatusResponse = serde_json::from_str(json).unwrap();
        let quota = body.into_quota();
        assert_eq!(quota.available, 5000);
        assert_eq!(quota.max, 50000);
        assert!(quota.active);
        assert_eq!(quota.plan.as_deref(), Some("Starter"));
    }

    #[test]
    fn test_token_status_paused_despite_balance() {
        let json = r#"{"tokens":12000,"maxTokens":50000,"subscription":"paused"}"#;
        let body: TokenStatusResponse = serde_json::from_str(json).unwrap();
        assert!(!body.into_quota().active);
    }

    #[test]
    fn test_token_status_missing_subscription_is_inactive() {
        let json = r#"{"tokens":100,"maxTokens":1000}"#;
        let body: TokenStatusResponse = serde_json::from_str(json).unwrap();
        assert!(!body.into_quota().active);
    }

    #[test]
    fn test_upload_response_parses_with_and_without_message() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"success":true,"message":"Ingested 120 rows"}"#).unwrap();
        assert!(body.success);
        assert_eq!(body.message.as_deref(), Some("Ingested 120 rows"));

        let body: UploadResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(body.success);
        assert!(body.message.is_none());
    }

    #[test]
    fn test_sync_response_parses() {
        let json = r#"{"success":true,"message":"Database synced successfully","chunks":15}"#;
        let body: SyncResponse = serde_json::from_str(json).unwrap();
        assert!(body.success);
        assert_eq!(body.chunks, 15);
    }

    #[test]
    fn test_error_body_prefers_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":"bad request","error":"other"}"#).unwrap();
        assert_eq!(body.message(), "bad request");

        let body: ErrorBody = serde_json::from_str(r#"{"error":"upload failed"}"#).unwrap();
        assert_eq!(body.message(), "upload failed");

        let body: ErrorBody = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(body.message(), "Request failed");
    }
}

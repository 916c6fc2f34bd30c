//! Backend gateway trait - the capability set all remote calls go through
//!
//! Components depend on this trait, never on the HTTP layer directly; tests
//! substitute an in-memory implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::core::{PaymentIntent, Session, TokenQuota};

/// Errors surfaced by gateway calls
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Credential missing or rejected; signal to re-authenticate
    #[error("Authentication required")]
    AuthRequired,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend responded with a non-success envelope or status
    #[error("Backend error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl GatewayError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the caller should re-authenticate rather than retry.
    pub fn is_auth(&self) -> bool {
        matches!(self, GatewayError::AuthRequired)
    }
}

/// Outcome of an accepted sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Whether the backend accepted the job
    pub accepted: bool,
    /// Number of document chunks processed into the knowledge base
    pub chunks: u64,
    /// Human-readable backend message
    pub message: String,
}

/// Outcome of an accepted knowledge-base file upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Whether the backend accepted the file for ingestion
    pub accepted: bool,
    /// Human-readable backend message
    pub message: String,
}

/// Remote capability set consumed by the workflow, quota monitor and plan
/// selector. One call in flight per component; enforcement lives in the
/// callers, not here.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// List collection names reachable through the given connection string.
    /// Order is meaningful and preserved.
    async fn fetch_collections(
        &self,
        session: &Session,
        connection_string: &str,
    ) -> Result<Vec<String>, GatewayError>;

    /// Kick off a one-shot sync of the selected collections.
    async fn run_sync(
        &self,
        session: &Session,
        connection_string: &str,
        collections: &BTreeSet<String>,
    ) -> Result<SyncReport, GatewayError>;

    /// Fetch the current token quota for the subject.
    async fn fetch_quota(
        &self,
        session: &Session,
        subject_id: &str,
    ) -> Result<TokenQuota, GatewayError>;

    /// Upload a CSV knowledge-base file for ingestion.
    async fn upload_knowledge_base(
        &self,
        session: &Session,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadReceipt, GatewayError>;

    /// Record a pending plan selection. Best effort; settlement stays manual
    /// and out of band.
    async fn submit_plan_selection(
        &self,
        session: &Session,
        intent: &PaymentIntent,
    ) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let e = GatewayError::api(502, "upstream unavailable");
        assert_eq!(e.to_string(), "Backend error (502): upstream unavailable");
        assert!(!e.is_auth());
        assert!(GatewayError::AuthRequired.is_auth());
    }

    #[tokio::test]
    async fn test_upload_capability_records_file_and_size() {
        use crate::core::workflow::tests::MockGateway;
        use std::sync::atomic::Ordering;

        let gateway = MockGateway::default();
        let session = Session::new("sub-1", "Acme", "ops@acme.test", "tok");

        let receipt = gateway
            .upload_knowledge_base(&session, "customers.csv", vec![0; 512])
            .await
            .unwrap();
        assert!(receipt.accepted);
        assert_eq!(gateway.upload_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            gateway.last_upload.lock().unwrap().clone().unwrap(),
            ("customers.csv".to_string(), 512)
        );
    }

    #[test]
    fn test_sync_report_json() {
        let json = r#"{"accepted":true,"chunks":15,"message":"Database synced successfully"}"#;
        let report: SyncReport = serde_json::from_str(json).unwrap();
        assert!(report.accepted);
        assert_eq!(report.chunks, 15);
    }
}

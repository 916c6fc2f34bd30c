//! Token quota snapshot and on-demand monitor
//!
//! The monitor fetches a quota snapshot once per explicit `refresh()` call
//! (view entry, post-sync) - no timers, no background polling. Until the
//! first successful refresh the snapshot is unknown, which consumers must
//! not read as "zero usage".

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::{BackendGateway, GatewayError, Session};

/// Quota snapshot as reported by the metering service.
///
/// `active` is authoritative: the server may pause an account for reasons
/// other than exhaustion (suspended billing), so activation gating never
/// derives from the numeric balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenQuota {
    /// Tokens still available in the current allowance
    pub available: u64,
    /// Allowance ceiling
    pub max: u64,
    /// Server-reported activation flag, ground truth for gating
    pub active: bool,
    /// Subscription plan label, if the server reports one
    pub plan: Option<String>,
}

impl TokenQuota {
    /// Tokens consumed so far.
    pub fn used(&self) -> u64 {
        self.max.saturating_sub(self.available)
    }

    /// Fraction of the allowance consumed, in `0.0..=1.0`.
    pub fn usage_ratio(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        self.used() as f64 / self.max as f64
    }
}

/// On-demand quota monitor.
///
/// Owns nothing but its latest snapshot; never mutates session or workflow
/// state.
pub struct QuotaMonitor {
    gateway: Arc<dyn BackendGateway>,
    snapshot: Option<TokenQuota>,
}

impl QuotaMonitor {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            gateway,
            snapshot: None,
        }
    }

    /// Fetch a fresh snapshot. On failure the previous snapshot (or the
    /// unknown sentinel) is kept as-is.
    pub async fn refresh(&mut self, session: &Session) -> Result<TokenQuota, GatewayError> {
        let quota = self
            .gateway
            .fetch_quota(session, &session.subject_id)
            .await?;

        tracing::debug!(
            available = quota.available,
            max = quota.max,
            active = quota.active,
            "Quota refreshed"
        );

        self.snapshot = Some(quota.clone());
        Ok(quota)
    }

    /// Latest snapshot; `None` means not yet known, not zero usage.
    pub fn snapshot(&self) -> Option<&TokenQuota> {
        self.snapshot.as_ref()
    }

    /// Whether the assistant may process requests. Unknown counts as
    /// inactive until a snapshot arrives.
    pub fn is_active(&self) -> bool {
        self.snapshot.as_ref().map(|q| q.active).unwrap_or(false)
    }

    /// Upsell trigger: the quota is known and the server has deactivated it.
    pub fn needs_upsell(&self) -> bool {
        matches!(self.snapshot.as_ref(), Some(q) if !q.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workflow::tests::MockGateway;

    fn session() -> Session {
        Session::new("sub-1", "Acme", "ops@acme.test", "tok")
    }

    fn quota(available: u64, max: u64, active: bool) -> TokenQuota {
        TokenQuota {
            available,
            max,
            active,
            plan: None,
        }
    }

    #[test]
    fn test_used_and_ratio() {
        let q = quota(5000, 50000, true);
        assert_eq!(q.used(), 45000);
        assert!((q.usage_ratio() - 0.9).abs() < f64::EPSILON);
        // Display side: 10% of the allowance remains
        assert!(((1.0 - q.usage_ratio()) - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_used_saturates() {
        // Server may report available > max transiently after a top-up
        let q = quota(60000, 50000, true);
        assert_eq!(q.used(), 0);
    }

    #[test]
    fn test_ratio_zero_max() {
        let q = quota(0, 0, false);
        assert_eq!(q.usage_ratio(), 0.0);
    }

    #[test]
    fn test_unknown_sentinel_is_not_zero_usage() {
        let monitor = QuotaMonitor::new(Arc::new(MockGateway::default()));
        assert!(monitor.snapshot().is_none());
        assert!(!monitor.is_active());
        // Unknown must not trigger the upsell either
        assert!(!monitor.needs_upsell());
    }

    #[test]
    fn test_refresh_stores_snapshot() {
        let gateway = Arc::new(MockGateway::default().with_quota(quota(5000, 50000, true)));
        let mut monitor = QuotaMonitor::new(gateway);

        let snap = tokio_test::block_on(monitor.refresh(&session())).unwrap();
        assert_eq!(snap.used(), 45000);
        assert!(monitor.is_active());
        assert!(!monitor.needs_upsell());
    }

    #[tokio::test]
    async fn test_inactive_flag_overrides_balance() {
        // active=false suppresses readiness even with tokens left
        let gateway = Arc::new(MockGateway::default().with_quota(quota(12000, 50000, false)));
        let mut monitor = QuotaMonitor::new(gateway);
        monitor.refresh(&session()).await.unwrap();

        assert!(!monitor.is_active());
        assert!(monitor.needs_upsell());
        assert_eq!(monitor.snapshot().unwrap().available, 12000);
    }

    #[tokio::test]
    async fn test_active_with_zero_balance_stays_accessible() {
        let gateway = Arc::new(MockGateway::default().with_quota(quota(0, 50000, true)));
        let mut monitor = QuotaMonitor::new(gateway);
        monitor.refresh(&session()).await.unwrap();

        assert!(monitor.is_active());
        assert!(!monitor.needs_upsell());
        assert_eq!(monitor.snapshot().unwrap().available, 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let gateway = Arc::new(
            MockGateway::default()
                .with_quota(quota(5000, 50000, true))
                .fail_quota_after(1),
        );
        let mut monitor = QuotaMonitor::new(gateway);

        monitor.refresh(&session()).await.unwrap();
        assert!(monitor.refresh(&session()).await.is_err());
        // Stale-but-known beats unknown
        assert_eq!(monitor.snapshot().unwrap().available, 5000);
    }
}

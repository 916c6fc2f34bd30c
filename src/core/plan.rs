//! Subscription plan catalog and payment intents
//!
//! Plans are static reference data. Choosing one constructs a payment intent
//! only; settlement is a manual bank transfer confirmed over the support
//! channel, so activation is observed later through a fresh quota refresh,
//! never here.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A subscription tier.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPlan {
    pub id: &'static str,
    pub name: &'static str,
    pub price_usd: u32,
    /// Monthly token allowance granted on settlement
    pub token_allowance: u64,
    pub features: &'static [&'static str],
    pub is_recommended: bool,
}

/// A recorded but unresolved upgrade request, pending external settlement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntent {
    pub plan_id: String,
    pub amount_due: u32,
    pub created_at: DateTime<Utc>,
}

static PLANS: &[SubscriptionPlan] = &[
    SubscriptionPlan {
        id: "starter",
        name: "Starter",
        price_usd: 19,
        token_allowance: 100_000,
        features: &["100k tokens / month", "1 connected database", "Email support"],
        is_recommended: false,
    },
    SubscriptionPlan {
        id: "professional",
        name: "Professional",
        price_usd: 49,
        token_allowance: 500_000,
        features: &[
            "500k tokens / month",
            "Unlimited connected databases",
            "Priority sync queue",
            "Priority support",
        ],
        is_recommended: true,
    },
    SubscriptionPlan {
        id: "enterprise",
        name: "Enterprise",
        price_usd: 199,
        token_allowance: 2_000_000,
        features: &[
            "2M tokens / month",
            "Unlimited connected databases",
            "Dedicated sync workers",
            "Dedicated account manager",
        ],
        is_recommended: false,
    },
];

/// The fixed, ordered plan catalog.
pub fn plan_catalog() -> &'static [SubscriptionPlan] {
    PLANS
}

/// Look up a plan by id (case-insensitive).
pub fn find_plan(id: &str) -> Option<&'static SubscriptionPlan> {
    let id = id.to_lowercase();
    PLANS.iter().find(|p| p.id == id)
}

/// Record the choice of a plan. Pure construction: no network effect and no
/// quota mutation.
pub fn choose_plan(plan: &SubscriptionPlan) -> PaymentIntent {
    PaymentIntent {
        plan_id: plan.id.to_string(),
        amount_due: plan.price_usd,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workflow::tests::MockGateway;
    use crate::core::QuotaMonitor;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[test]
    fn test_catalog_is_ordered_and_fixed() {
        let ids: Vec<&str> = plan_catalog().iter().map(|p| p.id).collect();
        assert_eq!(ids, ["starter", "professional", "enterprise"]);
    }

    #[test]
    fn test_exactly_one_recommended_plan() {
        let recommended: Vec<&str> = plan_catalog()
            .iter()
            .filter(|p| p.is_recommended)
            .map(|p| p.id)
            .collect();
        assert_eq!(recommended, ["professional"]);
    }

    #[test]
    fn test_find_plan() {
        assert_eq!(find_plan("professional").unwrap().price_usd, 49);
        assert_eq!(find_plan("Professional").unwrap().id, "professional");
        assert!(find_plan("platinum").is_none());
    }

    #[test]
    fn test_choose_professional_derives_amount_from_price() {
        let plan = find_plan("professional").unwrap();
        let intent = choose_plan(plan);
        assert_eq!(intent.plan_id, "professional");
        assert_eq!(intent.amount_due, 49);
    }

    #[test]
    fn test_choose_plan_touches_neither_network_nor_quota() {
        let gateway = Arc::new(MockGateway::default());
        let monitor = QuotaMonitor::new(gateway.clone());

        let intent = choose_plan(find_plan("professional").unwrap());
        assert_eq!(intent.amount_due, 49);

        assert_eq!(gateway.plan_calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.quota_calls.load(Ordering::SeqCst), 0);
        assert!(monitor.snapshot().is_none());
    }
}

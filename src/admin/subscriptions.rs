/// Subscription Administration
use crate::entity::{
    aggregate::{count_status, rate, round1, sum_where},
    format_currency, Record, StatusStyle, StatusTag, Transition, TransitionInput,
};
use crate::error::HubResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
    Expired,
    PastDue,
}

impl StatusTag for SubscriptionStatus {
    const KIND: &'static str = "subscription status";
    const ALL: &'static [Self] = &[
        Self::Active,
        Self::Paused,
        Self::Cancelled,
        Self::Expired,
        Self::PastDue,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::PastDue => "past_due",
        }
    }

    fn style(&self) -> StatusStyle {
        match self {
            Self::Active => StatusStyle::new("green", "check-circle"),
            Self::Paused => StatusStyle::new("yellow", "pause-circle"),
            Self::Cancelled => StatusStyle::new("red", "x-circle"),
            Self::Expired => StatusStyle::new("gray", "clock"),
            Self::PastDue => StatusStyle::new("orange", "alert-triangle"),
        }
    }
}

/// Subscription plan tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Starter,
    Professional,
    Enterprise,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Professional => "professional",
            Plan::Enterprise => "enterprise",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }

    pub fn period(&self) -> Duration {
        match self {
            BillingCycle::Monthly => Duration::days(30),
            BillingCycle::Yearly => Duration::days(365),
        }
    }
}

/// Subscription record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub plan: Plan,
    pub billing_cycle: BillingCycle,
    pub amount: f64,
    pub currency: String,
    pub status: SubscriptionStatus,
    pub auto_renew: bool,
    pub current_period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paused_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
}

impl Subscription {
    /// Amount normalized to one month
    pub fn monthly_amount(&self) -> f64 {
        match self.billing_cycle {
            BillingCycle::Monthly => self.amount,
            BillingCycle::Yearly => self.amount / 12.0,
        }
    }

    /// The billing period has ended and will not roll over
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        !self.auto_renew && self.current_period_end < now
    }
}

fn mark_paused(sub: &mut Subscription, input: &TransitionInput) {
    sub.paused_at = Some(input.at);
}

fn mark_resumed(sub: &mut Subscription, _input: &TransitionInput) {
    sub.paused_at = None;
}

fn mark_cancelled(sub: &mut Subscription, input: &TransitionInput) {
    sub.cancelled_at = Some(input.at);
    sub.cancel_reason = input.reason.clone();
    sub.auto_renew = false;
}

static TRANSITIONS: &[Transition<Subscription>] = &[
    Transition {
        action: "pause",
        from: &[SubscriptionStatus::Active],
        to: SubscriptionStatus::Paused,
        requires_reason: false,
        notice: "Subscription paused",
        effect: Some(mark_paused),
    },
    Transition {
        action: "resume",
        from: &[SubscriptionStatus::Paused],
        to: SubscriptionStatus::Active,
        requires_reason: false,
        notice: "Subscription resumed",
        effect: Some(mark_resumed),
    },
    Transition {
        action: "mark_past_due",
        from: &[SubscriptionStatus::Active],
        to: SubscriptionStatus::PastDue,
        requires_reason: false,
        notice: "Subscription marked past due",
        effect: None,
    },
    Transition {
        action: "settle",
        from: &[SubscriptionStatus::PastDue],
        to: SubscriptionStatus::Active,
        requires_reason: false,
        notice: "Subscription payment settled",
        effect: None,
    },
    Transition {
        action: "cancel",
        from: &[
            SubscriptionStatus::Active,
            SubscriptionStatus::Paused,
            SubscriptionStatus::PastDue,
        ],
        to: SubscriptionStatus::Cancelled,
        requires_reason: false,
        notice: "Subscription cancelled",
        effect: Some(mark_cancelled),
    },
    Transition {
        action: "expire",
        from: &[SubscriptionStatus::Active, SubscriptionStatus::PastDue],
        to: SubscriptionStatus::Expired,
        requires_reason: false,
        notice: "Subscription expired",
        effect: None,
    },
];

/// Dashboard figures for the subscriptions screen
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSummary {
    pub active: usize,
    pub monthly_recurring_revenue: f64,
    pub monthly_recurring_revenue_display: String,
    pub churn_rate: f64,
}

impl Record for Subscription {
    type Status = SubscriptionStatus;
    type Summary = SubscriptionSummary;

    const ENTITY: &'static str = "subscription";
    const COLLECTION: &'static str = "subscriptions";
    const FACETS: &'static [&'static str] = &["plan", "billing_cycle"];
    const REVERSIBLE: &'static [(&'static str, &'static str)] =
        &[("pause", "resume"), ("mark_past_due", "settle")];

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> SubscriptionStatus {
        self.status
    }

    fn set_status(&mut self, status: SubscriptionStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.customer_name.as_str(),
            self.customer_email.as_str(),
            self.plan.as_str(),
            self.id.as_str(),
        ]
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "plan" => Some(self.plan.as_str()),
            "billing_cycle" => Some(self.billing_cycle.as_str()),
            _ => None,
        }
    }

    fn transitions() -> &'static [Transition<Self>] {
        TRANSITIONS
    }

    fn summarize(records: &[Self]) -> SubscriptionSummary {
        let mrr = sum_where(
            records,
            |s| s.status == SubscriptionStatus::Active,
            Subscription::monthly_amount,
        );
        let churned = count_status(records, SubscriptionStatus::Cancelled)
            + count_status(records, SubscriptionStatus::Expired);

        SubscriptionSummary {
            active: count_status(records, SubscriptionStatus::Active),
            monthly_recurring_revenue: mrr,
            monthly_recurring_revenue_display: format_currency(mrr, "USD"),
            churn_rate: round1(rate(churned, records.len())),
        }
    }

    fn mock_data(now: DateTime<Utc>) -> Vec<Self> {
        let sub = |id: &str,
                   name: &str,
                   email: &str,
                   plan: Plan,
                   cycle: BillingCycle,
                   amount: f64,
                   status: SubscriptionStatus,
                   age_days: i64| Subscription {
            id: id.to_string(),
            customer_name: name.to_string(),
            customer_email: email.to_string(),
            plan,
            billing_cycle: cycle,
            amount,
            currency: "USD".to_string(),
            status,
            auto_renew: status == SubscriptionStatus::Active,
            current_period_end: now - Duration::days(age_days) + cycle.period(),
            created_at: now - Duration::days(age_days),
            updated_at: now - Duration::days(age_days / 2),
            paused_at: (status == SubscriptionStatus::Paused).then(|| now - Duration::days(3)),
            cancelled_at: (status == SubscriptionStatus::Cancelled)
                .then(|| now - Duration::days(10)),
            cancel_reason: None,
        };

        vec![
            sub(
                "sub_001",
                "Acme Corporation",
                "billing@acme.com",
                Plan::Enterprise,
                BillingCycle::Yearly,
                4788.0,
                SubscriptionStatus::Active,
                120,
            ),
            sub(
                "sub_002",
                "Globex Inc",
                "accounts@globex.io",
                Plan::Professional,
                BillingCycle::Monthly,
                99.0,
                SubscriptionStatus::Paused,
                45,
            ),
            sub(
                "sub_003",
                "Initech",
                "finance@initech.com",
                Plan::Starter,
                BillingCycle::Monthly,
                29.0,
                SubscriptionStatus::Active,
                12,
            ),
            sub(
                "sub_004",
                "Umbrella Labs",
                "ops@umbrella-labs.com",
                Plan::Professional,
                BillingCycle::Yearly,
                990.0,
                SubscriptionStatus::PastDue,
                400,
            ),
            sub(
                "sub_005",
                "Stark Studios",
                "hello@starkstudios.co",
                Plan::Starter,
                BillingCycle::Monthly,
                29.0,
                SubscriptionStatus::Cancelled,
                90,
            ),
            sub(
                "sub_006",
                "Wayne Ventures",
                "it@wayneventures.com",
                Plan::Enterprise,
                BillingCycle::Monthly,
                399.0,
                SubscriptionStatus::Expired,
                200,
            ),
        ]
    }
}

/// Payload for creating a subscription
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSubscription {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    pub plan: Plan,
    pub billing_cycle: BillingCycle,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    #[validate(length(equal = 3))]
    #[serde(default = "crate::admin::default_currency")]
    pub currency: String,
    #[serde(default = "default_auto_renew")]
    pub auto_renew: bool,
}

fn default_auto_renew() -> bool {
    true
}

impl NewSubscription {
    pub fn into_record(self, now: DateTime<Utc>) -> HubResult<Subscription> {
        self.validate()?;

        Ok(Subscription {
            id: format!("sub_{}", uuid::Uuid::new_v4().simple()),
            customer_name: self.customer_name.trim().to_string(),
            customer_email: self.customer_email,
            plan: self.plan,
            billing_cycle: self.billing_cycle,
            amount: self.amount,
            currency: self.currency.to_uppercase(),
            status: SubscriptionStatus::Active,
            auto_renew: self.auto_renew,
            current_period_end: now + self.billing_cycle.period(),
            created_at: now,
            updated_at: now,
            paused_at: None,
            cancelled_at: None,
            cancel_reason: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::transition::apply;

    #[test]
    fn test_status_round_trip_and_styles() {
        for status in SubscriptionStatus::ALL {
            assert_eq!(
                SubscriptionStatus::parse(status.as_str()).unwrap(),
                *status
            );
        }
        assert_eq!(
            SubscriptionStatus::parse("PAST_DUE").unwrap(),
            SubscriptionStatus::PastDue
        );
        assert!(SubscriptionStatus::parse("frozen").is_err());
        assert_eq!(SubscriptionStatus::Active.style().color, "green");
    }

    #[test]
    fn test_pause_and_resume_stamp_timestamps() {
        let mut sub = Subscription::mock_data(Utc::now()).remove(0);
        let paused_at = Utc::now();
        apply(
            &mut sub,
            "pause",
            &TransitionInput::new("admin", None, paused_at),
        )
        .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Paused);
        assert_eq!(sub.paused_at, Some(paused_at));
        assert_eq!(sub.updated_at, paused_at);

        apply(&mut sub, "resume", &TransitionInput::new("admin", None, Utc::now())).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.paused_at.is_none());
    }

    #[test]
    fn test_cancel_keeps_optional_reason() {
        let mut sub = Subscription::mock_data(Utc::now()).remove(0);
        apply(
            &mut sub,
            "cancel",
            &TransitionInput::new("admin", Some("Switching vendor".into()), Utc::now()),
        )
        .unwrap();
        assert_eq!(sub.cancel_reason.as_deref(), Some("Switching vendor"));
        assert!(!sub.auto_renew);
        assert!(sub.cancelled_at.is_some());
    }

    #[test]
    fn test_summary_uses_monthly_normalized_revenue() {
        let subs = Subscription::mock_data(Utc::now());
        let summary = Subscription::summarize(&subs);
        // 4788/12 + 29
        assert_eq!(summary.monthly_recurring_revenue, 428.0);
        assert_eq!(summary.monthly_recurring_revenue_display, "$428.00");
        assert_eq!(summary.active, 2);
        // 2 churned out of 6
        assert_eq!(summary.churn_rate, 33.3);
    }

    #[test]
    fn test_new_subscription_validation() {
        let input = NewSubscription {
            customer_name: "Hooli".into(),
            customer_email: "not-an-email".into(),
            plan: Plan::Starter,
            billing_cycle: BillingCycle::Monthly,
            amount: 29.0,
            currency: "usd".into(),
            auto_renew: true,
        };
        assert!(input.clone().into_record(Utc::now()).is_err());

        let valid = NewSubscription {
            customer_email: "it@hooli.com".into(),
            ..input
        };
        let sub = valid.into_record(Utc::now()).unwrap();
        assert!(sub.id.starts_with("sub_"));
        assert_eq!(sub.currency, "USD");
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }
}

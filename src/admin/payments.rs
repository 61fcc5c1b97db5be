/// Payment Administration
use crate::entity::{
    aggregate::{count_status, rate, round1, sum_where},
    format_currency, Record, StatusStyle, StatusTag, Transition, TransitionInput,
};
use crate::error::HubResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Refunded,
}

impl StatusTag for PaymentStatus {
    const KIND: &'static str = "payment status";
    const ALL: &'static [Self] = &[
        Self::Pending,
        Self::Processing,
        Self::Success,
        Self::Failed,
        Self::Refunded,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    fn style(&self) -> StatusStyle {
        match self {
            Self::Pending => StatusStyle::new("yellow", "clock"),
            Self::Processing => StatusStyle::new("blue", "loader"),
            Self::Success => StatusStyle::new("green", "check-circle"),
            Self::Failed => StatusStyle::new("red", "x-circle"),
            Self::Refunded => StatusStyle::new("purple", "rotate-ccw"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    Paypal,
    Crypto,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Crypto => "crypto",
        }
    }
}

/// Payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub description: String,
    pub amount: f64,
    pub currency: String,
    pub method: PaymentMethod,
    pub invoice_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub refund_reason: Option<String>,
}

fn mark_processed(payment: &mut Payment, input: &TransitionInput) {
    payment.processed_at = Some(input.at);
    payment.failure_reason = None;
}

fn mark_failed(payment: &mut Payment, input: &TransitionInput) {
    payment.failure_reason = input.reason.clone();
}

fn mark_retried(payment: &mut Payment, _input: &TransitionInput) {
    payment.failure_reason = None;
    payment.processed_at = None;
}

fn mark_refunded(payment: &mut Payment, input: &TransitionInput) {
    payment.refunded_at = Some(input.at);
    payment.refund_reason = input.reason.clone();
}

static TRANSITIONS: &[Transition<Payment>] = &[
    Transition {
        action: "process",
        from: &[PaymentStatus::Pending],
        to: PaymentStatus::Processing,
        requires_reason: false,
        notice: "Payment processing",
        effect: None,
    },
    Transition {
        action: "complete",
        from: &[PaymentStatus::Pending, PaymentStatus::Processing],
        to: PaymentStatus::Success,
        requires_reason: false,
        notice: "Payment completed",
        effect: Some(mark_processed),
    },
    Transition {
        action: "fail",
        from: &[PaymentStatus::Pending, PaymentStatus::Processing],
        to: PaymentStatus::Failed,
        requires_reason: true,
        notice: "Payment marked as failed",
        effect: Some(mark_failed),
    },
    Transition {
        action: "retry",
        from: &[PaymentStatus::Failed],
        to: PaymentStatus::Pending,
        requires_reason: false,
        notice: "Payment queued for retry",
        effect: Some(mark_retried),
    },
    Transition {
        action: "refund",
        from: &[PaymentStatus::Success],
        to: PaymentStatus::Refunded,
        requires_reason: true,
        notice: "Payment refunded",
        effect: Some(mark_refunded),
    },
];

/// Dashboard figures for the payments screen
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSummary {
    pub processed_volume: f64,
    pub processed_volume_display: String,
    pub refunded_volume: f64,
    pub success_rate: f64,
    pub pending: usize,
    pub failed: usize,
}

impl Record for Payment {
    type Status = PaymentStatus;
    type Summary = PaymentSummary;

    const ENTITY: &'static str = "payment";
    const COLLECTION: &'static str = "payments";
    const FACETS: &'static [&'static str] = &["method", "currency"];
    const REVERSIBLE: &'static [(&'static str, &'static str)] =
        &[("fail", "retry")];

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> PaymentStatus {
        self.status
    }

    fn set_status(&mut self, status: PaymentStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.id.as_str(),
            self.customer_name.as_str(),
            self.customer_email.as_str(),
            self.description.as_str(),
        ];
        if let Some(invoice) = &self.invoice_id {
            fields.push(invoice);
        }
        fields
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "method" => Some(self.method.as_str()),
            "currency" => Some(self.currency.as_str()),
            _ => None,
        }
    }

    fn transitions() -> &'static [Transition<Self>] {
        TRANSITIONS
    }

    fn summarize(records: &[Self]) -> PaymentSummary {
        let processed = sum_where(
            records,
            |p| p.status == PaymentStatus::Success,
            |p| p.amount,
        );
        let refunded = sum_where(
            records,
            |p| p.status == PaymentStatus::Refunded,
            |p| p.amount,
        );

        PaymentSummary {
            processed_volume: processed,
            processed_volume_display: format_currency(processed, "USD"),
            refunded_volume: refunded,
            success_rate: round1(rate(
                count_status(records, PaymentStatus::Success),
                records.len(),
            )),
            pending: count_status(records, PaymentStatus::Pending)
                + count_status(records, PaymentStatus::Processing),
            failed: count_status(records, PaymentStatus::Failed),
        }
    }

    fn mock_data(now: DateTime<Utc>) -> Vec<Self> {
        let payment = |id: &str,
                       name: &str,
                       email: &str,
                       description: &str,
                       amount: f64,
                       method: PaymentMethod,
                       status: PaymentStatus,
                       hours_ago: i64| {
            let created_at = now - Duration::hours(hours_ago);
            Payment {
                id: id.to_string(),
                customer_name: name.to_string(),
                customer_email: email.to_string(),
                description: description.to_string(),
                amount,
                currency: "USD".to_string(),
                method,
                invoice_id: None,
                status,
                created_at,
                updated_at: created_at,
                processed_at: matches!(status, PaymentStatus::Success | PaymentStatus::Refunded)
                    .then(|| created_at + Duration::minutes(2)),
                refunded_at: (status == PaymentStatus::Refunded)
                    .then(|| created_at + Duration::days(1)),
                failure_reason: (status == PaymentStatus::Failed)
                    .then(|| "Card declined".to_string()),
                refund_reason: (status == PaymentStatus::Refunded)
                    .then(|| "Duplicate charge".to_string()),
            }
        };

        vec![
            payment(
                "pay_001",
                "Acme Corporation",
                "billing@acme.com",
                "Enterprise plan - annual",
                4788.0,
                PaymentMethod::BankTransfer,
                PaymentStatus::Success,
                2,
            ),
            payment(
                "pay_002",
                "Globex Inc",
                "accounts@globex.io",
                "Professional plan - monthly",
                99.0,
                PaymentMethod::Card,
                PaymentStatus::Failed,
                5,
            ),
            payment(
                "pay_003",
                "Initech",
                "finance@initech.com",
                "Starter plan - monthly",
                29.0,
                PaymentMethod::Card,
                PaymentStatus::Success,
                26,
            ),
            payment(
                "pay_004",
                "Umbrella Labs",
                "ops@umbrella-labs.com",
                "Website redesign deposit",
                1500.0,
                PaymentMethod::Paypal,
                PaymentStatus::Pending,
                1,
            ),
            payment(
                "pay_005",
                "Stark Studios",
                "hello@starkstudios.co",
                "Starter plan - monthly",
                29.0,
                PaymentMethod::Card,
                PaymentStatus::Refunded,
                72,
            ),
        ]
    }
}

/// Payload for recording a payment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPayment {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(range(min = 0.01))]
    pub amount: f64,
    #[validate(length(equal = 3))]
    #[serde(default = "crate::admin::default_currency")]
    pub currency: String,
    pub method: PaymentMethod,
    #[serde(default)]
    pub invoice_id: Option<String>,
}

impl NewPayment {
    pub fn into_record(self, now: DateTime<Utc>) -> HubResult<Payment> {
        self.validate()?;

        Ok(Payment {
            id: format!("pay_{}", uuid::Uuid::new_v4().simple()),
            customer_name: self.customer_name.trim().to_string(),
            customer_email: self.customer_email,
            description: self.description,
            amount: self.amount,
            currency: self.currency.to_uppercase(),
            method: self.method,
            invoice_id: self.invoice_id,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
            processed_at: None,
            refunded_at: None,
            failure_reason: None,
            refund_reason: None,
        })
    }
}

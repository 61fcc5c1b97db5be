/// Invoicing
use crate::entity::{
    aggregate::{count_status, rate, round1, sum_where},
    format_currency, Record, StatusStyle, StatusTag, Transition, TransitionInput,
};
use crate::error::HubResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl StatusTag for InvoiceStatus {
    const KIND: &'static str = "invoice status";
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Sent,
        Self::Paid,
        Self::Overdue,
        Self::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    fn style(&self) -> StatusStyle {
        match self {
            Self::Draft => StatusStyle::new("gray", "file"),
            Self::Sent => StatusStyle::new("blue", "mail"),
            Self::Paid => StatusStyle::new("green", "check-circle"),
            Self::Overdue => StatusStyle::new("red", "alert-circle"),
            Self::Cancelled => StatusStyle::plain("slate"),
        }
    }
}

/// Client invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    /// Human-facing invoice number ("INV-2024-001")
    pub number: String,
    pub client_name: String,
    pub client_email: String,
    pub project: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
}

impl Invoice {
    /// Unpaid past its due date
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.status == InvoiceStatus::Sent && self.due_at < now
    }
}

fn mark_sent(invoice: &mut Invoice, input: &TransitionInput) {
    invoice.sent_at = Some(input.at);
}

fn mark_paid(invoice: &mut Invoice, input: &TransitionInput) {
    invoice.paid_at = Some(input.at);
}

fn mark_cancelled(invoice: &mut Invoice, input: &TransitionInput) {
    invoice.cancel_reason = input.reason.clone();
}

static TRANSITIONS: &[Transition<Invoice>] = &[
    Transition {
        action: "send",
        from: &[InvoiceStatus::Draft],
        to: InvoiceStatus::Sent,
        requires_reason: false,
        notice: "Invoice sent",
        effect: Some(mark_sent),
    },
    Transition {
        action: "mark_paid",
        from: &[InvoiceStatus::Sent, InvoiceStatus::Overdue],
        to: InvoiceStatus::Paid,
        requires_reason: false,
        notice: "Invoice marked as paid",
        effect: Some(mark_paid),
    },
    Transition {
        action: "mark_overdue",
        from: &[InvoiceStatus::Sent],
        to: InvoiceStatus::Overdue,
        requires_reason: false,
        notice: "Invoice marked as overdue",
        effect: None,
    },
    Transition {
        action: "cancel",
        from: &[InvoiceStatus::Draft, InvoiceStatus::Sent, InvoiceStatus::Overdue],
        to: InvoiceStatus::Cancelled,
        requires_reason: true,
        notice: "Invoice cancelled",
        effect: Some(mark_cancelled),
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceSummary {
    pub outstanding: f64,
    pub outstanding_display: String,
    pub paid_total: f64,
    pub paid_total_display: String,
    pub overdue: usize,
    /// Paid share of issued invoices (everything except drafts and cancellations)
    pub collection_rate: f64,
}

impl Record for Invoice {
    type Status = InvoiceStatus;
    type Summary = InvoiceSummary;

    const ENTITY: &'static str = "invoice";
    const COLLECTION: &'static str = "invoices";
    const FACETS: &'static [&'static str] = &["currency"];

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> InvoiceStatus {
        self.status
    }

    fn set_status(&mut self, status: InvoiceStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.number.as_str(),
            self.client_name.as_str(),
            self.client_email.as_str(),
        ];
        if let Some(project) = &self.project {
            fields.push(project);
        }
        fields
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "currency" => Some(self.currency.as_str()),
            _ => None,
        }
    }

    fn transitions() -> &'static [Transition<Self>] {
        TRANSITIONS
    }

    fn summarize(records: &[Self]) -> InvoiceSummary {
        let outstanding = sum_where(
            records,
            |i| matches!(i.status, InvoiceStatus::Sent | InvoiceStatus::Overdue),
            |i| i.amount,
        );
        let paid_total = sum_where(records, |i| i.status == InvoiceStatus::Paid, |i| i.amount);

        let paid = count_status(records, InvoiceStatus::Paid);
        let issued = paid
            + count_status(records, InvoiceStatus::Sent)
            + count_status(records, InvoiceStatus::Overdue);

        InvoiceSummary {
            outstanding,
            outstanding_display: format_currency(outstanding, "USD"),
            paid_total,
            paid_total_display: format_currency(paid_total, "USD"),
            overdue: count_status(records, InvoiceStatus::Overdue),
            collection_rate: round1(rate(paid, issued)),
        }
    }

    fn mock_data(now: DateTime<Utc>) -> Vec<Self> {
        let invoice = |id: &str,
                       number: &str,
                       client: &str,
                       email: &str,
                       project: Option<&str>,
                       amount: f64,
                       status: InvoiceStatus,
                       issued_days_ago: i64| {
            let issued_at = now - Duration::days(issued_days_ago);
            Invoice {
                id: id.to_string(),
                number: number.to_string(),
                client_name: client.to_string(),
                client_email: email.to_string(),
                project: project.map(String::from),
                amount,
                currency: "USD".to_string(),
                status,
                issued_at,
                due_at: issued_at + Duration::days(30),
                created_at: issued_at,
                updated_at: issued_at,
                sent_at: (status != InvoiceStatus::Draft).then_some(issued_at),
                paid_at: (status == InvoiceStatus::Paid).then(|| issued_at + Duration::days(12)),
                cancel_reason: (status == InvoiceStatus::Cancelled)
                    .then(|| "Project descoped".to_string()),
            }
        };

        vec![
            invoice(
                "inv_001",
                "INV-2024-001",
                "Acme Corporation",
                "billing@acme.com",
                Some("Brand refresh"),
                12_500.0,
                InvoiceStatus::Paid,
                45,
            ),
            invoice(
                "inv_002",
                "INV-2024-002",
                "Globex Inc",
                "accounts@globex.io",
                Some("E-commerce build"),
                8_750.0,
                InvoiceStatus::Sent,
                10,
            ),
            invoice(
                "inv_003",
                "INV-2024-003",
                "Umbrella Labs",
                "ops@umbrella-labs.com",
                None,
                3_200.0,
                InvoiceStatus::Overdue,
                40,
            ),
            invoice(
                "inv_004",
                "INV-2024-004",
                "Initech",
                "finance@initech.com",
                Some("Landing page"),
                1_800.0,
                InvoiceStatus::Draft,
                0,
            ),
            invoice(
                "inv_005",
                "INV-2024-005",
                "Stark Studios",
                "hello@starkstudios.co",
                None,
                950.0,
                InvoiceStatus::Cancelled,
                20,
            ),
        ]
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewInvoice {
    #[validate(length(min = 1, max = 200))]
    pub client_name: String,
    #[validate(email)]
    pub client_email: String,
    #[serde(default)]
    pub project: Option<String>,
    #[validate(range(min = 0.01))]
    pub amount: f64,
    #[validate(length(equal = 3))]
    #[serde(default = "crate::admin::default_currency")]
    pub currency: String,
    #[validate(range(min = 1, max = 365))]
    #[serde(default = "default_terms_days")]
    pub terms_days: i64,
}

fn default_terms_days() -> i64 {
    30
}

impl NewInvoice {
    pub fn into_record(self, now: DateTime<Utc>) -> HubResult<Invoice> {
        self.validate()?;

        let id = uuid::Uuid::new_v4().simple().to_string();
        Ok(Invoice {
            number: format!("INV-{}-{}", now.format("%Y"), &id[..6].to_uppercase()),
            id: format!("inv_{}", id),
            client_name: self.client_name.trim().to_string(),
            client_email: self.client_email,
            project: self.project,
            amount: self.amount,
            currency: self.currency.to_uppercase(),
            status: InvoiceStatus::Draft,
            issued_at: now,
            due_at: now + Duration::days(self.terms_days),
            created_at: now,
            updated_at: now,
            sent_at: None,
            paid_at: None,
            cancel_reason: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::transition::apply;

    #[test]
    fn test_summary() {
        let invoices = Invoice::mock_data(Utc::now());
        let summary = Invoice::summarize(&invoices);
        assert_eq!(summary.outstanding, 11_950.0);
        assert_eq!(summary.outstanding_display, "$11,950.00");
        assert_eq!(summary.paid_total_display, "$12,500.00");
        assert_eq!(summary.overdue, 1);
        // 1 paid out of 3 issued
        assert_eq!(summary.collection_rate, 33.3);
    }

    #[test]
    fn test_mark_paid_from_overdue() {
        let mut invoice = Invoice::mock_data(Utc::now()).remove(2);
        let input = TransitionInput::new("admin", None, Utc::now());
        apply(&mut invoice, "mark_paid", &input).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.paid_at, Some(input.at));
        assert!(apply(&mut invoice, "mark_paid", &input).is_err());
    }

    #[test]
    fn test_past_due_detection() {
        let now = Utc::now();
        let invoices = Invoice::mock_data(now);
        assert!(!invoices[1].is_past_due(now));
        assert!(invoices[1].is_past_due(now + Duration::days(25)));
        // already flagged overdue
        assert!(!invoices[2].is_past_due(now));
    }

    #[test]
    fn test_new_invoice_number() {
        let payload = NewInvoice {
            client_name: "Hooli".into(),
            client_email: "ap@hooli.xyz".into(),
            project: None,
            amount: 400.0,
            currency: "eur".into(),
            terms_days: 14,
        };
        let now = Utc::now();
        let invoice = payload.into_record(now).unwrap();
        assert!(invoice.number.starts_with("INV-"));
        assert_eq!(invoice.currency, "EUR");
        assert_eq!(invoice.due_at, now + Duration::days(14));
    }
}

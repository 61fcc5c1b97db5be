/// KYC Verification
///
/// Identity verification cases move from intake through manual review to a
/// decision. Approved cases can be suspended and reinstated; rejected and
/// expired cases are final.
use crate::entity::{
    aggregate::{count_status, count_where, rate, round1},
    Record, StatusStyle, StatusTag, Transition, TransitionInput,
};
use crate::error::HubResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// KYC case status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    Pending,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Expired,
    Suspended,
}

impl StatusTag for KycStatus {
    const KIND: &'static str = "KYC status";
    const ALL: &'static [Self] = &[
        Self::Pending,
        Self::Submitted,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::Expired,
        Self::Suspended,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Suspended => "suspended",
        }
    }

    fn style(&self) -> StatusStyle {
        match self {
            Self::Pending => StatusStyle::new("gray", "clock"),
            Self::Submitted => StatusStyle::new("blue", "upload"),
            Self::UnderReview => StatusStyle::new("yellow", "search"),
            Self::Approved => StatusStyle::new("green", "shield-check"),
            Self::Rejected => StatusStyle::new("red", "shield-x"),
            Self::Expired => StatusStyle::plain("slate"),
            Self::Suspended => StatusStyle::new("orange", "shield-alert"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    DriversLicense,
    NationalId,
    BusinessRegistration,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Passport => "passport",
            DocumentType::DriversLicense => "drivers_license",
            DocumentType::NationalId => "national_id",
            DocumentType::BusinessRegistration => "business_registration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// KYC verification case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycCase {
    pub id: String,
    pub applicant_name: String,
    pub applicant_email: String,
    pub document_type: DocumentType,
    /// ISO 3166-1 alpha-2
    pub country: String,
    pub risk_level: RiskLevel,
    pub status: KycStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub suspension_reason: Option<String>,
    pub notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Verified identities are valid for one year
const APPROVAL_VALIDITY_DAYS: i64 = 365;

fn mark_submitted(case: &mut KycCase, input: &TransitionInput) {
    case.submitted_at = Some(input.at);
}

fn mark_review_started(case: &mut KycCase, input: &TransitionInput) {
    case.reviewed_by = Some(input.actor.clone());
    if input.reason.is_some() {
        case.notes = input.reason.clone();
    }
}

fn mark_approved(case: &mut KycCase, input: &TransitionInput) {
    case.reviewed_at = Some(input.at);
    case.reviewed_by = Some(input.actor.clone());
    case.expires_at = Some(input.at + Duration::days(APPROVAL_VALIDITY_DAYS));
}

fn mark_rejected(case: &mut KycCase, input: &TransitionInput) {
    case.reviewed_at = Some(input.at);
    case.reviewed_by = Some(input.actor.clone());
    case.rejection_reason = input.reason.clone();
}

fn mark_suspended(case: &mut KycCase, input: &TransitionInput) {
    case.suspension_reason = input.reason.clone();
}

fn mark_reinstated(case: &mut KycCase, _input: &TransitionInput) {
    case.suspension_reason = None;
}

static TRANSITIONS: &[Transition<KycCase>] = &[
    Transition {
        action: "submit",
        from: &[KycStatus::Pending],
        to: KycStatus::Submitted,
        requires_reason: false,
        notice: "Documents submitted",
        effect: Some(mark_submitted),
    },
    Transition {
        action: "start_review",
        from: &[KycStatus::Submitted],
        to: KycStatus::UnderReview,
        requires_reason: false,
        notice: "Review started",
        effect: Some(mark_review_started),
    },
    Transition {
        action: "approve",
        from: &[KycStatus::UnderReview],
        to: KycStatus::Approved,
        requires_reason: false,
        notice: "Verification approved",
        effect: Some(mark_approved),
    },
    Transition {
        action: "reject",
        from: &[KycStatus::Submitted, KycStatus::UnderReview],
        to: KycStatus::Rejected,
        requires_reason: true,
        notice: "Verification rejected",
        effect: Some(mark_rejected),
    },
    Transition {
        action: "expire",
        from: &[KycStatus::Pending, KycStatus::Submitted],
        to: KycStatus::Expired,
        requires_reason: false,
        notice: "Verification expired",
        effect: None,
    },
    Transition {
        action: "suspend",
        from: &[KycStatus::Approved],
        to: KycStatus::Suspended,
        requires_reason: true,
        notice: "Verification suspended",
        effect: Some(mark_suspended),
    },
    Transition {
        action: "reinstate",
        from: &[KycStatus::Suspended],
        to: KycStatus::Approved,
        requires_reason: false,
        notice: "Verification reinstated",
        effect: Some(mark_reinstated),
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct KycSummary {
    /// Submitted or under review
    pub awaiting_review: usize,
    /// Approved share of decided cases
    pub approval_rate: f64,
    pub high_risk: usize,
}

impl Record for KycCase {
    type Status = KycStatus;
    type Summary = KycSummary;

    const ENTITY: &'static str = "KYC case";
    const COLLECTION: &'static str = "kyc";
    const FACETS: &'static [&'static str] = &["risk_level", "document_type", "country"];
    const REVERSIBLE: &'static [(&'static str, &'static str)] =
        &[("suspend", "reinstate")];

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> KycStatus {
        self.status
    }

    fn set_status(&mut self, status: KycStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.id.as_str(),
            self.applicant_name.as_str(),
            self.applicant_email.as_str(),
            self.country.as_str(),
        ]
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "risk_level" => Some(self.risk_level.as_str()),
            "document_type" => Some(self.document_type.as_str()),
            "country" => Some(self.country.as_str()),
            _ => None,
        }
    }

    fn transitions() -> &'static [Transition<Self>] {
        TRANSITIONS
    }

    fn summarize(records: &[Self]) -> KycSummary {
        let approved = count_status(records, KycStatus::Approved);
        let decided = approved + count_status(records, KycStatus::Rejected);

        KycSummary {
            awaiting_review: count_where(records, |c| {
                matches!(c.status, KycStatus::Submitted | KycStatus::UnderReview)
            }),
            approval_rate: round1(rate(approved, decided)),
            high_risk: count_where(records, |c| c.risk_level == RiskLevel::High),
        }
    }

    fn mock_data(now: DateTime<Utc>) -> Vec<Self> {
        let case = |id: &str,
                    name: &str,
                    email: &str,
                    document_type: DocumentType,
                    country: &str,
                    risk_level: RiskLevel,
                    status: KycStatus,
                    age_days: i64| {
            let created_at = now - Duration::days(age_days);
            let decided = matches!(
                status,
                KycStatus::Approved | KycStatus::Rejected | KycStatus::Suspended
            );
            KycCase {
                id: id.to_string(),
                applicant_name: name.to_string(),
                applicant_email: email.to_string(),
                document_type,
                country: country.to_string(),
                risk_level,
                status,
                created_at,
                updated_at: created_at,
                submitted_at: (status != KycStatus::Pending)
                    .then(|| created_at + Duration::hours(1)),
                reviewed_at: decided.then(|| created_at + Duration::days(1)),
                reviewed_by: decided.then(|| "compliance@canvashub.io".to_string()),
                rejection_reason: (status == KycStatus::Rejected)
                    .then(|| "Document photo unreadable".to_string()),
                suspension_reason: (status == KycStatus::Suspended)
                    .then(|| "Sanctions list match under investigation".to_string()),
                notes: None,
                expires_at: decided
                    .then(|| created_at + Duration::days(1 + APPROVAL_VALIDITY_DAYS)),
            }
        };

        vec![
            case(
                "kyc_001",
                "Maria Gonzalez",
                "maria@gonzalez-design.es",
                DocumentType::Passport,
                "ES",
                RiskLevel::Low,
                KycStatus::UnderReview,
                2,
            ),
            case(
                "kyc_002",
                "James Okafor",
                "james@okafor.ng",
                DocumentType::NationalId,
                "NG",
                RiskLevel::Medium,
                KycStatus::Submitted,
                1,
            ),
            case(
                "kyc_003",
                "Lena Fischer",
                "lena@fischer-studio.de",
                DocumentType::DriversLicense,
                "DE",
                RiskLevel::Low,
                KycStatus::Approved,
                40,
            ),
            case(
                "kyc_004",
                "Northwind Traders Ltd",
                "compliance@northwind.co.uk",
                DocumentType::BusinessRegistration,
                "GB",
                RiskLevel::High,
                KycStatus::Rejected,
                12,
            ),
            case(
                "kyc_005",
                "Kenji Watanabe",
                "kenji@watanabe.jp",
                DocumentType::Passport,
                "JP",
                RiskLevel::Low,
                KycStatus::Pending,
                0,
            ),
            case(
                "kyc_006",
                "Aurelio Costa",
                "aurelio@costa.br",
                DocumentType::Passport,
                "BR",
                RiskLevel::High,
                KycStatus::Suspended,
                90,
            ),
        ]
    }
}

/// Payload for opening a verification case
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewKycCase {
    #[validate(length(min = 1, max = 200))]
    pub applicant_name: String,
    #[validate(email)]
    pub applicant_email: String,
    pub document_type: DocumentType,
    #[validate(length(equal = 2))]
    pub country: String,
    #[serde(default = "default_risk_level")]
    pub risk_level: RiskLevel,
}

fn default_risk_level() -> RiskLevel {
    RiskLevel::Medium
}

impl NewKycCase {
    pub fn into_record(self, now: DateTime<Utc>) -> HubResult<KycCase> {
        self.validate()?;

        Ok(KycCase {
            id: format!("kyc_{}", uuid::Uuid::new_v4().simple()),
            applicant_name: self.applicant_name.trim().to_string(),
            applicant_email: self.applicant_email,
            document_type: self.document_type,
            country: self.country.to_uppercase(),
            risk_level: self.risk_level,
            status: KycStatus::Pending,
            created_at: now,
            updated_at: now,
            submitted_at: None,
            reviewed_at: None,
            reviewed_by: None,
            rejection_reason: None,
            suspension_reason: None,
            notes: None,
            expires_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::transition::{apply, is_terminal};
    use crate::error::HubError;

    fn input(reason: Option<&str>) -> TransitionInput {
        TransitionInput::new("reviewer@tenant", reason.map(String::from), Utc::now())
    }

    #[test]
    fn test_full_review_path() {
        let mut case = KycCase::mock_data(Utc::now()).remove(4);
        assert_eq!(case.status, KycStatus::Pending);

        apply(&mut case, "submit", &input(None)).unwrap();
        apply(&mut case, "start_review", &input(None)).unwrap();
        assert_eq!(case.reviewed_by.as_deref(), Some("reviewer@tenant"));

        let outcome = apply(&mut case, "approve", &input(None)).unwrap();
        assert_eq!(outcome.to, KycStatus::Approved);
        assert!(case.expires_at.unwrap() > case.reviewed_at.unwrap());
    }

    #[test]
    fn test_suspend_and_reinstate_are_reversible() {
        let mut case = KycCase::mock_data(Utc::now()).remove(2);
        assert_eq!(case.status, KycStatus::Approved);

        let err = apply(&mut case, "suspend", &input(Some("  "))).unwrap_err();
        assert!(matches!(err, HubError::Validation(_)));

        apply(&mut case, "suspend", &input(Some("Chargeback fraud"))).unwrap();
        assert_eq!(case.status, KycStatus::Suspended);
        apply(&mut case, "reinstate", &input(None)).unwrap();
        assert_eq!(case.status, KycStatus::Approved);
        assert!(case.suspension_reason.is_none());
    }

    #[test]
    fn test_decisions_are_final() {
        assert!(is_terminal::<KycCase>(KycStatus::Rejected));
        assert!(!is_terminal::<KycCase>(KycStatus::Approved));
        assert!(!is_terminal::<KycCase>(KycStatus::Suspended));
    }

    #[test]
    fn test_summary() {
        let cases = KycCase::mock_data(Utc::now());
        let summary = KycCase::summarize(&cases);
        assert_eq!(summary.awaiting_review, 2);
        // one approved, one rejected
        assert_eq!(summary.approval_rate, 50.0);
        assert_eq!(summary.high_risk, 2);
    }

    #[test]
    fn test_new_case_validation() {
        let payload = NewKycCase {
            applicant_name: "Ana".into(),
            applicant_email: "not-an-email".into(),
            document_type: DocumentType::Passport,
            country: "PT".into(),
            risk_level: RiskLevel::Low,
        };
        assert!(matches!(
            payload.into_record(Utc::now()),
            Err(HubError::Validation(_))
        ));
    }
}

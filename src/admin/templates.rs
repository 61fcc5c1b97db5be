/// Template Library
use crate::entity::{
    aggregate::{count_status, count_where, round1, sum_by},
    format_number, Record, StatusStyle, StatusTag, Transition, TransitionInput,
};
use crate::error::HubResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStatus {
    Draft,
    Active,
    Deprecated,
}

impl StatusTag for TemplateStatus {
    const KIND: &'static str = "template status";
    const ALL: &'static [Self] = &[Self::Draft, Self::Active, Self::Deprecated];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Deprecated => "deprecated",
        }
    }

    fn style(&self) -> StatusStyle {
        match self {
            Self::Draft => StatusStyle::plain("gray"),
            Self::Active => StatusStyle::new("green", "check"),
            Self::Deprecated => StatusStyle::new("red", "ban"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Website,
    Email,
    Invoice,
    Social,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Website => "website",
            TemplateKind::Email => "email",
            TemplateKind::Invoice => "invoice",
            TemplateKind::Social => "social",
        }
    }
}

/// Design template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    pub category: String,
    pub downloads: u64,
    /// Average user rating out of 5
    pub rating: f64,
    pub premium: bool,
    pub status: TemplateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deprecated_at: Option<DateTime<Utc>>,
}

impl Template {
    pub fn tier(&self) -> &'static str {
        if self.premium {
            "premium"
        } else {
            "free"
        }
    }
}

fn mark_activated(template: &mut Template, input: &TransitionInput) {
    template.activated_at = Some(input.at);
}

fn mark_deprecated(template: &mut Template, input: &TransitionInput) {
    template.deprecated_at = Some(input.at);
}

static TRANSITIONS: &[Transition<Template>] = &[
    Transition {
        action: "activate",
        from: &[TemplateStatus::Draft],
        to: TemplateStatus::Active,
        requires_reason: false,
        notice: "Template activated",
        effect: Some(mark_activated),
    },
    Transition {
        action: "deprecate",
        from: &[TemplateStatus::Draft, TemplateStatus::Active],
        to: TemplateStatus::Deprecated,
        requires_reason: false,
        notice: "Template deprecated",
        effect: Some(mark_deprecated),
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub total_downloads: u64,
    pub total_downloads_display: String,
    /// Mean rating of active templates
    pub average_rating: f64,
    pub premium: usize,
    pub active: usize,
}

impl Record for Template {
    type Status = TemplateStatus;
    type Summary = TemplateSummary;

    const ENTITY: &'static str = "template";
    const COLLECTION: &'static str = "templates";
    const FACETS: &'static [&'static str] = &["type", "category", "tier"];

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> TemplateStatus {
        self.status
    }

    fn set_status(&mut self, status: TemplateStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.category.as_str(),
        ]
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "type" => Some(self.kind.as_str()),
            "category" => Some(self.category.as_str()),
            "tier" => Some(self.tier()),
            _ => None,
        }
    }

    fn transitions() -> &'static [Transition<Self>] {
        TRANSITIONS
    }

    fn summarize(records: &[Self]) -> TemplateSummary {
        let total_downloads = sum_by(records, |t| t.downloads as f64) as u64;
        let active = count_status(records, TemplateStatus::Active);
        let rating_sum = records
            .iter()
            .filter(|t| t.status == TemplateStatus::Active)
            .map(|t| t.rating)
            .sum::<f64>();
        let average_rating = if active == 0 {
            0.0
        } else {
            round1(rating_sum / active as f64)
        };

        TemplateSummary {
            total_downloads,
            total_downloads_display: format_number(total_downloads),
            average_rating,
            premium: count_where(records, |t| t.premium),
            active,
        }
    }

    fn mock_data(now: DateTime<Utc>) -> Vec<Self> {
        let template = |id: &str,
                        name: &str,
                        kind: TemplateKind,
                        category: &str,
                        downloads: u64,
                        rating: f64,
                        premium: bool,
                        status: TemplateStatus| {
            let created_at = now - Duration::days(60);
            Template {
                id: id.to_string(),
                name: name.to_string(),
                description: format!("{} {} template", name, kind.as_str()),
                kind,
                category: category.to_string(),
                downloads,
                rating,
                premium,
                status,
                created_at,
                updated_at: created_at,
                activated_at: (status != TemplateStatus::Draft)
                    .then(|| created_at + Duration::days(2)),
                deprecated_at: (status == TemplateStatus::Deprecated)
                    .then(|| now - Duration::days(5)),
            }
        };

        vec![
            template(
                "tpl_001",
                "Modern Agency",
                TemplateKind::Website,
                "business",
                1_250,
                4.8,
                true,
                TemplateStatus::Active,
            ),
            template(
                "tpl_002",
                "Minimal Portfolio",
                TemplateKind::Website,
                "portfolio",
                3_400,
                4.6,
                false,
                TemplateStatus::Active,
            ),
            template(
                "tpl_003",
                "Monthly Newsletter",
                TemplateKind::Email,
                "marketing",
                870,
                4.2,
                false,
                TemplateStatus::Active,
            ),
            template(
                "tpl_004",
                "Classic Invoice",
                TemplateKind::Invoice,
                "business",
                5_100,
                3.9,
                false,
                TemplateStatus::Deprecated,
            ),
            template(
                "tpl_005",
                "Launch Carousel",
                TemplateKind::Social,
                "marketing",
                0,
                0.0,
                true,
                TemplateStatus::Draft,
            ),
        ]
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTemplate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(default)]
    pub premium: bool,
}

impl NewTemplate {
    pub fn into_record(self, now: DateTime<Utc>) -> HubResult<Template> {
        self.validate()?;

        Ok(Template {
            id: format!("tpl_{}", uuid::Uuid::new_v4().simple()),
            name: self.name.trim().to_string(),
            description: self.description,
            kind: self.kind,
            category: self.category.to_lowercase(),
            downloads: 0,
            rating: 0.0,
            premium: self.premium,
            status: TemplateStatus::Draft,
            created_at: now,
            updated_at: now,
            activated_at: None,
            deprecated_at: None,
        })
    }
}

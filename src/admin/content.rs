/// Content Management
use crate::entity::{
    aggregate::{count_status, sum_by},
    format_number, Record, StatusStyle, StatusTag, Transition, TransitionInput,
};
use crate::error::HubResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Content status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Review,
    Published,
    Archived,
}

impl StatusTag for ContentStatus {
    const KIND: &'static str = "content status";
    const ALL: &'static [Self] = &[Self::Draft, Self::Review, Self::Published, Self::Archived];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    fn style(&self) -> StatusStyle {
        match self {
            Self::Draft => StatusStyle::new("gray", "file-text"),
            Self::Review => StatusStyle::new("yellow", "eye"),
            Self::Published => StatusStyle::new("green", "globe"),
            Self::Archived => StatusStyle::new("slate", "archive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Article,
    Page,
    BlogPost,
    Video,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Page => "page",
            ContentType::BlogPost => "blog_post",
            ContentType::Video => "video",
        }
    }
}

/// Content item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub author: String,
    pub excerpt: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub category: String,
    pub views: u64,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
}

fn mark_published(item: &mut ContentItem, input: &TransitionInput) {
    item.published_at = Some(input.at);
    item.review_notes = None;
}

fn mark_changes_requested(item: &mut ContentItem, input: &TransitionInput) {
    item.review_notes = input.reason.clone();
}

fn mark_archived(item: &mut ContentItem, input: &TransitionInput) {
    item.archived_at = Some(input.at);
}

static TRANSITIONS: &[Transition<ContentItem>] = &[
    Transition {
        action: "submit",
        from: &[ContentStatus::Draft],
        to: ContentStatus::Review,
        requires_reason: false,
        notice: "Content submitted for review",
        effect: None,
    },
    Transition {
        action: "request_changes",
        from: &[ContentStatus::Review],
        to: ContentStatus::Draft,
        requires_reason: true,
        notice: "Changes requested",
        effect: Some(mark_changes_requested),
    },
    Transition {
        action: "publish",
        from: &[ContentStatus::Draft, ContentStatus::Review],
        to: ContentStatus::Published,
        requires_reason: false,
        notice: "Content published",
        effect: Some(mark_published),
    },
    Transition {
        action: "archive",
        from: &[ContentStatus::Draft, ContentStatus::Published],
        to: ContentStatus::Archived,
        requires_reason: false,
        notice: "Content archived",
        effect: Some(mark_archived),
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct ContentSummary {
    pub total_views: u64,
    pub total_views_display: String,
    pub published: usize,
    pub drafts: usize,
    pub in_review: usize,
}

impl Record for ContentItem {
    type Status = ContentStatus;
    type Summary = ContentSummary;

    const ENTITY: &'static str = "content";
    const COLLECTION: &'static str = "content";
    const FACETS: &'static [&'static str] = &["type", "category"];
    const REVERSIBLE: &'static [(&'static str, &'static str)] =
        &[("submit", "request_changes")];

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> ContentStatus {
        self.status
    }

    fn set_status(&mut self, status: ContentStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.author.as_str(),
            self.excerpt.as_str(),
            self.category.as_str(),
        ]
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "type" => Some(self.content_type.as_str()),
            "category" => Some(self.category.as_str()),
            _ => None,
        }
    }

    fn transitions() -> &'static [Transition<Self>] {
        TRANSITIONS
    }

    fn summarize(records: &[Self]) -> ContentSummary {
        let total_views = sum_by(records, |c| c.views as f64) as u64;
        ContentSummary {
            total_views,
            total_views_display: format_number(total_views),
            published: count_status(records, ContentStatus::Published),
            drafts: count_status(records, ContentStatus::Draft),
            in_review: count_status(records, ContentStatus::Review),
        }
    }

    fn mock_data(now: DateTime<Utc>) -> Vec<Self> {
        let item = |id: &str,
                    title: &str,
                    author: &str,
                    content_type: ContentType,
                    category: &str,
                    views: u64,
                    status: ContentStatus,
                    age_days: i64| {
            let created_at = now - Duration::days(age_days);
            ContentItem {
                id: id.to_string(),
                title: title.to_string(),
                author: author.to_string(),
                excerpt: format!("{} by {}", title, author),
                content_type,
                category: category.to_string(),
                views,
                status,
                created_at,
                updated_at: created_at,
                published_at: matches!(status, ContentStatus::Published | ContentStatus::Archived)
                    .then(|| created_at + Duration::days(1)),
                archived_at: (status == ContentStatus::Archived).then(|| now - Duration::days(2)),
                review_notes: None,
            }
        };

        vec![
            item(
                "cnt_001",
                "Getting Started with Canvas Hub",
                "Sarah Chen",
                ContentType::Article,
                "guides",
                15_420,
                ContentStatus::Published,
                30,
            ),
            item(
                "cnt_002",
                "Pricing",
                "Marketing Team",
                ContentType::Page,
                "marketing",
                8_950,
                ContentStatus::Published,
                90,
            ),
            item(
                "cnt_003",
                "Designing Accessible Landing Pages",
                "Diego Alvarez",
                ContentType::BlogPost,
                "design",
                0,
                ContentStatus::Review,
                3,
            ),
            item(
                "cnt_004",
                "Q3 Product Walkthrough",
                "Priya Natarajan",
                ContentType::Video,
                "product",
                0,
                ContentStatus::Draft,
                1,
            ),
            item(
                "cnt_005",
                "Legacy Invoicing FAQ",
                "Support Team",
                ContentType::Article,
                "guides",
                2_310,
                ContentStatus::Archived,
                400,
            ),
        ]
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewContentItem {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub author: String,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub excerpt: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
}

impl NewContentItem {
    pub fn into_record(self, now: DateTime<Utc>) -> HubResult<ContentItem> {
        self.validate()?;

        Ok(ContentItem {
            id: format!("cnt_{}", uuid::Uuid::new_v4().simple()),
            title: self.title.trim().to_string(),
            author: self.author,
            excerpt: self.excerpt,
            content_type: self.content_type,
            category: self.category.to_lowercase(),
            views: 0,
            status: ContentStatus::Draft,
            created_at: now,
            updated_at: now,
            published_at: None,
            archived_at: None,
            review_notes: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{transition::apply, FilterState};

    #[test]
    fn test_summary_formats_views() {
        let items = ContentItem::mock_data(Utc::now());
        let summary = ContentItem::summarize(&items);
        assert_eq!(summary.total_views, 26_680);
        assert_eq!(summary.total_views_display, "26.7K");
        assert_eq!(summary.published, 2);
    }

    #[test]
    fn test_type_and_category_facets() {
        let items = ContentItem::mock_data(Utc::now());
        let guides = FilterState::new()
            .facet("category", "guides")
            .facet("type", "article")
            .apply(&items);
        assert_eq!(guides.len(), 2);

        let published_guides = FilterState::new()
            .facet("category", "guides")
            .status(ContentStatus::Published)
            .apply(&items);
        assert_eq!(published_guides.len(), 1);
        assert_eq!(published_guides[0].id, "cnt_001");
    }

    #[test]
    fn test_review_workflow() {
        let mut item = ContentItem::mock_data(Utc::now()).remove(3);
        assert_eq!(item.status, ContentStatus::Draft);

        apply(&mut item, "submit", &TransitionInput::new("editor", None, Utc::now())).unwrap();
        assert!(apply(
            &mut item,
            "request_changes",
            &TransitionInput::new("editor", None, Utc::now())
        )
        .is_err());
        apply(
            &mut item,
            "request_changes",
            &TransitionInput::new("editor", Some("Add captions".into()), Utc::now()),
        )
        .unwrap();
        assert_eq!(item.status, ContentStatus::Draft);
        assert_eq!(item.review_notes.as_deref(), Some("Add captions"));

        apply(&mut item, "publish", &TransitionInput::new("editor", None, Utc::now())).unwrap();
        assert!(item.published_at.is_some());
        assert!(item.review_notes.is_none());
    }
}

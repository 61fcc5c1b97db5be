/// Notification Management
use crate::entity::{
    aggregate::{count_status, rate, round1, sum_by},
    format_number, Record, StatusStyle, StatusTag, Transition, TransitionInput,
};
use crate::error::{HubError, HubResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Notification campaign status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
    Cancelled,
}

impl StatusTag for NotificationStatus {
    const KIND: &'static str = "notification status";
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Scheduled,
        Self::Sending,
        Self::Sent,
        Self::Failed,
        Self::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    fn style(&self) -> StatusStyle {
        match self {
            Self::Draft => StatusStyle::new("gray", "edit"),
            Self::Scheduled => StatusStyle::new("blue", "calendar"),
            Self::Sending => StatusStyle::new("yellow", "send"),
            Self::Sent => StatusStyle::new("green", "check-circle"),
            Self::Failed => StatusStyle::new("red", "alert-triangle"),
            Self::Cancelled => StatusStyle::plain("slate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Push,
    Sms,
    InApp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Push => "push",
            Channel::Sms => "sms",
            Channel::InApp => "in_app",
        }
    }
}

/// Notification campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub channel: Channel,
    /// Audience segment ("all_users", "admins", "trial_users", ...)
    pub audience: String,
    pub recipients: u64,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

fn mark_scheduled(notification: &mut Notification, input: &TransitionInput) {
    if notification.scheduled_for.is_none() {
        notification.scheduled_for = Some(input.at + Duration::hours(1));
    }
}

fn mark_sent(notification: &mut Notification, input: &TransitionInput) {
    notification.sent_at = Some(input.at);
    notification.failure_reason = None;
}

fn mark_failed(notification: &mut Notification, input: &TransitionInput) {
    notification.failure_reason = input.reason.clone();
}

static TRANSITIONS: &[Transition<Notification>] = &[
    Transition {
        action: "schedule",
        from: &[NotificationStatus::Draft],
        to: NotificationStatus::Scheduled,
        requires_reason: false,
        notice: "Notification scheduled",
        effect: Some(mark_scheduled),
    },
    Transition {
        action: "send",
        from: &[
            NotificationStatus::Draft,
            NotificationStatus::Scheduled,
            NotificationStatus::Failed,
        ],
        to: NotificationStatus::Sending,
        requires_reason: false,
        notice: "Notification sending",
        effect: None,
    },
    Transition {
        action: "mark_sent",
        from: &[NotificationStatus::Sending],
        to: NotificationStatus::Sent,
        requires_reason: false,
        notice: "Notification delivered",
        effect: Some(mark_sent),
    },
    Transition {
        action: "fail",
        from: &[NotificationStatus::Sending],
        to: NotificationStatus::Failed,
        requires_reason: true,
        notice: "Notification failed",
        effect: Some(mark_failed),
    },
    Transition {
        action: "cancel",
        from: &[NotificationStatus::Draft, NotificationStatus::Scheduled],
        to: NotificationStatus::Cancelled,
        requires_reason: false,
        notice: "Notification cancelled",
        effect: None,
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct NotificationSummary {
    pub total_recipients: u64,
    pub total_recipients_display: String,
    /// Sent share of attempted deliveries (sent + failed)
    pub delivery_rate: f64,
    pub scheduled: usize,
}

impl Record for Notification {
    type Status = NotificationStatus;
    type Summary = NotificationSummary;

    const ENTITY: &'static str = "notification";
    const COLLECTION: &'static str = "notifications";
    const FACETS: &'static [&'static str] = &["channel", "audience"];
    const REVERSIBLE: &'static [(&'static str, &'static str)] =
        &[("fail", "send")];

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> NotificationStatus {
        self.status
    }

    fn set_status(&mut self, status: NotificationStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.message.as_str(),
            self.audience.as_str(),
        ]
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "channel" => Some(self.channel.as_str()),
            "audience" => Some(self.audience.as_str()),
            _ => None,
        }
    }

    fn transitions() -> &'static [Transition<Self>] {
        TRANSITIONS
    }

    fn summarize(records: &[Self]) -> NotificationSummary {
        let total_recipients = sum_by(records, |n| n.recipients as f64) as u64;
        let sent = count_status(records, NotificationStatus::Sent);
        let failed = count_status(records, NotificationStatus::Failed);

        NotificationSummary {
            total_recipients,
            total_recipients_display: format_number(total_recipients),
            delivery_rate: round1(rate(sent, sent + failed)),
            scheduled: count_status(records, NotificationStatus::Scheduled),
        }
    }

    fn mock_data(now: DateTime<Utc>) -> Vec<Self> {
        let notification = |id: &str,
                            title: &str,
                            message: &str,
                            channel: Channel,
                            audience: &str,
                            recipients: u64,
                            status: NotificationStatus| {
            let created_at = now - Duration::days(3);
            Notification {
                id: id.to_string(),
                title: title.to_string(),
                message: message.to_string(),
                channel,
                audience: audience.to_string(),
                recipients,
                status,
                created_at,
                updated_at: created_at,
                scheduled_for: (status == NotificationStatus::Scheduled)
                    .then(|| now + Duration::days(1)),
                sent_at: (status == NotificationStatus::Sent)
                    .then(|| created_at + Duration::hours(2)),
                failure_reason: (status == NotificationStatus::Failed)
                    .then(|| "SMS gateway rejected the batch".to_string()),
            }
        };

        vec![
            notification(
                "ntf_001",
                "Welcome to Canvas Hub",
                "Thanks for joining! Here is how to publish your first site.",
                Channel::Email,
                "new_users",
                1_240,
                NotificationStatus::Sent,
            ),
            notification(
                "ntf_002",
                "Scheduled maintenance",
                "The editor will be read-only on Sunday between 02:00 and 03:00 UTC.",
                Channel::InApp,
                "all_users",
                15_300,
                NotificationStatus::Scheduled,
            ),
            notification(
                "ntf_003",
                "Your trial ends soon",
                "Upgrade now to keep your custom domain.",
                Channel::Push,
                "trial_users",
                2_100,
                NotificationStatus::Sent,
            ),
            notification(
                "ntf_004",
                "Payment reminder",
                "Your latest invoice is overdue.",
                Channel::Sms,
                "overdue_accounts",
                85,
                NotificationStatus::Failed,
            ),
            notification(
                "ntf_005",
                "New template pack",
                "Twelve new portfolio templates just landed.",
                Channel::Email,
                "all_users",
                0,
                NotificationStatus::Draft,
            ),
        ]
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewNotification {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    pub channel: Channel,
    #[validate(length(min = 1, max = 100))]
    pub audience: String,
    #[serde(default)]
    pub recipients: u64,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl NewNotification {
    pub fn into_record(self, now: DateTime<Utc>) -> HubResult<Notification> {
        self.validate()?;

        if matches!(self.scheduled_for, Some(at) if at <= now) {
            return Err(HubError::Validation(
                "scheduled_for must be in the future".to_string(),
            ));
        }

        Ok(Notification {
            id: format!("ntf_{}", uuid::Uuid::new_v4().simple()),
            title: self.title.trim().to_string(),
            message: self.message,
            channel: self.channel,
            audience: self.audience,
            recipients: self.recipients,
            status: NotificationStatus::Draft,
            created_at: now,
            updated_at: now,
            scheduled_for: self.scheduled_for,
            sent_at: None,
            failure_reason: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::transition::apply;

    #[test]
    fn test_summary() {
        let notifications = Notification::mock_data(Utc::now());
        let summary = Notification::summarize(&notifications);
        assert_eq!(summary.total_recipients, 18_725);
        assert_eq!(summary.total_recipients_display, "18.7K");
        // 2 sent, 1 failed
        assert_eq!(summary.delivery_rate, 66.7);
        assert_eq!(summary.scheduled, 1);
    }

    #[test]
    fn test_failed_notification_can_be_resent() {
        let mut notification = Notification::mock_data(Utc::now()).remove(3);
        let input = TransitionInput::new("admin", None, Utc::now());

        apply(&mut notification, "send", &input).unwrap();
        apply(&mut notification, "mark_sent", &input).unwrap();
        assert_eq!(notification.status, NotificationStatus::Sent);
        assert!(notification.failure_reason.is_none());
        assert!(apply(&mut notification, "cancel", &input).is_err());
    }

    #[test]
    fn test_schedule_defaults_send_time() {
        let mut notification = Notification::mock_data(Utc::now()).remove(4);
        let input = TransitionInput::new("admin", None, Utc::now());
        apply(&mut notification, "schedule", &input).unwrap();
        assert!(notification.scheduled_for.unwrap() > input.at);
    }

    #[test]
    fn test_past_schedule_is_rejected() {
        let payload = NewNotification {
            title: "Late".into(),
            message: "Too late".into(),
            channel: Channel::Push,
            audience: "all_users".into(),
            recipients: 10,
            scheduled_for: Some(Utc::now() - Duration::minutes(5)),
        };
        assert!(payload.into_record(Utc::now()).is_err());
    }
}

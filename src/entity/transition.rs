/// Status transition map
use super::{Record, StatusStyle, StatusTag};
use crate::error::{HubError, HubResult};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A named, guarded status change
pub struct Transition<R: Record> {
    pub action: &'static str,
    /// Statuses the action may be invoked from
    pub from: &'static [R::Status],
    pub to: R::Status,
    /// The action is blocked unless a non-blank reason is supplied
    pub requires_reason: bool,
    /// Confirmation title shown after the change
    pub notice: &'static str,
    /// Entity-specific side effect (timestamps, stored reasons)
    pub effect: Option<fn(&mut R, &TransitionInput)>,
}

impl<R: Record> Transition<R> {
    pub fn allows(&self, status: R::Status) -> bool {
        self.from.contains(&status)
    }
}

/// Caller-supplied context for a transition
#[derive(Debug, Clone)]
pub struct TransitionInput {
    pub actor: String,
    /// Trimmed reason; blank input is normalized to `None`
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

impl TransitionInput {
    pub fn new(actor: impl Into<String>, reason: Option<String>, at: DateTime<Utc>) -> Self {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Self {
            actor: actor.into(),
            reason,
            at,
        }
    }
}

/// User-visible confirmation of a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Result of an applied transition
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome<R: Record> {
    pub record: R,
    pub action: &'static str,
    pub from: R::Status,
    pub to: R::Status,
    pub notice: Notice,
}

/// Look up an action in the entity's transition table
pub fn find<R: Record>(action: &str) -> HubResult<&'static Transition<R>> {
    R::transitions()
        .iter()
        .find(|t| t.action == action)
        .ok_or_else(|| HubError::UnknownAction {
            entity: R::ENTITY,
            action: action.to_string(),
        })
}

/// Apply `action` to `record`, or leave it untouched on any error
pub fn apply<R: Record>(
    record: &mut R,
    action: &str,
    input: &TransitionInput,
) -> HubResult<TransitionOutcome<R>> {
    let transition = find::<R>(action)?;

    if transition.requires_reason && input.reason.is_none() {
        return Err(HubError::Validation(format!(
            "A reason is required to {} a {}",
            transition.action.replace('_', " "),
            R::ENTITY
        )));
    }

    let from = record.status();
    if !transition.allows(from) {
        return Err(HubError::InvalidTransition {
            entity: R::ENTITY,
            id: record.id().to_string(),
            action: action.to_string(),
            status: from.as_str(),
        });
    }

    record.set_status(transition.to, input.at);
    if let Some(effect) = transition.effect {
        effect(record, input);
    }

    let notice = Notice::success(
        transition.notice,
        format!(
            "{} moved from {} to {}",
            record.id(),
            from.as_str(),
            transition.to.as_str()
        ),
    );

    Ok(TransitionOutcome {
        record: record.clone(),
        action: transition.action,
        from,
        to: transition.to,
        notice,
    })
}

/// Whether no action leaves `status`
pub fn is_terminal<R: Record>(status: R::Status) -> bool {
    !R::transitions().iter().any(|t| t.allows(status))
}

/// Actions currently available from `status`
pub fn available_actions<R: Record>(status: R::Status) -> Vec<&'static str> {
    R::transitions()
        .iter()
        .filter(|t| t.allows(status))
        .map(|t| t.action)
        .collect()
}

/// The action `action` undoes, when it is declared as a reversal
pub fn reverses<R: Record>(action: &str) -> Option<&'static str> {
    R::REVERSIBLE
        .iter()
        .find(|(_, undo)| *undo == action)
        .map(|(forward, _)| *forward)
}

/// Serializable description of an entity's statuses and actions
#[derive(Debug, Clone, Serialize)]
pub struct StatusCatalogue {
    pub entity: &'static str,
    pub statuses: Vec<StatusInfo>,
    pub transitions: Vec<TransitionInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub value: &'static str,
    pub style: StatusStyle,
    pub terminal: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionInfo {
    pub action: &'static str,
    pub from: Vec<&'static str>,
    pub to: &'static str,
    pub requires_reason: bool,
    /// Action this one undoes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverses: Option<&'static str>,
}

impl StatusCatalogue {
    pub fn of<R: Record>() -> Self {
        let statuses = R::Status::ALL
            .iter()
            .map(|status| StatusInfo {
                value: status.as_str(),
                style: status.style(),
                terminal: is_terminal::<R>(*status),
            })
            .collect();

        let transitions = R::transitions()
            .iter()
            .map(|t| TransitionInfo {
                action: t.action,
                from: t.from.iter().map(|s| s.as_str()).collect(),
                to: t.to.as_str(),
                requires_reason: t.requires_reason,
                reverses: reverses::<R>(t.action),
            })
            .collect();

        Self {
            entity: R::ENTITY,
            statuses,
            transitions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::kyc::{KycCase, KycStatus};
    use crate::admin::subscriptions::{Subscription, SubscriptionStatus};

    fn kyc_case(status: KycStatus) -> KycCase {
        let mut case = KycCase::mock_data(Utc::now()).remove(0);
        case.status = status;
        case
    }

    #[test]
    fn test_reject_without_reason_is_blocked() {
        let mut case = kyc_case(KycStatus::UnderReview);
        let before = case.clone();

        for reason in [None, Some(String::new()), Some("   \t".to_string())] {
            let input = TransitionInput::new("admin", reason, Utc::now());
            let err = apply(&mut case, "reject", &input).unwrap_err();
            assert!(matches!(err, HubError::Validation(_)));
            assert_eq!(case.status, before.status);
            assert_eq!(case.updated_at, before.updated_at);
            assert!(case.rejection_reason.is_none());
        }
    }

    #[test]
    fn test_reject_with_reason_records_it() {
        let mut case = kyc_case(KycStatus::UnderReview);
        let input = TransitionInput::new(
            "admin",
            Some("  Document expired  ".to_string()),
            Utc::now(),
        );
        let outcome = apply(&mut case, "reject", &input).unwrap();

        assert_eq!(outcome.from, KycStatus::UnderReview);
        assert_eq!(outcome.to, KycStatus::Rejected);
        assert_eq!(case.rejection_reason.as_deref(), Some("Document expired"));
        assert_eq!(case.reviewed_at, Some(input.at));
        assert_eq!(outcome.notice.level, NoticeLevel::Success);
    }

    #[test]
    fn test_guard_rejects_wrong_source_status() {
        let mut case = kyc_case(KycStatus::Pending);
        let input = TransitionInput::new("admin", None, Utc::now());
        let err = apply(&mut case, "approve", &input).unwrap_err();
        assert!(matches!(err, HubError::InvalidTransition { .. }));
        assert_eq!(case.status, KycStatus::Pending);
    }

    #[test]
    fn test_unknown_action() {
        let mut sub = Subscription::mock_data(Utc::now()).remove(0);
        let input = TransitionInput::new("admin", None, Utc::now());
        let err = apply(&mut sub, "teleport", &input).unwrap_err();
        assert!(matches!(err, HubError::UnknownAction { .. }));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(is_terminal::<Subscription>(SubscriptionStatus::Cancelled));
        assert!(is_terminal::<Subscription>(SubscriptionStatus::Expired));
        assert!(!is_terminal::<Subscription>(SubscriptionStatus::Paused));
        assert!(is_terminal::<KycCase>(KycStatus::Rejected));
        assert!(is_terminal::<KycCase>(KycStatus::Expired));
    }

    #[test]
    fn test_pause_resume_is_reversible() {
        assert_eq!(
            available_actions::<Subscription>(SubscriptionStatus::Paused),
            vec!["resume", "cancel"]
        );
        assert!(available_actions::<Subscription>(SubscriptionStatus::Active).contains(&"pause"));
    }

    #[test]
    fn test_catalogue_lists_every_status() {
        let catalogue = StatusCatalogue::of::<KycCase>();
        assert_eq!(catalogue.statuses.len(), KycStatus::ALL.len());
        assert!(catalogue
            .transitions
            .iter()
            .any(|t| t.action == "reject" && t.requires_reason));
    }

    #[test]
    fn test_catalogue_marks_reversals() {
        let catalogue = StatusCatalogue::of::<Subscription>();
        let reverses_of = |action: &str| {
            catalogue
                .transitions
                .iter()
                .find(|t| t.action == action)
                .and_then(|t| t.reverses)
        };
        assert_eq!(reverses_of("resume"), Some("pause"));
        assert_eq!(reverses_of("settle"), Some("mark_past_due"));
        assert_eq!(reverses_of("pause"), None);
        assert_eq!(reverses_of("cancel"), None);
    }
}

/**
 * Capability Policy
 *
 * Static mapping from a principal's room-level capability to the set of
 * permitted actions. Edit/delete of an individual annotation or comment is
 * further narrowed at the gateway to "author OR owner"; this table only
 * answers the coarse room-level question.
 */

use serde::{Deserialize, Serialize};

/// Room-level permission tier for a principal on one media item.
///
/// The ordering is meaningful: `None < Viewer < Reviewer < Owner`. Share
/// link redemption uses it to short-circuit when the redeemer already holds
/// an equal-or-greater capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    None,
    Viewer,
    Reviewer,
    Owner,
}

/// Actions a capability can permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Annotate,
    Edit,
    Delete,
}

impl Capability {
    /// Whether this capability permits the given room-level action.
    pub fn allows(self, action: Action) -> bool {
        match action {
            Action::View => self >= Capability::Viewer,
            Action::Annotate => self >= Capability::Reviewer,
            Action::Edit | Action::Delete => self == Capability::Owner,
        }
    }

    /// Parse a stored grant role. Grants never carry `owner` or `none`.
    pub fn from_grant_role(role: &str) -> Option<Self> {
        match role {
            "reviewer" => Some(Capability::Reviewer),
            "viewer" => Some(Capability::Viewer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::None => "none",
            Capability::Viewer => "viewer",
            Capability::Reviewer => "reviewer",
            Capability::Owner => "owner",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_allows_everything() {
        for action in [Action::View, Action::Annotate, Action::Edit, Action::Delete] {
            assert!(Capability::Owner.allows(action));
        }
    }

    #[test]
    fn test_reviewer_can_view_and_annotate_only() {
        assert!(Capability::Reviewer.allows(Action::View));
        assert!(Capability::Reviewer.allows(Action::Annotate));
        assert!(!Capability::Reviewer.allows(Action::Edit));
        assert!(!Capability::Reviewer.allows(Action::Delete));
    }

    #[test]
    fn test_viewer_can_only_view() {
        assert!(Capability::Viewer.allows(Action::View));
        assert!(!Capability::Viewer.allows(Action::Annotate));
        assert!(!Capability::Viewer.allows(Action::Edit));
        assert!(!Capability::Viewer.allows(Action::Delete));
    }

    #[test]
    fn test_none_allows_nothing() {
        for action in [Action::View, Action::Annotate, Action::Edit, Action::Delete] {
            assert!(!Capability::None.allows(action));
        }
    }

    #[test]
    fn test_capability_ordering() {
        assert!(Capability::None < Capability::Viewer);
        assert!(Capability::Viewer < Capability::Reviewer);
        assert!(Capability::Reviewer < Capability::Owner);
    }

    #[test]
    fn test_from_grant_role() {
        assert_eq!(
            Capability::from_grant_role("reviewer"),
            Some(Capability::Reviewer)
        );
        assert_eq!(
            Capability::from_grant_role("viewer"),
            Some(Capability::Viewer)
        );
        assert_eq!(Capability::from_grant_role("owner"), None);
        assert_eq!(Capability::from_grant_role("admin"), None);
    }
}

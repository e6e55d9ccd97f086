//! Principal and subject matching.

use serde::{Deserialize, Serialize};

use super::PolicySnapshot;
use crate::models::{SubjectDefinition, SubjectKind};

/// The authenticated caller. Supplied per request by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Login provider that authenticated the caller (e.g. "github")
    pub provider: String,
    /// Login name at that provider
    pub login_name: String,
}

impl Principal {
    pub fn new(provider: impl Into<String>, login_name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            login_name: login_name.into(),
        }
    }
}

/// Check whether a binding subject refers to the principal.
///
/// - User subjects match on provider and login name.
/// - Group subjects match when the snapshot's roster for (provider, name)
///   lists the principal. A missing roster matches nobody.
/// - An `organization` scope must equal the organization the roster reports
///   for the member. Without such data the subject matches nobody.
pub fn subject_matches(
    subject: &SubjectDefinition,
    principal: &Principal,
    snapshot: &PolicySnapshot,
) -> bool {
    match subject.kind {
        SubjectKind::User => {
            // Principals carry no organization data to verify against
            subject.organization.is_none()
                && subject.provider == principal.provider
                && subject.name == principal.login_name
        }
        SubjectKind::Group => {
            let Some(group) = snapshot.group(&subject.provider, &subject.name) else {
                return false;
            };
            if !group.has_member(&principal.login_name) {
                return false;
            }
            match &subject.organization {
                None => true,
                Some(org) => group.member_organization(&principal.login_name) == Some(org.as_str()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoginProviderGroup, PolicyDocument};

    fn snapshot_with_groups(groups: Vec<LoginProviderGroup>) -> PolicySnapshot {
        let doc = PolicyDocument {
            groups,
            ..Default::default()
        };
        PolicySnapshot::build(doc, 1).unwrap().0
    }

    #[test]
    fn test_user_subject() {
        let snapshot = snapshot_with_groups(vec![]);
        let subject = SubjectDefinition::user("github", "alice");

        assert!(subject_matches(&subject, &Principal::new("github", "alice"), &snapshot));
        assert!(!subject_matches(&subject, &Principal::new("google", "alice"), &snapshot));
        assert!(!subject_matches(&subject, &Principal::new("github", "Alice"), &snapshot));
    }

    #[test]
    fn test_user_subject_with_organization_never_matches() {
        let snapshot = snapshot_with_groups(vec![]);
        let subject = SubjectDefinition::user("github", "alice").with_organization("acme");
        assert!(!subject_matches(&subject, &Principal::new("github", "alice"), &snapshot));
    }

    #[test]
    fn test_group_expansion() {
        let snapshot = snapshot_with_groups(vec![LoginProviderGroup::new(
            "github",
            "team-a",
            ["alice", "bob"],
        )]);
        let subject = SubjectDefinition::group("github", "team-a");

        assert!(subject_matches(&subject, &Principal::new("github", "bob"), &snapshot));
        assert!(!subject_matches(&subject, &Principal::new("github", "carol"), &snapshot));
    }

    #[test]
    fn test_missing_roster_fails_closed() {
        let snapshot = snapshot_with_groups(vec![]);
        let subject = SubjectDefinition::group("github", "team-a");

        for login in ["alice", "bob", "carol"] {
            assert!(!subject_matches(&subject, &Principal::new("github", login), &snapshot));
        }
    }

    #[test]
    fn test_roster_is_looked_up_by_subject_provider() {
        let snapshot = snapshot_with_groups(vec![LoginProviderGroup::new(
            "google",
            "team-a",
            ["alice"],
        )]);
        let subject = SubjectDefinition::group("github", "team-a");
        assert!(!subject_matches(&subject, &Principal::new("github", "alice"), &snapshot));
    }

    #[test]
    fn test_group_membership_ignores_principal_provider() {
        // Rosters are keyed by the subject's provider; the member list holds
        // login names only, so the principal's provider is not compared
        let snapshot = snapshot_with_groups(vec![LoginProviderGroup::new(
            "github",
            "team-a",
            ["alice"],
        )]);
        let subject = SubjectDefinition::group("github", "team-a");

        assert!(subject_matches(&subject, &Principal::new("google", "alice"), &snapshot));
        assert!(!subject_matches(&subject, &Principal::new("google", "bob"), &snapshot));
    }

    #[test]
    fn test_group_organization_scope() {
        let snapshot = snapshot_with_groups(vec![
            LoginProviderGroup::new("github", "team-a", ["alice", "bob", "carol"])
                .with_member_organization("alice", "acme")
                .with_member_organization("bob", "other"),
        ]);
        let subject = SubjectDefinition::group("github", "team-a").with_organization("acme");

        assert!(subject_matches(&subject, &Principal::new("github", "alice"), &snapshot));
        assert!(!subject_matches(&subject, &Principal::new("github", "bob"), &snapshot));
        // No organization data for carol
        assert!(!subject_matches(&subject, &Principal::new("github", "carol"), &snapshot));
    }
}

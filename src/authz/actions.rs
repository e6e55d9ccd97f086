//! Closed action vocabulary per resource kind.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Wildcard accepted in `allowedActions`, granting every action of the kind.
pub const ALL_ACTIONS: &str = "all";

/// Kind of resource a permission is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Topic,
    Group,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Group => "group",
        }
    }

    /// Every action defined for this kind.
    pub fn actions(&self) -> &'static [Action] {
        match self {
            Self::Topic => &[
                Action::SeeTopic,
                Action::ViewPartitions,
                Action::ViewMessages,
                Action::ViewConsumers,
                Action::ViewConfig,
            ],
            Self::Group => &[Action::SeeConsumerGroup],
        }
    }

    /// Parse an action name for this kind.
    ///
    /// Returns `None` for `"all"`, which is not an action itself, and for
    /// action names that belong to another kind.
    pub fn parse_action(&self, name: &str) -> Option<Action> {
        self.actions().iter().copied().find(|a| a.as_str() == name)
    }

    pub fn all_actions(&self) -> BTreeSet<Action> {
        self.actions().iter().copied().collect()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topic" | "topics" => Ok(Self::Topic),
            "group" | "groups" | "consumerGroup" | "consumerGroups" => Ok(Self::Group),
            _ => Err(format!("Unknown resource type: {}", s)),
        }
    }
}

/// An action a principal may perform on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    SeeTopic,
    ViewPartitions,
    ViewMessages,
    ViewConsumers,
    ViewConfig,
    SeeConsumerGroup,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SeeTopic => "seeTopic",
            Self::ViewPartitions => "viewPartitions",
            Self::ViewMessages => "viewMessages",
            Self::ViewConsumers => "viewConsumers",
            Self::ViewConfig => "viewConfig",
            Self::SeeConsumerGroup => "seeConsumerGroup",
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::SeeConsumerGroup => ResourceKind::Group,
            _ => ResourceKind::Topic,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabularies_are_disjoint_and_consistent() {
        for kind in [ResourceKind::Topic, ResourceKind::Group] {
            for action in kind.actions() {
                assert_eq!(action.kind(), kind);
                assert_eq!(kind.parse_action(action.as_str()), Some(*action));
            }
        }
        assert_eq!(ResourceKind::Group.parse_action("seeTopic"), None);
        assert_eq!(ResourceKind::Topic.parse_action("seeConsumerGroup"), None);
    }

    #[test]
    fn test_all_is_not_an_action() {
        assert_eq!(ResourceKind::Topic.parse_action(ALL_ACTIONS), None);
    }

    #[test]
    fn test_resource_kind_aliases() {
        assert_eq!("topic".parse::<ResourceKind>(), Ok(ResourceKind::Topic));
        assert_eq!("consumerGroup".parse::<ResourceKind>(), Ok(ResourceKind::Group));
        assert!("cluster".parse::<ResourceKind>().is_err());
        assert!("Topic".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_action_serializes_as_console_name() {
        let json = serde_json::to_string(&Action::ViewMessages).unwrap();
        assert_eq!(json, "\"viewMessages\"");
        let back: Action = serde_json::from_str("\"seeConsumerGroup\"").unwrap();
        assert_eq!(back, Action::SeeConsumerGroup);
    }
}

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::GroupLagDescription;
use crate::authz::Action;

/// Topic as listed by the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDetail {
    pub topic_name: String,
    pub is_internal: bool,
    pub partition_count: usize,
    pub replication_factor: usize,
    pub cleanup_policy: String,
    /// Bytes used by the topic's log directories
    pub log_dir_size: i64,
    /// `None` when action resolution was not attempted for this listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_actions: Option<BTreeSet<Action>>,
}

impl TopicDetail {
    pub fn new(topic_name: impl Into<String>, partition_count: usize) -> Self {
        Self {
            topic_name: topic_name.into(),
            is_internal: false,
            partition_count,
            replication_factor: 1,
            cleanup_policy: "delete".to_string(),
            log_dir_size: 0,
            allowed_actions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberAssignment {
    pub topic_name: String,
    pub partition_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberDescription {
    /// Member id assigned by the coordinator
    pub id: String,
    /// Client id reported by the member
    pub client_id: String,
    pub client_host: String,
    pub assignments: Vec<GroupMemberAssignment>,
}

/// Raw consumer group metadata handed in by the cluster collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOverview {
    pub group_id: String,
    /// Dead, Empty, PreparingRebalance, CompletingRebalance, Stable
    pub state: String,
    pub protocol_type: String,
    #[serde(default)]
    pub members: Vec<GroupMemberDescription>,
    pub coordinator_id: i32,
}

impl GroupOverview {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            state: "Stable".to_string(),
            protocol_type: "consumer".to_string(),
            members: Vec::new(),
            coordinator_id: 0,
        }
    }
}

/// Consumer group as listed by the console, with lag and permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDescription {
    pub group_id: String,
    pub state: String,
    pub protocol_type: String,
    pub members: Vec<GroupMemberDescription>,
    pub coordinator_id: i32,
    pub lag: GroupLagDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_actions: Option<BTreeSet<Action>>,
    pub lag_sum: i64,
}

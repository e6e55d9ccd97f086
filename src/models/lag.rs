use serde::{Deserialize, Serialize};

/// Offset data for one partition as reported by the offset collector.
///
/// Either value may be missing: a group that never committed on the partition
/// has no committed offset, and a failed watermark fetch has no high watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionOffsets {
    pub partition_id: i32,
    #[serde(default)]
    pub committed_offset: Option<i64>,
    #[serde(default)]
    pub high_watermark: Option<i64>,
}

impl PartitionOffsets {
    pub fn new(partition_id: i32, committed_offset: Option<i64>, high_watermark: Option<i64>) -> Self {
        Self {
            partition_id,
            committed_offset,
            high_watermark,
        }
    }
}

/// All partitions of one topic for one consumer group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicOffsets {
    pub topic: String,
    pub partitions: Vec<PartitionOffsets>,
}

impl TopicOffsets {
    pub fn new(topic: impl Into<String>, partitions: Vec<PartitionOffsets>) -> Self {
        Self {
            topic: topic.into(),
            partitions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionLag {
    pub partition_id: i32,
    pub lag: i64,
}

/// Lag of one consumer group on one topic.
///
/// `partition_lags` only lists partitions with a committed offset, whether or
/// not a member is currently assigned to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicLag {
    pub topic: String,
    pub summed_lag: i64,
    /// Number of partitions the topic has
    pub partition_count: usize,
    /// Number of partitions contributing to the lag: committed offset and
    /// high watermark both known
    pub partitions_with_offset: usize,
    pub partition_lags: Vec<PartitionLag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLagDescription {
    pub group_id: String,
    pub topic_lags: Vec<TopicLag>,
}

impl GroupLagDescription {
    /// Total lag of the group across all topics. Computed on every call,
    /// saturating at `i64::MAX`.
    pub fn lag_sum(&self) -> i64 {
        self.topic_lags
            .iter()
            .map(|t| t.summed_lag)
            .fold(0, i64::saturating_add)
    }

    /// Lag entry for a single topic, if the group has offsets on it.
    pub fn topic(&self, topic: &str) -> Option<&TopicLag> {
        self.topic_lags.iter().find(|t| t.topic == topic)
    }
}

/// A consumer group reading a topic, as listed on the topic's consumer tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicConsumer {
    pub group_id: String,
    pub summed_lag: i64,
}

//! Consumer group lag aggregation.
//!
//! Turns the per-partition committed offsets and high watermarks supplied by
//! the offset collector into [`TopicLag`] and [`GroupLagDescription`]
//! summaries. Aggregation is a pure function and never fails: partitions with
//! incomplete data are left out of the lag figures instead of failing the
//! whole group.

use crate::models::{
    GroupLagDescription, PartitionLag, PartitionOffsets, TopicConsumer, TopicLag, TopicOffsets,
};

/// Lag of a single partition, or `None` when it cannot contribute.
///
/// A partition contributes only with a committed offset (Kafka reports `-1`
/// when a group has none) and a known high watermark. A watermark read that
/// is momentarily behind the committed offset yields zero, never a negative
/// lag.
pub fn partition_lag(offsets: &PartitionOffsets) -> Option<i64> {
    let committed = offsets.committed_offset.filter(|o| *o >= 0)?;
    let high_watermark = offsets.high_watermark?;
    Some(high_watermark.saturating_sub(committed).max(0))
}

/// Summarize one topic's partitions for a group.
pub fn aggregate_topic_lag(topic: &TopicOffsets) -> TopicLag {
    let partition_lags: Vec<PartitionLag> = topic
        .partitions
        .iter()
        .filter_map(|p| {
            partition_lag(p).map(|lag| PartitionLag {
                partition_id: p.partition_id,
                lag,
            })
        })
        .collect();

    let skipped = topic
        .partitions
        .iter()
        .filter(|p| p.committed_offset.is_some_and(|o| o >= 0) && p.high_watermark.is_none())
        .count();
    if skipped > 0 {
        tracing::debug!(
            topic = %topic.topic,
            partitions = skipped,
            "Partitions with a committed offset but no high watermark excluded from lag"
        );
    }

    TopicLag {
        topic: topic.topic.clone(),
        summed_lag: partition_lags
            .iter()
            .map(|p| p.lag)
            .fold(0, i64::saturating_add),
        partition_count: topic.partitions.len(),
        partitions_with_offset: partition_lags.len(),
        partition_lags,
    }
}

/// Summarize every topic a group has offsets on, in input order.
pub fn aggregate_group_lag(group_id: &str, topics: &[TopicOffsets]) -> GroupLagDescription {
    GroupLagDescription {
        group_id: group_id.to_string(),
        topic_lags: topics.iter().map(aggregate_topic_lag).collect(),
    }
}

/// Groups consuming `topic`, with their lag on it, in input order.
///
/// Only groups with at least one committed offset on the topic are listed.
pub fn topic_consumers(topic: &str, groups: &[GroupLagDescription]) -> Vec<TopicConsumer> {
    groups
        .iter()
        .filter_map(|group| {
            group
                .topic(topic)
                .filter(|lag| lag.partitions_with_offset > 0)
                .map(|lag| TopicConsumer {
                    group_id: group.group_id.clone(),
                    summed_lag: lag.summed_lag,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn p(id: i32, committed: Option<i64>, high: Option<i64>) -> PartitionOffsets {
        PartitionOffsets::new(id, committed, high)
    }

    #[rstest]
    #[case(Some(7), Some(10), Some(3))]
    #[case(Some(20), Some(20), Some(0))]
    #[case(Some(150), Some(100), Some(0))] // stale watermark read
    #[case(Some(0), Some(0), Some(0))]
    #[case(None, Some(10), None)]
    #[case(Some(-1), Some(10), None)] // no committed offset sentinel
    #[case(Some(5), None, None)]
    fn test_partition_lag(
        #[case] committed: Option<i64>,
        #[case] high: Option<i64>,
        #[case] expected: Option<i64>,
    ) {
        assert_eq!(partition_lag(&p(0, committed, high)), expected);
    }

    #[test]
    fn test_partition_accounting() {
        let topic = TopicOffsets::new(
            "orders",
            vec![
                p(0, Some(7), Some(10)),
                p(1, Some(20), Some(20)),
                p(2, None, Some(50)),
                p(3, None, Some(5)),
                p(4, None, Some(0)),
            ],
        );

        let lag = aggregate_topic_lag(&topic);
        assert_eq!(lag.summed_lag, 3);
        assert_eq!(lag.partition_count, 5);
        assert_eq!(lag.partitions_with_offset, 2);
        assert_eq!(
            lag.partition_lags,
            vec![
                PartitionLag { partition_id: 0, lag: 3 },
                PartitionLag { partition_id: 1, lag: 0 },
            ]
        );
    }

    #[test]
    fn test_missing_watermark_is_excluded() {
        let topic = TopicOffsets::new("orders", vec![p(0, Some(7), None), p(1, Some(2), Some(4))]);
        let lag = aggregate_topic_lag(&topic);
        assert_eq!(lag.summed_lag, 2);
        assert_eq!(lag.partition_count, 2);
        assert_eq!(lag.partitions_with_offset, 1);
    }

    #[test]
    fn test_summed_lag_saturates() {
        let topic = TopicOffsets::new(
            "firehose",
            vec![p(0, Some(0), Some(i64::MAX)), p(1, Some(0), Some(i64::MAX))],
        );
        let lag = aggregate_topic_lag(&topic);
        assert_eq!(lag.summed_lag, i64::MAX);
        assert_eq!(lag.partitions_with_offset, 2);

        let group = aggregate_group_lag("g", &[topic.clone(), topic]);
        assert_eq!(group.lag_sum(), i64::MAX);
    }

    #[test]
    fn test_topic_without_offsets_is_valid() {
        let topic = TopicOffsets::new("idle", vec![p(0, None, Some(10)), p(1, None, Some(3))]);
        let lag = aggregate_topic_lag(&topic);
        assert_eq!(lag.summed_lag, 0);
        assert_eq!(lag.partition_count, 2);
        assert_eq!(lag.partitions_with_offset, 0);
        assert!(lag.partition_lags.is_empty());
    }

    #[test]
    fn test_group_lag_keeps_input_order_and_sums() {
        let topics = vec![
            TopicOffsets::new("zeta", vec![p(0, Some(1), Some(5))]),
            TopicOffsets::new("alpha", vec![p(0, Some(0), Some(10)), p(1, Some(3), Some(4))]),
            TopicOffsets::new("empty", vec![]),
        ];

        let group = aggregate_group_lag("billing", &topics);
        assert_eq!(group.group_id, "billing");
        let names: Vec<_> = group.topic_lags.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "empty"]);
        assert_eq!(group.lag_sum(), 4 + 11);
        assert_eq!(group.topic("alpha").unwrap().summed_lag, 11);
        assert_eq!(group.topic("empty").unwrap().partition_count, 0);
    }

    #[test]
    fn test_summed_lag_matches_partition_lags() {
        let topic = TopicOffsets::new(
            "t",
            (0..16)
                .map(|i| p(i, Some(i64::from(i) * 3), Some(i64::from(i) * 5)))
                .collect(),
        );
        let lag = aggregate_topic_lag(&topic);
        assert_eq!(lag.partitions_with_offset, lag.partition_lags.len());
        assert!(lag.partitions_with_offset <= lag.partition_count);
        assert_eq!(
            lag.summed_lag,
            lag.partition_lags.iter().map(|p| p.lag).sum::<i64>()
        );
    }

    #[test]
    fn test_topic_consumers() {
        let groups = vec![
            aggregate_group_lag("a", &[TopicOffsets::new("orders", vec![p(0, Some(1), Some(9))])]),
            aggregate_group_lag("b", &[TopicOffsets::new("payments", vec![p(0, Some(1), Some(2))])]),
            aggregate_group_lag("c", &[TopicOffsets::new("orders", vec![p(0, None, Some(9))])]),
            aggregate_group_lag("d", &[TopicOffsets::new("orders", vec![p(0, Some(9), Some(9))])]),
        ];

        assert_eq!(
            topic_consumers("orders", &groups),
            vec![
                TopicConsumer { group_id: "a".to_string(), summed_lag: 8 },
                TopicConsumer { group_id: "d".to_string(), summed_lag: 0 },
            ]
        );
        assert!(topic_consumers("unknown", &groups).is_empty());
    }
}

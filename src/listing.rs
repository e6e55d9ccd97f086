//! Response assembly for the console's listing endpoints.
//!
//! This is the only place where lag summaries and permission resolution meet.
//! Every function takes the snapshot the caller pinned for the request, so a
//! listing is resolved entirely under one policy version.

use std::collections::HashMap;

use crate::{
    authz::{AuthzEngine, PolicySnapshot, Principal, ResourceKind},
    lag::aggregate_group_lag,
    models::{AdminInfo, GroupDescription, GroupOverview, RoleDefinition, TopicDetail, TopicOffsets, UserDetails},
};

/// Attach allowed actions to each topic and hide the ones the principal has
/// no action on.
///
/// With `resolve` unset every topic is returned with `allowed_actions: None`
/// (resolution not attempted), which the console treats differently from an
/// empty grant.
pub fn annotate_topics(
    engine: &AuthzEngine,
    snapshot: &PolicySnapshot,
    principal: &Principal,
    topics: Vec<TopicDetail>,
    resolve: bool,
) -> Vec<TopicDetail> {
    if !resolve {
        return topics
            .into_iter()
            .map(|topic| TopicDetail {
                allowed_actions: None,
                ..topic
            })
            .collect();
    }

    let total = topics.len();
    let visible: Vec<TopicDetail> = topics
        .into_iter()
        .filter_map(|mut topic| {
            let allowed =
                engine.allowed_actions(snapshot, principal, ResourceKind::Topic, &topic.topic_name);
            if allowed.is_empty() {
                return None;
            }
            topic.allowed_actions = Some((*allowed).clone());
            Some(topic)
        })
        .collect();

    tracing::debug!(
        login = %principal.login_name,
        total,
        visible = visible.len(),
        snapshot_version = snapshot.version(),
        "Annotated topic listing"
    );
    visible
}

/// Build consumer group descriptions with lag and allowed actions.
///
/// `offsets` maps a group id to the offsets collected for it; a group without
/// an entry gets an empty lag description. Groups the principal has no action
/// on are left out.
pub fn describe_groups(
    engine: &AuthzEngine,
    snapshot: &PolicySnapshot,
    principal: &Principal,
    overviews: Vec<GroupOverview>,
    offsets: &HashMap<String, Vec<TopicOffsets>>,
) -> Vec<GroupDescription> {
    overviews
        .into_iter()
        .filter_map(|overview| {
            let allowed =
                engine.allowed_actions(snapshot, principal, ResourceKind::Group, &overview.group_id);
            if allowed.is_empty() {
                return None;
            }

            let topics = offsets
                .get(&overview.group_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let lag = aggregate_group_lag(&overview.group_id, topics);
            let lag_sum = lag.lag_sum();

            Some(GroupDescription {
                group_id: overview.group_id,
                state: overview.state,
                protocol_type: overview.protocol_type,
                members: overview.members,
                coordinator_id: overview.coordinator_id,
                lag,
                allowed_actions: Some((*allowed).clone()),
                lag_sum,
            })
        })
        .collect()
}

/// Snapshot contents for the admin page.
///
/// `users` are the principals known to the console (for example everyone who
/// has logged in); each is listed with the roles bound to them.
pub fn admin_info(snapshot: &PolicySnapshot, users: &[Principal]) -> AdminInfo {
    AdminInfo {
        users: users
            .iter()
            .map(|user| UserDetails {
                name: user.login_name.clone(),
                login_provider: user.provider.clone(),
                role_names: snapshot.role_names_for(user),
            })
            .collect(),
        roles: snapshot.roles().iter().map(RoleDefinition::from).collect(),
        groups: snapshot.groups().cloned().collect(),
        role_bindings: snapshot.bindings().to_vec(),
    }
}

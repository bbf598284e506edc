// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription table: which parameter nodes watch which entities.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::scene::{EntityId, NodeEvent};

/// One node watching one entity through an input role.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub node: EntityId,
    pub role: String,
    pub events: SmallVec<[NodeEvent; 4]>,
}

/// Watched entity -> subscriptions on it
#[derive(Debug, Clone, Default)]
pub struct SubscriptionTable {
    by_entity: FxHashMap<EntityId, Vec<Subscription>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `entity` for `events` on behalf of `node`.
    ///
    /// A repeated subscription for the same node and role widens the event set.
    pub fn subscribe(&mut self, entity: EntityId, node: EntityId, role: &str, events: &[NodeEvent]) {
        let subscriptions = self.by_entity.entry(entity).or_default();
        match subscriptions.iter_mut().find(|s| s.node == node && s.role == role) {
            Some(existing) => {
                for &event in events {
                    if !existing.events.contains(&event) {
                        existing.events.push(event);
                    }
                }
            }
            None => subscriptions.push(Subscription {
                node,
                role: role.to_string(),
                events: events.iter().copied().collect(),
            }),
        }
    }

    /// Drop every subscription held by `node`
    pub fn unsubscribe_node(&mut self, node: EntityId) {
        self.by_entity.retain(|_, subscriptions| {
            subscriptions.retain(|s| s.node != node);
            !subscriptions.is_empty()
        });
    }

    /// Forget a removed entity entirely, both as watched entity and as subscriber
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.by_entity.remove(&entity);
        self.unsubscribe_node(entity);
    }

    /// Nodes to notify for `event` on `entity`, without duplicates, in subscription order
    pub fn subscribers(&self, entity: EntityId, event: NodeEvent) -> SmallVec<[EntityId; 4]> {
        let mut nodes: SmallVec<[EntityId; 4]> = SmallVec::new();
        if let Some(subscriptions) = self.by_entity.get(&entity) {
            for s in subscriptions.iter().filter(|s| s.events.contains(&event)) {
                if !nodes.contains(&s.node) {
                    nodes.push(s.node);
                }
            }
        }
        nodes
    }

    /// Entities watched by `node`, with the role they are watched through
    pub fn watched_by(&self, node: EntityId) -> Vec<(EntityId, &str)> {
        let mut watched: Vec<(EntityId, &str)> = self
            .by_entity
            .iter()
            .flat_map(|(&entity, subscriptions)| {
                subscriptions
                    .iter()
                    .filter(move |s| s.node == node)
                    .map(move |s| (entity, s.role.as_str()))
            })
            .collect();
        watched.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(&b.0)));
        watched
    }

    pub fn len(&self) -> usize {
        self.by_entity.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

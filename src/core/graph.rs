//! Dependency graph - item/link registry with ordered endpoint assignment
//! and cascading deletes

use super::item::{ItemId, LinkId};
use crate::errors::{GanttError, InvalidOperation, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which end of a link an item occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Origin,
    End,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => write!(f, "origin"),
            Self::End => write!(f, "end"),
        }
    }
}

/// How self-referencing links (origin == end) are treated.
///
/// Multi-item cycles are always accepted; the conflict scan tolerates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkPolicy {
    AllowSelfLoops,
    RejectSelfLoops,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self::AllowSelfLoops
    }
}

/// A dependency: `end` depends on `origin`.
///
/// A link holding only an origin is pending and ignored by traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub origin: Option<ItemId>,
    pub end: Option<ItemId>,
}

impl Link {
    fn new(id: LinkId) -> Self {
        Self {
            id,
            origin: None,
            end: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.origin.is_some() && self.end.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.origin.is_some() && self.end.is_none()
    }

    /// Both endpoints, when the link is complete
    pub fn endpoints(&self) -> Option<(ItemId, ItemId)> {
        Some((self.origin?, self.end?))
    }

    /// The endpoint opposite to `item`
    pub fn other_end(&self, item: ItemId) -> Option<ItemId> {
        if self.origin == Some(item) {
            self.end
        } else if self.end == Some(item) {
            self.origin
        } else {
            None
        }
    }

    fn free_endpoint(&self) -> Option<Endpoint> {
        if self.origin.is_none() {
            Some(Endpoint::Origin)
        } else if self.end.is_none() {
            Some(Endpoint::End)
        } else {
            None
        }
    }
}

/// One incident edge seen from a given item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub link: LinkId,
    /// Item at the other endpoint
    pub item: ItemId,
    /// Role of the queried item on this link
    pub role: Endpoint,
}

/// Item/link registry.
///
/// Ordered maps keep traversal and listing deterministic.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    items: BTreeMap<ItemId, BTreeSet<LinkId>>,
    links: BTreeMap<LinkId, Link>,
    policy: LinkPolicy,
}

impl DependencyGraph {
    pub fn new(policy: LinkPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> LinkPolicy {
        self.policy
    }

    /// Register an item. Registering an existing id is a no-op.
    pub fn add_item(&mut self, id: ItemId) {
        self.items.entry(id).or_default();
    }

    pub fn contains_item(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Attach `item` to the first free endpoint of `link_id`, creating the
    /// link if it does not exist yet.
    ///
    /// Returns the endpoint that was filled. On error nothing changes, not
    /// even the creation of the link.
    pub fn add_link(&mut self, item: ItemId, link_id: LinkId) -> Result<Endpoint> {
        if !self.items.contains_key(&item) {
            return Err(GanttError::ItemNotFound(item));
        }

        let existing = self.links.get(&link_id);
        let slot = match existing {
            Some(link) => link
                .free_endpoint()
                .ok_or(InvalidOperation::NoFreeEndpoint { link: link_id })?,
            None => Endpoint::Origin,
        };

        if slot == Endpoint::End
            && self.policy == LinkPolicy::RejectSelfLoops
            && existing.and_then(|l| l.origin) == Some(item)
        {
            return Err(InvalidOperation::SelfLoop {
                link: link_id,
                item,
            }
            .into());
        }

        let link = self.links.entry(link_id).or_insert_with(|| Link::new(link_id));
        match slot {
            Endpoint::Origin => link.origin = Some(item),
            Endpoint::End => link.end = Some(item),
        }
        self.items.entry(item).or_default().insert(link_id);

        log::debug!("attached {} as {} of {}", item, slot, link_id);
        Ok(slot)
    }

    /// Detach a link from its endpoints and delete it
    pub fn remove_link(&mut self, link_id: LinkId) -> Result<Link> {
        let link = self
            .links
            .remove(&link_id)
            .ok_or(GanttError::LinkNotFound(link_id))?;

        for item in [link.origin, link.end].into_iter().flatten() {
            if let Some(incident) = self.items.get_mut(&item) {
                incident.remove(&link_id);
            }
        }

        Ok(link)
    }

    /// Delete an item after removing every incident link.
    ///
    /// Returns the ids of the links that were removed with it.
    pub fn remove_item(&mut self, id: ItemId) -> Result<Vec<LinkId>> {
        let incident: Vec<LinkId> = self
            .items
            .get(&id)
            .ok_or(GanttError::ItemNotFound(id))?
            .iter()
            .copied()
            .collect();

        for link_id in &incident {
            self.remove_link(*link_id)?;
        }
        self.items.remove(&id);

        log::debug!("removed {} with {} incident links", id, incident.len());
        Ok(incident)
    }

    /// Other endpoint of every complete incident link, with the role `id`
    /// plays on it. A self-link shows up once per side.
    pub fn neighbors(&self, id: ItemId) -> Vec<Neighbor> {
        let mut out = Vec::new();
        for link in self.incident(id) {
            let Some((origin, end)) = link.endpoints() else {
                continue;
            };
            if origin == id {
                out.push(Neighbor {
                    link: link.id,
                    item: end,
                    role: Endpoint::Origin,
                });
            }
            if end == id {
                out.push(Neighbor {
                    link: link.id,
                    item: origin,
                    role: Endpoint::End,
                });
            }
        }
        out
    }

    /// Items `id` depends on (origins of complete links ending at `id`)
    pub fn dependees(&self, id: ItemId) -> Vec<(LinkId, ItemId)> {
        self.neighbors(id)
            .into_iter()
            .filter(|n| n.role == Endpoint::End)
            .map(|n| (n.link, n.item))
            .collect()
    }

    /// Items depending on `id` (ends of complete links starting at `id`)
    pub fn dependants(&self, id: ItemId) -> Vec<(LinkId, ItemId)> {
        self.neighbors(id)
            .into_iter()
            .filter(|n| n.role == Endpoint::Origin)
            .map(|n| (n.link, n.item))
            .collect()
    }

    /// Ids of every link touching `id`, complete or pending
    pub fn incident_links(&self, id: ItemId) -> Vec<LinkId> {
        self.items
            .get(&id)
            .map(|links| links.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    fn incident(&self, id: ItemId) -> impl Iterator<Item = &Link> {
        self.items
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|link_id| self.links.get(link_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(items: &[u64]) -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        for id in items {
            graph.add_item(ItemId(*id));
        }
        graph
    }

    #[test]
    fn test_add_item_is_idempotent() {
        let mut graph = graph_with(&[1]);
        graph.add_link(ItemId(1), LinkId(10)).unwrap();
        graph.add_item(ItemId(1));
        assert_eq!(graph.item_count(), 1);
        assert_eq!(graph.incident_links(ItemId(1)), vec![LinkId(10)]);
    }

    #[test]
    fn test_endpoints_assigned_in_order() {
        let mut graph = graph_with(&[1, 2]);
        assert_eq!(graph.add_link(ItemId(1), LinkId(10)).unwrap(), Endpoint::Origin);
        assert!(graph.link(LinkId(10)).unwrap().is_pending());

        assert_eq!(graph.add_link(ItemId(2), LinkId(10)).unwrap(), Endpoint::End);
        let link = graph.link(LinkId(10)).unwrap();
        assert_eq!(link.endpoints(), Some((ItemId(1), ItemId(2))));
    }

    #[test]
    fn test_third_endpoint_rejected_without_change() {
        let mut graph = graph_with(&[1, 2, 3]);
        graph.add_link(ItemId(1), LinkId(10)).unwrap();
        graph.add_link(ItemId(2), LinkId(10)).unwrap();

        let err = graph.add_link(ItemId(3), LinkId(10)).unwrap_err();
        assert_eq!(
            err,
            GanttError::InvalidOperation(InvalidOperation::NoFreeEndpoint { link: LinkId(10) })
        );

        let link = graph.link(LinkId(10)).unwrap();
        assert_eq!(link.origin, Some(ItemId(1)));
        assert_eq!(link.end, Some(ItemId(2)));
        assert!(graph.incident_links(ItemId(3)).is_empty());
    }

    #[test]
    fn test_unknown_item_does_not_create_link() {
        let mut graph = graph_with(&[1]);
        let err = graph.add_link(ItemId(9), LinkId(10)).unwrap_err();
        assert_eq!(err, GanttError::ItemNotFound(ItemId(9)));
        assert!(graph.link(LinkId(10)).is_none());
    }

    #[test]
    fn test_remove_item_cascades() {
        let mut graph = graph_with(&[1, 2, 3]);
        graph.add_link(ItemId(1), LinkId(10)).unwrap();
        graph.add_link(ItemId(2), LinkId(10)).unwrap();
        graph.add_link(ItemId(2), LinkId(11)).unwrap();
        graph.add_link(ItemId(3), LinkId(11)).unwrap();

        let removed = graph.remove_item(ItemId(2)).unwrap();
        assert_eq!(removed, vec![LinkId(10), LinkId(11)]);
        assert_eq!(graph.link_count(), 0);
        assert!(graph.incident_links(ItemId(1)).is_empty());
        assert!(graph.incident_links(ItemId(3)).is_empty());
        assert!(!graph.contains_item(ItemId(2)));
    }

    #[test]
    fn test_neighbors_report_roles() {
        let mut graph = graph_with(&[1, 2, 3]);
        graph.add_link(ItemId(1), LinkId(10)).unwrap();
        graph.add_link(ItemId(2), LinkId(10)).unwrap();
        graph.add_link(ItemId(2), LinkId(11)).unwrap(); // pending

        let neighbors = graph.neighbors(ItemId(2));
        assert_eq!(
            neighbors,
            vec![Neighbor {
                link: LinkId(10),
                item: ItemId(1),
                role: Endpoint::End
            }]
        );
        assert_eq!(graph.dependants(ItemId(1)), vec![(LinkId(10), ItemId(2))]);
        assert_eq!(graph.dependees(ItemId(2)), vec![(LinkId(10), ItemId(1))]);
    }

    #[test]
    fn test_self_loop_policy() {
        let mut graph = graph_with(&[1]);
        graph.add_link(ItemId(1), LinkId(10)).unwrap();
        graph.add_link(ItemId(1), LinkId(10)).unwrap();
        assert_eq!(graph.neighbors(ItemId(1)).len(), 2);

        let mut strict = DependencyGraph::new(LinkPolicy::RejectSelfLoops);
        strict.add_item(ItemId(1));
        strict.add_link(ItemId(1), LinkId(10)).unwrap();
        let err = strict.add_link(ItemId(1), LinkId(10)).unwrap_err();
        assert_eq!(
            err,
            GanttError::InvalidOperation(InvalidOperation::SelfLoop {
                link: LinkId(10),
                item: ItemId(1)
            })
        );
        assert!(strict.link(LinkId(10)).unwrap().is_pending());
    }
}

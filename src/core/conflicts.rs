//! Schedule conflict propagation
//!
//! Item A depends on item B when a complete link runs from B (origin) to A
//! (end). Each item is classified against its dependees:
//!
//! - `Clear` when A starts on or after B ends
//! - `Blocked` when A ends on or before B ends
//! - `PartiallyBlocked` otherwise
//!
//! and inherits the worst status of every dependee, so severity flows down
//! dependency chains. The traversal uses an explicit stack and visits each
//! ordered (dependee, dependant) pair at most once, so it terminates on
//! cyclic graphs and never recurses.

use super::graph::DependencyGraph;
use super::item::{ItemId, LinkId, ScheduleItem};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Schedule compatibility of an item with its prerequisites, ordered by
/// severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictStatus {
    Clear,
    PartiallyBlocked,
    Blocked,
}

impl ConflictStatus {
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }
}

impl fmt::Display for ConflictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => write!(f, "CLEAR"),
            Self::PartiallyBlocked => write!(f, "PARTIALLY_BLOCKED"),
            Self::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// Start and exclusive end of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl From<&ScheduleItem> for ScheduleWindow {
    fn from(item: &ScheduleItem) -> Self {
        Self {
            start: item.start,
            end: item.end(),
        }
    }
}

/// Status of `dependant` judged against one `dependee` alone
pub fn pairwise_status(dependee: ScheduleWindow, dependant: ScheduleWindow) -> ConflictStatus {
    if dependant.start >= dependee.end {
        ConflictStatus::Clear
    } else if dependant.end <= dependee.end {
        ConflictStatus::Blocked
    } else {
        ConflictStatus::PartiallyBlocked
    }
}

/// Lookup of current item dates, by id
pub trait ScheduleSource {
    fn window(&self, id: ItemId) -> Option<ScheduleWindow>;
}

impl ScheduleSource for BTreeMap<ItemId, ScheduleItem> {
    fn window(&self, id: ItemId) -> Option<ScheduleWindow> {
        self.get(&id).map(ScheduleWindow::from)
    }
}

/// Outcome of one conflict scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictReport {
    statuses: BTreeMap<ItemId, Option<ConflictStatus>>,
    dangling: Vec<LinkId>,
}

impl ConflictReport {
    /// Status of `id`; `None` means no information (unknown item, or an item
    /// no traversal root reaches)
    pub fn status(&self, id: ItemId) -> Option<ConflictStatus> {
        self.statuses.get(&id).copied().flatten()
    }

    /// Every registered item with its status, in id order
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, Option<ConflictStatus>)> + '_ {
        self.statuses.iter().map(|(id, status)| (*id, *status))
    }

    /// Links skipped because an endpoint has no schedule
    pub fn dangling_links(&self) -> &[LinkId] {
        &self.dangling
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

/// Classify every item of `graph` using dates from `source`
pub fn scan(graph: &DependencyGraph, source: &impl ScheduleSource) -> ConflictReport {
    ConflictScan::new(graph, source).run()
}

struct ConflictScan {
    windows: BTreeMap<ItemId, ScheduleWindow>,
    /// dependant -> dependees, complete links between scheduled items only
    dependees: BTreeMap<ItemId, Vec<ItemId>>,
    roots: Vec<ItemId>,
    registered: Vec<ItemId>,
    dangling: BTreeSet<LinkId>,
    status: BTreeMap<ItemId, ConflictStatus>,
    checked: BTreeSet<ItemId>,
    visited: BTreeSet<(ItemId, ItemId)>,
}

impl ConflictScan {
    fn new(graph: &DependencyGraph, source: &impl ScheduleSource) -> Self {
        let registered: Vec<ItemId> = graph.items().collect();
        let windows: BTreeMap<ItemId, ScheduleWindow> = registered
            .iter()
            .filter_map(|id| source.window(*id).map(|w| (*id, w)))
            .collect();

        let mut dependees: BTreeMap<ItemId, Vec<ItemId>> = BTreeMap::new();
        let mut has_dependant: BTreeSet<ItemId> = BTreeSet::new();
        let mut dangling = BTreeSet::new();

        for link in graph.links() {
            let Some((origin, end)) = link.endpoints() else {
                continue;
            };
            if !windows.contains_key(&origin) || !windows.contains_key(&end) {
                log::warn!(
                    "skipping {}: endpoint {} or {} has no schedule",
                    link.id,
                    origin,
                    end
                );
                dangling.insert(link.id);
                continue;
            }
            dependees.entry(end).or_default().push(origin);
            if origin != end {
                has_dependant.insert(origin);
            }
        }

        let roots = windows
            .keys()
            .copied()
            .filter(|id| !has_dependant.contains(id))
            .collect();

        Self {
            windows,
            dependees,
            roots,
            registered,
            dangling,
            status: BTreeMap::new(),
            checked: BTreeSet::new(),
            visited: BTreeSet::new(),
        }
    }

    fn run(mut self) -> ConflictReport {
        let roots = std::mem::take(&mut self.roots);
        log::debug!(
            "conflict scan: {} scheduled items, {} roots",
            self.windows.len(),
            roots.len()
        );

        for root in roots {
            if !self.checked.contains(&root) {
                self.walk(root);
            }
        }

        let statuses = self
            .registered
            .iter()
            .map(|id| (*id, self.status.get(id).copied()))
            .collect();

        ConflictReport {
            statuses,
            dangling: self.dangling.into_iter().collect(),
        }
    }

    fn walk(&mut self, root: ItemId) {
        let mut stack = vec![root];

        while let Some(&top) = stack.last() {
            if self.checked.contains(&top) {
                stack.pop();
                if let Some(&dependant) = stack.last() {
                    self.merge_into(dependant, top);
                }
                continue;
            }

            match self.next_unvisited_dependee(top) {
                Some(dependee) => {
                    // Marked on descent so a cycle cannot re-push the same edge.
                    self.visited.insert((dependee, top));
                    stack.push(dependee);
                }
                None => {
                    self.checked.insert(top);
                    self.status.entry(top).or_insert(ConflictStatus::Clear);
                }
            }
        }
    }

    fn next_unvisited_dependee(&self, dependant: ItemId) -> Option<ItemId> {
        self.dependees
            .get(&dependant)?
            .iter()
            .copied()
            .find(|dependee| !self.visited.contains(&(*dependee, dependant)))
    }

    fn merge_into(&mut self, dependant: ItemId, dependee: ItemId) {
        let (Some(&upstream), Some(&downstream)) =
            (self.windows.get(&dependee), self.windows.get(&dependant))
        else {
            return;
        };

        let inherited = self
            .status
            .get(&dependee)
            .copied()
            .unwrap_or(ConflictStatus::Clear);
        let incoming = pairwise_status(upstream, downstream).worst(inherited);

        let merged = match self.status.get(&dependant) {
            Some(current) => current.worst(incoming),
            None => incoming,
        };
        self.status.insert(dependant, merged);
    }
}

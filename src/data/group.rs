//! Chart groups: charts whose horizontal ranges move together.
//!
//! A group owns its membership list and refers to its charts weakly; each
//! member chart holds a [`GroupLink`] back to the group. Propagation never
//! holds two locks at once: the source chart is unlocked before the group is
//! locked, and the group is unlocked before any sibling is.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::data::chart::{Chart, ChartHandle, ChartId};
use crate::data::signal::XRange;
use crate::error::GroupError;
use crate::events::{EventController, EventKind, GroupMeta, ViewerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

impl GroupId {
    fn next() -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(1);
        GroupId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

struct Member {
    id: ChartId,
    chart: Weak<Mutex<Chart>>,
}

struct GroupInner {
    id: GroupId,
    members: Vec<Member>,
    dissolved: bool,
    events: Option<EventController>,
}

impl GroupInner {
    fn prune(&mut self) {
        self.members.retain(|m| m.chart.strong_count() > 0);
    }

    /// Dissolve the group once it is down to fewer than two members. Returns
    /// the charts still linked to it, to be unlinked after the group lock is
    /// released.
    fn dissolve_if_small(&mut self) -> Vec<Weak<Mutex<Chart>>> {
        if self.dissolved || self.members.len() >= 2 {
            return Vec::new();
        }
        self.dissolved = true;
        let ids = self.members.iter().map(|m| m.id).collect();
        self.emit(EventKind::CHART_UNGROUPED | EventKind::GROUP_DISSOLVED, ids);
        log::info!("{}: dissolved", self.id);
        self.members.drain(..).map(|m| m.chart).collect()
    }

    fn emit(&self, kinds: EventKind, charts: Vec<ChartId>) {
        if let Some(events) = &self.events {
            events.emit(ViewerEvent::new(kinds).with_group(GroupMeta {
                group_id: self.id,
                charts,
            }));
        }
    }
}

/// A member chart's link to its group.
#[derive(Clone)]
pub struct GroupLink {
    id: GroupId,
    group: Arc<Mutex<GroupInner>>,
}

impl GroupLink {
    pub fn id(&self) -> GroupId {
        self.id
    }
}

impl fmt::Debug for GroupLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GroupLink").field(&self.id).finish()
    }
}

/// Handle to a set of linked charts.
#[derive(Clone)]
pub struct ChartGroup {
    id: GroupId,
    inner: Arc<Mutex<GroupInner>>,
}

impl fmt::Debug for ChartGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartGroup")
            .field("id", &self.id)
            .field("members", &self.members())
            .finish()
    }
}

fn lock(inner: &Mutex<GroupInner>) -> MutexGuard<'_, GroupInner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

impl ChartGroup {
    /// Link `charts` so their visible ranges stay identical. The first
    /// chart's range is pushed to the others.
    pub fn group(charts: &[ChartHandle]) -> Result<ChartGroup, GroupError> {
        if charts.len() < 2 {
            return Err(GroupError::TooFewCharts(charts.len()));
        }
        for (i, chart) in charts.iter().enumerate() {
            if charts[..i].iter().any(|c| c.id() == chart.id()) {
                return Err(GroupError::DuplicateChart(chart.id()));
            }
            if chart.is_grouped() {
                return Err(GroupError::AlreadyGrouped(chart.id()));
            }
        }

        let id = GroupId::next();
        let events = charts.iter().find_map(|c| c.lock().events());
        let inner = Arc::new(Mutex::new(GroupInner {
            id,
            members: charts
                .iter()
                .map(|c| Member {
                    id: c.id(),
                    chart: c.downgrade(),
                })
                .collect(),
            dissolved: false,
            events,
        }));
        let link = GroupLink {
            id,
            group: inner.clone(),
        };
        for chart in charts {
            chart.lock().group = Some(link.clone());
        }
        let ids: Vec<ChartId> = charts.iter().map(|c| c.id()).collect();
        log::info!("{id}: grouped {} charts", ids.len());
        lock(&inner).emit(EventKind::CHARTS_GROUPED, ids);

        if let Some(range) = charts[0].visible_range() {
            propagate(&link, charts[0].id(), range);
        }
        Ok(ChartGroup { id, inner })
    }

    /// Remove `chart` from its group. A group left with fewer than two
    /// members is dissolved and its last member unlinked too.
    ///
    /// Returns `false` when the chart was not grouped.
    pub fn ungroup(chart: &ChartHandle) -> bool {
        let Some(link) = chart.lock().group.take() else {
            return false;
        };
        leave(&link, chart.id());
        true
    }

    /// The group `chart` belongs to, if any.
    pub fn of(chart: &ChartHandle) -> Option<ChartGroup> {
        chart.lock().group.as_ref().map(|l| ChartGroup {
            id: l.id,
            inner: l.group.clone(),
        })
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Ids of the live members.
    pub fn members(&self) -> Vec<ChartId> {
        let (ids, orphans) = {
            let mut inner = lock(&self.inner);
            inner.prune();
            let orphans = inner.dissolve_if_small();
            let ids = inner.members.iter().map(|m| m.id).collect();
            (ids, orphans)
        };
        unlink(&self.inner, orphans);
        ids
    }

    pub fn len(&self) -> usize {
        self.members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, chart: ChartId) -> bool {
        self.members().contains(&chart)
    }

    pub fn is_dissolved(&self) -> bool {
        lock(&self.inner).dissolved
    }
}

/// Mirror `range` from `source` to every other live member of the group.
///
/// Siblings clamp it into their own bound and do not propagate further.
pub(crate) fn propagate(link: &GroupLink, source: ChartId, range: XRange) {
    let (siblings, orphans): (Vec<Arc<Mutex<Chart>>>, _) = {
        let mut inner = lock(&link.group);
        if inner.dissolved {
            return;
        }
        inner.prune();
        let orphans = inner.dissolve_if_small();
        let siblings = inner
            .members
            .iter()
            .filter(|m| m.id != source)
            .filter_map(|m| m.chart.upgrade())
            .collect();
        (siblings, orphans)
    };
    unlink(&link.group, orphans);
    for sibling in siblings {
        let mut chart = sibling.lock().unwrap_or_else(|e| e.into_inner());
        chart.on_range_changed(range);
    }
}

/// Take `chart` out of the group behind `link`, dissolving the group if it
/// drops below two members. The chart itself must not be locked.
pub(crate) fn leave(link: &GroupLink, chart: ChartId) {
    let orphans = {
        let mut inner = lock(&link.group);
        if inner.dissolved {
            return;
        }
        inner.members.retain(|m| m.id != chart);
        inner.prune();
        inner.emit(EventKind::CHART_UNGROUPED, vec![chart]);
        inner.dissolve_if_small()
    };
    unlink(&link.group, orphans);
}

/// Clear the link of every chart in `orphans` that still points at `group`.
fn unlink(group: &Arc<Mutex<GroupInner>>, orphans: Vec<Weak<Mutex<Chart>>>) {
    for orphan in orphans.iter().filter_map(Weak::upgrade) {
        let mut c = orphan.lock().unwrap_or_else(|e| e.into_inner());
        if c.group.as_ref().is_some_and(|l| Arc::ptr_eq(&l.group, group)) {
            c.group = None;
        }
    }
}

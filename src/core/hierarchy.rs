//! Level propagation between units
//!
//! Units live in an arena and refer to each other by [`UnitId`]. A unit may
//! have any number of parents. Setting a unit's level pins it on that unit
//! and pushes it down to every descendant reachable through units without a
//! pinned level of their own. A pinned unit ignores what its parents push
//! and shields its own subtree.
//!
//! Propagation tracks visited units, so an accidental cycle ends the walk
//! instead of looping.

use super::log_level::LogLevel;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const NO_LEVEL: u8 = u8::MAX;

fn encode(level: Option<LogLevel>) -> u8 {
    level.map_or(NO_LEVEL, LogLevel::priority)
}

fn decode(raw: u8) -> Option<LogLevel> {
    LogLevel::from_priority(raw)
}

/// Effective and pinned level of one unit, readable without locking
#[derive(Debug)]
pub struct LevelState {
    effective: AtomicU8,
    pinned: AtomicU8,
}

impl LevelState {
    pub fn new(effective: Option<LogLevel>, pinned: Option<LogLevel>) -> Self {
        Self {
            effective: AtomicU8::new(encode(effective)),
            pinned: AtomicU8::new(encode(pinned)),
        }
    }

    #[inline]
    pub fn effective(&self) -> Option<LogLevel> {
        decode(self.effective.load(Ordering::Acquire))
    }

    #[inline]
    pub fn pinned(&self) -> Option<LogLevel> {
        decode(self.pinned.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pinned.load(Ordering::Acquire) != NO_LEVEL
    }

    #[inline]
    pub fn displays(&self, level: LogLevel) -> bool {
        level.displays_with(self.effective())
    }

    fn set_effective(&self, level: LogLevel) {
        self.effective.store(level.priority(), Ordering::Release);
    }

    fn pin(&self, level: LogLevel) {
        self.pinned.store(level.priority(), Ordering::Release);
        self.set_effective(level);
    }
}

/// Handle of a unit in a [`UnitGraph`].
///
/// Slots of removed units are reused; the generation keeps a handle to a
/// removed unit from reaching the unit that took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    index: usize,
    generation: u32,
}

impl UnitId {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct UnitNode {
    levels: Arc<LevelState>,
    parents: Vec<UnitId>,
    children: Vec<UnitId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<UnitNode>,
}

/// Arena of units and their parent/child edges
#[derive(Debug, Default)]
pub struct UnitGraph {
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
}

impl UnitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit. A `pinned` level is both pinned and effective; otherwise
    /// the unit starts at `inherited` and follows its parents.
    pub fn add_unit(&mut self, pinned: Option<LogLevel>, inherited: Option<LogLevel>) -> UnitId {
        let levels = match pinned {
            Some(level) => LevelState::new(Some(level), Some(level)),
            None => LevelState::new(inherited, None),
        };
        self.add_unit_with(Arc::new(levels))
    }

    pub(crate) fn add_unit_with(&mut self, levels: Arc<LevelState>) -> UnitId {
        let node = UnitNode {
            levels,
            parents: Vec::new(),
            children: Vec::new(),
        };
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            return UnitId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        UnitId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    pub fn levels(&self, unit: UnitId) -> Option<&Arc<LevelState>> {
        self.node(unit).map(|n| &n.levels)
    }

    pub fn effective_level(&self, unit: UnitId) -> Option<LogLevel> {
        self.node(unit).and_then(|n| n.levels.effective())
    }

    pub fn pinned_level(&self, unit: UnitId) -> Option<LogLevel> {
        self.node(unit).and_then(|n| n.levels.pinned())
    }

    pub fn parents(&self, unit: UnitId) -> &[UnitId] {
        self.node(unit).map_or(&[], |n| n.parents.as_slice())
    }

    pub fn children(&self, unit: UnitId) -> &[UnitId] {
        self.node(unit).map_or(&[], |n| n.children.as_slice())
    }

    /// Link `child` under `parent`.
    ///
    /// An unpinned child adopts the parent's effective level right away, and
    /// passes it on to its own unpinned descendants. Returns `false` when the
    /// edge already existed or either unit is unknown.
    pub fn add_parent(&mut self, child: UnitId, parent: UnitId) -> bool {
        if !self.link(child, parent) {
            return false;
        }

        if let (Some(child_node), Some(parent_node)) = (self.node(child), self.node(parent)) {
            if !child_node.levels.is_pinned() {
                if let Some(level) = parent_node.levels.effective() {
                    child_node.levels.set_effective(level);
                    self.push_down(child, level);
                }
            }
        }
        true
    }

    /// Link `child` under `parent` without touching the child's level. Later
    /// levels set on `parent` still reach it.
    pub fn add_parent_keeping_level(&mut self, child: UnitId, parent: UnitId) -> bool {
        self.link(child, parent)
    }

    pub fn remove_parent(&mut self, child: UnitId, parent: UnitId) -> bool {
        let Some(node) = self.node_mut(child) else {
            return false;
        };
        let before = node.parents.len();
        node.parents.retain(|p| *p != parent);
        if node.parents.len() == before {
            return false;
        }
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|c| *c != child);
        }
        true
    }

    /// Pin `level` on `unit` and propagate it. Returns the number of other
    /// units whose effective level was updated.
    pub fn set_level(&mut self, unit: UnitId, level: LogLevel) -> usize {
        let Some(node) = self.node(unit) else {
            return 0;
        };
        node.levels.pin(level);
        self.push_down(unit, level)
    }

    /// Drop every edge of `unit` and free its slot for reuse
    pub fn remove_unit(&mut self, unit: UnitId) {
        let Some(node) = self.slots.get_mut(unit.index).and_then(|slot| {
            if slot.generation == unit.generation {
                slot.node.take()
            } else {
                None
            }
        }) else {
            return;
        };
        self.free.push(unit.index);
        self.live -= 1;

        for parent in node.parents {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|c| *c != unit);
            }
        }
        for child in node.children {
            if let Some(child_node) = self.node_mut(child) {
                child_node.parents.retain(|p| *p != unit);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slots allocated so far, live or free
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn link(&mut self, child: UnitId, parent: UnitId) -> bool {
        if child == parent || self.node(parent).is_none() {
            return false;
        }
        match self.node_mut(child) {
            Some(node) if !node.parents.contains(&parent) => node.parents.push(parent),
            _ => return false,
        }
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(child);
        }
        true
    }

    fn node(&self, unit: UnitId) -> Option<&UnitNode> {
        self.slots
            .get(unit.index)
            .filter(|slot| slot.generation == unit.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, unit: UnitId) -> Option<&mut UnitNode> {
        self.slots
            .get_mut(unit.index)
            .filter(|slot| slot.generation == unit.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn push_down(&self, from: UnitId, level: LogLevel) -> usize {
        let mut visited = HashSet::from([from]);
        let mut stack: Vec<UnitId> = self.children(from).to_vec();
        let mut updated = 0;

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(node) = self.node(current) else {
                continue;
            };
            if node.levels.is_pinned() {
                continue;
            }
            node.levels.set_effective(level);
            updated += 1;
            stack.extend(node.children.iter().copied());
        }

        updated
    }
}

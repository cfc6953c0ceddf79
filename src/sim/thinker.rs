//! Thinker arena.
//!
//! Thinkers live in generation-counted slots and run in insertion order.
//! Removing one only condemns its slot; the slot is reclaimed when a later
//! pass reaches it, so a thinker may remove itself or any other thinker
//! while a pass is in progress.

use hecs::Entity;

use super::lights::Light;
use super::mob;
use super::movers::{Ceiling, Door, Plat};
use super::world::World;

/// Stable handle to a thinker slot.  A handle whose slot has been reclaimed
/// never resolves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThinkerId {
    index: u32,
    generation: u32,
}

/// Extension point for thinkers defined outside the core.
pub trait Think {
    fn think(&mut self, world: &mut World, me: ThinkerId);
}

pub enum ThinkerKind {
    /// Map object movement + state timer.
    Mobj(Entity),
    Light(Light),
    Door(Door),
    Plat(Plat),
    Ceiling(Ceiling),
    Custom(Box<dyn Think>),
}

impl ThinkerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ThinkerKind::Mobj(_) => "mobj",
            ThinkerKind::Light(_) => "light",
            ThinkerKind::Door(_) => "door",
            ThinkerKind::Plat(_) => "plat",
            ThinkerKind::Ceiling(_) => "ceiling",
            ThinkerKind::Custom(_) => "custom",
        }
    }
}

impl std::fmt::Debug for ThinkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

struct Slot {
    generation: u32,
    condemned: bool,
    /// Empty while the thinker is running or after reclamation.
    body: Option<ThinkerKind>,
}

#[derive(Default)]
pub struct Thinkers {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Run order; may still hold condemned slots until the next pass.
    order: Vec<u32>,
    /// Bumped by `clear`, so a pass can tell its snapshot is gone.
    clears: u32,
}

impl Thinkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a thinker.  It first runs on the pass after the current one.
    pub fn add(&mut self, kind: ThinkerKind) -> ThinkerId {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    condemned: false,
                    body: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.condemned = false;
        slot.body = Some(kind);
        self.order.push(index);
        ThinkerId {
            index,
            generation: slot.generation,
        }
    }

    /// Condemn `id`.  Repeated calls, or calls with a stale handle, do nothing.
    pub fn remove(&mut self, id: ThinkerId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.condemned = true;
        }
    }

    pub fn is_alive(&self, id: ThinkerId) -> bool {
        self.slot(id).is_some_and(|s| !s.condemned)
    }

    pub fn get(&self, id: ThinkerId) -> Option<&ThinkerKind> {
        self.slot(id)
            .filter(|s| !s.condemned)
            .and_then(|s| s.body.as_ref())
    }

    pub fn get_mut(&mut self, id: ThinkerId) -> Option<&mut ThinkerKind> {
        self.slot_mut(id)
            .filter(|s| !s.condemned)
            .and_then(|s| s.body.as_mut())
    }

    /// Entries in the run order, condemned ones included until unlinked.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.order
            .iter()
            .filter(|&&i| !self.slots[i as usize].condemned)
            .count()
    }

    /// Live handles in run order.
    pub fn ids(&self) -> impl Iterator<Item = ThinkerId> + '_ {
        self.order.iter().filter_map(|&index| {
            let slot = &self.slots[index as usize];
            (!slot.condemned).then_some(ThinkerId {
                index,
                generation: slot.generation,
            })
        })
    }

    /// Drop every thinker.  Outstanding handles go stale.
    pub fn clear(&mut self) {
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate().rev() {
            slot.generation = slot.generation.wrapping_add(1);
            slot.condemned = false;
            slot.body = None;
            self.free.push(i as u32);
        }
        self.order.clear();
        self.clears = self.clears.wrapping_add(1);
    }

    fn slot(&self, id: ThinkerId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
    }

    fn slot_mut(&mut self, id: ThinkerId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
    }

    fn reclaim(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.condemned = false;
        slot.body = None;
        self.free.push(index);
    }
}

/// One scheduler pass over `world.thinkers`.
///
/// Only the entries present when the pass starts are visited.  Condemned
/// entries are unlinked and reclaimed without being called.  A thinker that
/// clears the registry ends the pass; whatever it added afterwards stays.
pub fn run(world: &mut World) {
    let count = world.thinkers.order.len();
    let epoch = world.thinkers.clears;
    let mut kept = Vec::with_capacity(count);

    for pos in 0..count {
        let Some(&index) = world.thinkers.order.get(pos) else {
            return;
        };
        let slot = &mut world.thinkers.slots[index as usize];
        if slot.condemned {
            world.thinkers.reclaim(index);
            continue;
        }
        kept.push(index);

        let me = ThinkerId {
            index,
            generation: slot.generation,
        };
        let Some(mut body) = slot.body.take() else {
            continue;
        };
        dispatch(&mut body, world, me);
        if world.thinkers.clears != epoch {
            return;
        }
        if let Some(slot) = world.thinkers.slot_mut(me) {
            slot.body = Some(body);
        }
    }

    let thinkers = &mut world.thinkers;
    kept.extend_from_slice(&thinkers.order[count..]);
    thinkers.order = kept;
}

fn dispatch(body: &mut ThinkerKind, world: &mut World, me: ThinkerId) {
    match body {
        ThinkerKind::Mobj(e) => mob::mobj_think(world, *e, me),
        ThinkerKind::Light(light) => light.think(world),
        ThinkerKind::Door(door) => door.think(world, me),
        ThinkerKind::Plat(plat) => plat.think(world, me),
        ThinkerKind::Ceiling(ceiling) => ceiling.think(world, me),
        ThinkerKind::Custom(custom) => custom.think(world, me),
    }
}

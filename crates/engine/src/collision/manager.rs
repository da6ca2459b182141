use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::Shape;
use crate::message::{HandlerId, Message, MessageBus, MessageSink, Sender};

pub const COLLISION_ENTRY_PREFIX: &str = "COLLISION_ENTRY: ";
pub const COLLISION_EXIT_PREFIX: &str = "COLLISION_EXIT: ";

const SENDER: Sender = Sender::System("collision_manager");

pub fn collision_entry_code(name: &str) -> String {
    format!("{COLLISION_ENTRY_PREFIX}{name}")
}

pub fn collision_exit_code(name: &str) -> String {
    format!("{COLLISION_EXIT_PREFIX}{name}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collidable {
    pub handle: HandlerId,
    pub name: String,
    pub shape: Shape,
}

/// Identity of the other side of a collision, as seen by a hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollidableInfo {
    pub handle: HandlerId,
    pub name: String,
}

/// Context payload of `COLLISION_ENTRY`/`COLLISION_EXIT` messages.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionData {
    pub a: CollidableInfo,
    pub b: CollidableInfo,
    /// Total elapsed time when the pair was last seen touching.
    pub time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionPhase {
    Entry,
    Update,
    Exit,
}

pub trait CollisionSink: MessageSink {
    /// Returns `false` when `this` is not reachable through the sink.
    fn on_collision(
        &mut self,
        phase: CollisionPhase,
        this: HandlerId,
        other: &CollidableInfo,
    ) -> bool;
}

#[derive(Debug)]
struct ActivePair {
    a: CollidableInfo,
    b: CollidableInfo,
    time: f64,
    tick: u64,
}

impl ActivePair {
    fn joins(&self, first: HandlerId, second: HandlerId) -> bool {
        (self.a.handle == first && self.b.handle == second)
            || (self.a.handle == second && self.b.handle == first)
    }

    fn involves(&self, handle: HandlerId) -> bool {
        self.a.handle == handle || self.b.handle == handle
    }
}

#[derive(Debug)]
struct PendingEvent {
    phase: CollisionPhase,
    a: CollidableInfo,
    b: CollidableInfo,
    time: f64,
}

/// Pairwise intersection tests over every registered collidable, once per update.
///
/// A pair is active exactly when its shapes intersected during the most recent
/// update. Entry and exit are reported through hooks and high-priority messages;
/// a continuing contact only invokes the update hook.
#[derive(Debug, Default)]
pub struct CollisionManager {
    collidables: Vec<Collidable>,
    active: Vec<ActivePair>,
    total_time: f64,
    tick: u64,
}

impl CollisionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, collidable: Collidable) {
        if let Some(existing) = self
            .collidables
            .iter_mut()
            .find(|existing| existing.handle == collidable.handle)
        {
            warn!(
                handle = %collidable.handle,
                name = %collidable.name,
                "collidable_registered_twice"
            );
            *existing = collidable;
            return;
        }
        debug!(handle = %collidable.handle, name = %collidable.name, "collidable_registered");
        self.collidables.push(collidable);
    }

    /// Active pairs that reference the collidable are dropped without exit notifications.
    pub fn unregister(&mut self, handle: HandlerId) -> bool {
        let before = self.collidables.len();
        self.collidables.retain(|collidable| collidable.handle != handle);
        self.active.retain(|pair| !pair.involves(handle));
        let removed = self.collidables.len() != before;
        if !removed {
            debug!(handle = %handle, "unregister_unknown_collidable");
        }
        removed
    }

    pub fn sync_shape(&mut self, handle: HandlerId, shape: Shape) -> bool {
        match self
            .collidables
            .iter_mut()
            .find(|collidable| collidable.handle == handle)
        {
            Some(collidable) => {
                collidable.shape = shape;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, handle: HandlerId) -> Option<&Collidable> {
        self.collidables
            .iter()
            .find(|collidable| collidable.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.collidables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collidables.is_empty()
    }

    pub fn active_pair_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_touching(&self, first: HandlerId, second: HandlerId) -> bool {
        self.active.iter().any(|pair| pair.joins(first, second))
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn clear(&mut self) {
        self.collidables.clear();
        self.active.clear();
    }

    pub fn update<S: CollisionSink + ?Sized>(
        &mut self,
        dt_seconds: f32,
        bus: &mut MessageBus,
        sink: &mut S,
    ) {
        self.total_time += f64::from(dt_seconds);
        self.tick = self.tick.wrapping_add(1);
        let events = self.sweep();
        for event in events {
            Self::dispatch(event, bus, sink);
        }
    }

    fn sweep(&mut self) -> Vec<PendingEvent> {
        let mut events = Vec::new();
        for (index, first) in self.collidables.iter().enumerate() {
            for second in &self.collidables[index + 1..] {
                if !first.shape.intersects(&second.shape) {
                    continue;
                }
                let a = info(first);
                let b = info(second);
                match self
                    .active
                    .iter_mut()
                    .find(|pair| pair.joins(first.handle, second.handle))
                {
                    Some(pair) => {
                        pair.time = self.total_time;
                        pair.tick = self.tick;
                        events.push(PendingEvent {
                            phase: CollisionPhase::Update,
                            a,
                            b,
                            time: self.total_time,
                        });
                    }
                    None => {
                        self.active.push(ActivePair {
                            a: a.clone(),
                            b: b.clone(),
                            time: self.total_time,
                            tick: self.tick,
                        });
                        events.push(PendingEvent {
                            phase: CollisionPhase::Entry,
                            a,
                            b,
                            time: self.total_time,
                        });
                    }
                }
            }
        }

        let tick = self.tick;
        let (live, stale): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|pair| pair.tick == tick);
        self.active = live;
        events.extend(stale.into_iter().map(|pair| PendingEvent {
            phase: CollisionPhase::Exit,
            a: pair.a,
            b: pair.b,
            time: pair.time,
        }));
        events
    }

    fn dispatch<S: CollisionSink + ?Sized>(event: PendingEvent, bus: &mut MessageBus, sink: &mut S) {
        for (this, other) in [(&event.a, &event.b), (&event.b, &event.a)] {
            if !sink.on_collision(event.phase, this.handle, other) {
                trace!(handle = %this.handle, phase = ?event.phase, "collision_hook_unreachable");
            }
        }

        let code_for: fn(&str) -> String = match event.phase {
            CollisionPhase::Entry => collision_entry_code,
            CollisionPhase::Exit => collision_exit_code,
            CollisionPhase::Update => return,
        };
        debug!(a = %event.a.name, b = %event.b.name, phase = ?event.phase, "collision_event");
        let codes = [code_for(&event.a.name), code_for(&event.b.name)];
        let data: Rc<CollisionData> = Rc::new(CollisionData {
            a: event.a,
            b: event.b,
            time: event.time,
        });
        for code in codes {
            bus.post(
                Message::high(code, SENDER).with_shared_context(data.clone()),
                sink,
            );
        }
    }
}

fn info(collidable: &Collidable) -> CollidableInfo {
    CollidableInfo {
        handle: collidable.handle,
        name: collidable.name.clone(),
    }
}

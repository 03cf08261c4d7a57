use slotmap::SlotMap;
use tracing::{debug, trace};

use super::broadphase::{Broadphase, BroadphaseKind};
use super::contact_manager::{ContactManager, PairKey, ProxyPair};
use super::dispatch::{NarrowPhase, NarrowPhaseSettings};
use crate::objects::{CollideObject, ObjectHandle, PhyObject};

/// Per-step collision pipeline: broad phase, pair maintenance and manifold refresh.
pub struct CollisionManager {
    broadphase: Broadphase,
    contacts: ContactManager,
    narrow_phase: NarrowPhase,
}

impl CollisionManager {
    pub fn new(kind: BroadphaseKind, margin: f64) -> Self {
        Self {
            broadphase: Broadphase::new(kind, margin),
            contacts: ContactManager::new(),
            narrow_phase: NarrowPhase::new(),
        }
    }

    pub fn broadphase(&self) -> &Broadphase {
        &self.broadphase
    }

    pub fn contacts(&self) -> &ContactManager {
        &self.contacts
    }

    pub fn pair(&self, key: PairKey) -> Option<&ProxyPair> {
        self.contacts.pair(key)
    }

    pub(crate) fn pair_mut(&mut self, key: PairKey) -> Option<&mut ProxyPair> {
        self.contacts.pairs_mut().get_mut(key)
    }

    /// Allocates the broad-phase proxy of a freshly created object.
    pub fn register(&mut self, handle: ObjectHandle, collider: &mut CollideObject) {
        debug_assert!(!collider.is_registered());
        let proxy = self.broadphase.create_proxy(handle, collider.compute_aabb());
        collider.proxy = Some(proxy);
    }

    /// Drops the proxy of an object and every pair (and manifold) it was part of.
    /// Returns `false` if the object was never registered.
    pub fn unregister(&mut self, collider: &mut CollideObject) -> bool {
        let Some(proxy) = collider.proxy.take() else {
            return false;
        };
        self.broadphase.destroy_proxy(proxy, &mut self.contacts).is_some()
    }

    /// Runs collision detection for one step and collects the pairs whose manifold is
    /// active afterwards into `active`.
    pub fn process(
        &mut self,
        objects: &SlotMap<ObjectHandle, PhyObject>,
        settings: &NarrowPhaseSettings,
        active: &mut Vec<PairKey>,
    ) {
        for object in objects.values() {
            let collider = object.collider();
            if let Some(proxy) = collider.proxy {
                self.broadphase.update_proxy(proxy, collider.compute_aabb());
            }
        }

        self.broadphase.update_pairs(&mut self.contacts);

        for (key, pair) in self.contacts.pairs_mut().iter_mut() {
            let [handle_a, handle_b] = pair.objects;
            let (Some(object_a), Some(object_b)) = (objects.get(handle_a), objects.get(handle_b)) else {
                pair.manifold.clear();
                continue;
            };
            if !simulated_pair(object_a, object_b) {
                pair.manifold.clear();
                continue;
            }

            let (a, b) = (object_a.collider(), object_b.collider());
            let result = self.narrow_phase.collide(
                a.shape(),
                &a.transform(),
                b.shape(),
                &b.transform(),
                settings,
            );
            match result {
                Some(result) => {
                    let was_active = pair.manifold.is_active();
                    pair.manifold.update(&result);
                    if !was_active {
                        debug!(?handle_a, ?handle_b, points = result.contacts.len(), "contact started");
                    }
                    active.push(key);
                }
                None => pair.manifold.clear(),
            }
        }

        trace!(pairs = self.contacts.len(), active = active.len(), "collision processed");
    }
}

/// Only body pairs with at least one movable side feed the solver.
fn simulated_pair(a: &PhyObject, b: &PhyObject) -> bool {
    match (a.motion_type(), b.motion_type()) {
        (Some(ma), Some(mb)) => !(ma.is_immovable() && mb.is_immovable()),
        _ => false,
    }
}

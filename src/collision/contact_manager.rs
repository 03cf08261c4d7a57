use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::warn;

use super::broadphase::{CollisionProxy, ProxyKey};
use super::manifold::ContactManifold;
use crate::objects::ObjectHandle;

slotmap::new_key_type! {
    pub struct PairKey;
}

/// Two overlapping proxies and the contact manifold they own.
#[derive(Debug, Clone)]
pub struct ProxyPair {
    /// Ascending key order.
    pub proxies: [ProxyKey; 2],
    /// Owners of `proxies`, same order.
    pub objects: [ObjectHandle; 2],
    pub manifold: ContactManifold,
}

/// Owns every proxy pair. Creating and destroying pairs is the only way manifolds
/// come and go.
#[derive(Debug, Default)]
pub struct ContactManager {
    pairs: SlotMap<PairKey, ProxyPair>,
    index: HashMap<(ProxyKey, ProxyKey), PairKey>,
}

fn canonical(a: ProxyKey, b: ProxyKey) -> (ProxyKey, ProxyKey) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl ContactManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &SlotMap<PairKey, ProxyPair> {
        &self.pairs
    }

    pub fn pairs_mut(&mut self) -> &mut SlotMap<PairKey, ProxyPair> {
        &mut self.pairs
    }

    pub fn pair(&self, key: PairKey) -> Option<&ProxyPair> {
        self.pairs.get(key)
    }

    pub fn find_proxy_pair(&self, a: ProxyKey, b: ProxyKey) -> Option<PairKey> {
        self.index.get(&canonical(a, b)).copied()
    }

    /// Creates the pair `(a, b)` with an empty manifold. Returns `false` if it
    /// already exists.
    pub fn add_proxy_pair(
        &mut self,
        proxies: &mut SlotMap<ProxyKey, CollisionProxy>,
        a: ProxyKey,
        b: ProxyKey,
    ) -> bool {
        debug_assert_ne!(a, b, "a proxy cannot pair with itself");
        let (a, b) = canonical(a, b);
        if a == b || self.index.contains_key(&(a, b)) {
            return false;
        }
        let (object_a, object_b) = match (proxies.get(a), proxies.get(b)) {
            (Some(pa), Some(pb)) => (pa.object, pb.object),
            _ => {
                warn!(?a, ?b, "pairing unknown proxy ignored");
                return false;
            }
        };

        let key = self.pairs.insert(ProxyPair {
            proxies: [a, b],
            objects: [object_a, object_b],
            manifold: ContactManifold::default(),
        });
        self.index.insert((a, b), key);
        for proxy in [a, b] {
            if let Some(p) = proxies.get_mut(proxy) {
                p.pairs.push(key);
            }
        }
        true
    }

    /// Destroys the pair `(a, b)` and its manifold. Returns `false` if absent.
    pub fn remove_proxy_pair(
        &mut self,
        proxies: &mut SlotMap<ProxyKey, CollisionProxy>,
        a: ProxyKey,
        b: ProxyKey,
    ) -> bool {
        let Some(key) = self.index.remove(&canonical(a, b)) else {
            return false;
        };
        self.pairs.remove(key);
        for proxy in [a, b] {
            if let Some(p) = proxies.get_mut(proxy) {
                p.pairs.retain(|&k| k != key);
            }
        }
        true
    }

    /// Drops every pair the proxy participates in.
    pub fn remove_proxy(&mut self, proxies: &mut SlotMap<ProxyKey, CollisionProxy>, proxy: ProxyKey) {
        let Some(pair_keys) = proxies.get_mut(proxy).map(|p| std::mem::take(&mut p.pairs)) else {
            return;
        };
        for key in pair_keys {
            if let Some(pair) = self.pairs.get(key) {
                let [a, b] = pair.proxies;
                self.remove_proxy_pair(proxies, a, b);
            }
        }
    }
}

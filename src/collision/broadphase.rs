use slotmap::SlotMap;
use tracing::{trace, warn};

use super::contact_manager::{ContactManager, PairKey};
use super::spatial_grid::SpatialGrid;
use super::AABB;
use crate::objects::ObjectHandle;

slotmap::new_key_type! {
    /// Handle to a broad-phase proxy.
    pub struct ProxyKey;
}

/// Broad-phase representative of one collide object.
#[derive(Debug, Clone)]
pub struct CollisionProxy {
    /// Shape bounds inflated by the broad-phase margin.
    pub aabb: AABB,
    pub object: ObjectHandle,
    /// Every pair this proxy takes part in, so destruction can drop them directly.
    pub(crate) pairs: Vec<PairKey>,
}

impl CollisionProxy {
    pub fn pairs(&self) -> &[PairKey] {
        &self.pairs
    }
}

/// Strategy for enumerating candidate pairs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BroadphaseKind {
    /// Test every proxy against every other one.
    #[default]
    BruteForce,
    /// Bin proxies into a uniform grid over `bounds`. Proxies outside the bounds are
    /// clamped into the border cells, so the grid only affects speed.
    Grid { bounds: AABB, cell_size: f64 },
}

pub struct Broadphase {
    proxies: SlotMap<ProxyKey, CollisionProxy>,
    grid: Option<SpatialGrid>,
    margin: f64,
    keys: Vec<ProxyKey>,
    stale: Vec<(ProxyKey, ProxyKey)>,
}

impl Broadphase {
    pub fn new(kind: BroadphaseKind, margin: f64) -> Self {
        let grid = match kind {
            BroadphaseKind::BruteForce => None,
            BroadphaseKind::Grid { bounds, cell_size } => {
                let grid = SpatialGrid::new(bounds, cell_size);
                if grid.is_none() {
                    warn!(?bounds, cell_size, "unusable grid settings, falling back to brute force");
                }
                grid
            }
        };
        Self {
            proxies: SlotMap::with_key(),
            grid,
            margin,
            keys: Vec::new(),
            stale: Vec::new(),
        }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn proxy(&self, key: ProxyKey) -> Option<&CollisionProxy> {
        self.proxies.get(key)
    }

    pub fn proxies(&self) -> &SlotMap<ProxyKey, CollisionProxy> {
        &self.proxies
    }

    /// Registers an object; `shape_aabb` is its tight bounds.
    pub fn create_proxy(&mut self, object: ObjectHandle, shape_aabb: AABB) -> ProxyKey {
        self.proxies.insert(CollisionProxy {
            aabb: shape_aabb.expand(self.margin),
            object,
            pairs: Vec::new(),
        })
    }

    /// Drops a proxy together with all of its pairs.
    pub fn destroy_proxy(&mut self, key: ProxyKey, contacts: &mut ContactManager) -> Option<CollisionProxy> {
        contacts.remove_proxy(&mut self.proxies, key);
        self.proxies.remove(key)
    }

    pub fn update_proxy(&mut self, key: ProxyKey, shape_aabb: AABB) {
        if let Some(proxy) = self.proxies.get_mut(key) {
            proxy.aabb = shape_aabb.expand(self.margin);
        }
    }

    /// Brings the pair set in line with the current proxy bounds: overlapping proxies
    /// get a pair, pairs whose bounds have separated are removed.
    pub fn update_pairs(&mut self, contacts: &mut ContactManager) {
        self.keys.clear();
        self.keys.extend(self.proxies.keys());

        match self.grid.as_mut() {
            None => {
                for i in 0..self.keys.len() {
                    for j in (i + 1)..self.keys.len() {
                        let (a, b) = (self.keys[i], self.keys[j]);
                        if self.proxies[a].aabb.overlaps(&self.proxies[b].aabb) {
                            contacts.add_proxy_pair(&mut self.proxies, a, b);
                        } else {
                            contacts.remove_proxy_pair(&mut self.proxies, a, b);
                        }
                    }
                }
            }
            Some(grid) => {
                grid.clear();
                for &key in &self.keys {
                    grid.insert(key, &self.proxies[key].aabb);
                }
                for (a, b) in grid.query_potential_pairs() {
                    if self.proxies[a].aabb.overlaps(&self.proxies[b].aabb) {
                        contacts.add_proxy_pair(&mut self.proxies, a, b);
                    }
                }

                // Pairs the grid no longer proposes still need their overlap re-checked.
                self.stale.clear();
                for pair in contacts.pairs().values() {
                    let [a, b] = pair.proxies;
                    if !self.proxies[a].aabb.overlaps(&self.proxies[b].aabb) {
                        self.stale.push((a, b));
                    }
                }
                for &(a, b) in &self.stale {
                    contacts.remove_proxy_pair(&mut self.proxies, a, b);
                }
            }
        }

        trace!(proxies = self.proxies.len(), pairs = contacts.len(), "broadphase updated");
    }
}

use tinyvec::ArrayVec;

use crate::math::vec2::Vec2;

pub const MAX_MANIFOLD_POINTS: usize = 4;

/// One narrow-phase contact point. The normal points from body A towards body B.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Contact {
    /// Contact point on body A in world coordinates.
    pub world_a: Vec2,
    /// Contact point on body B in world coordinates.
    pub world_b: Vec2,
    /// Contact point on body A in A's local space.
    pub local_a: Vec2,
    /// Contact point on body B in B's local space.
    pub local_b: Vec2,
    pub normal: Vec2,
    pub depth: f64,
}

impl Contact {
    fn flip(&mut self) {
        std::mem::swap(&mut self.world_a, &mut self.world_b);
        std::mem::swap(&mut self.local_a, &mut self.local_b);
        self.normal = -self.normal;
    }
}

/// Complete narrow-phase answer for one pair of shapes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollisionResult {
    pub contacts: ArrayVec<[Contact; MAX_MANIFOLD_POINTS]>,
    /// World normal from A towards B.
    pub normal: Vec2,
    /// Normal in the reference body's local space, pointing away from it.
    pub local_normal: Vec2,
    /// Whether body A is the reference body.
    pub ref_is_a: bool,
    /// Whether accumulated impulses may be carried over from the previous step.
    pub persistent: bool,
}

impl CollisionResult {
    /// A single-point result with A as the reference body.
    pub fn single(contact: Contact, local_normal: Vec2) -> Self {
        let mut contacts = ArrayVec::new();
        contacts.push(contact);
        Self {
            contacts,
            normal: contact.normal,
            local_normal,
            ref_is_a: true,
            persistent: true,
        }
    }

    /// Re-expresses the result with the roles of A and B exchanged.
    pub fn flip(&mut self) {
        for contact in self.contacts.iter_mut() {
            contact.flip();
        }
        self.normal = -self.normal;
        // Same physical reference body, now on the other side of the pair.
        self.ref_is_a = !self.ref_is_a;
    }
}

/// Persistent contact point kept in a manifold across steps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ManifoldPoint {
    pub world_a: Vec2,
    pub world_b: Vec2,
    pub local_a: Vec2,
    pub local_b: Vec2,
    pub normal_impulse: f64,
    pub tangent_impulse: f64,
    pub depth: f64,
}

/// Contact state owned by a proxy pair.
///
/// Empty while the narrow phase reports nothing; active while `num_contacts() > 0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactManifold {
    points: ArrayVec<[ManifoldPoint; MAX_MANIFOLD_POINTS]>,
    age: u32,
    pub local_normal: Vec2,
    pub ref_is_a: bool,
    pub normal: Vec2,
    pub velocity_bias: f64,
}

impl ContactManifold {
    pub fn num_contacts(&self) -> usize {
        self.points.len()
    }

    pub fn is_active(&self) -> bool {
        !self.points.is_empty()
    }

    /// Steps since this manifold last became active.
    pub fn age(&self) -> u32 {
        self.age
    }

    /// True on the step the contact started; used for impact effects.
    pub fn is_new(&self) -> bool {
        self.is_active() && self.age == 0
    }

    pub fn points(&self) -> &[ManifoldPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [ManifoldPoint] {
        &mut self.points
    }

    /// Deepest penetration over all points.
    pub fn max_depth(&self) -> f64 {
        self.points.iter().fold(0.0, |acc, p| acc.max(p.depth))
    }

    /// Replaces the points with a fresh narrow-phase result.
    pub(crate) fn update(&mut self, result: &CollisionResult) {
        let was_active = self.is_active();
        if was_active {
            self.age = self.age.saturating_add(1);
        } else {
            self.age = 0;
        }

        let keep_impulses =
            was_active && result.persistent && self.points.len() == result.contacts.len();
        let previous = std::mem::take(&mut self.points);

        for (i, contact) in result.contacts.iter().enumerate() {
            let (normal_impulse, tangent_impulse) = if keep_impulses {
                (previous[i].normal_impulse, previous[i].tangent_impulse)
            } else {
                (0.0, 0.0)
            };
            self.points.push(ManifoldPoint {
                world_a: contact.world_a,
                world_b: contact.world_b,
                local_a: contact.local_a,
                local_b: contact.local_b,
                normal_impulse,
                tangent_impulse,
                depth: contact.depth.max(0.0),
            });
        }

        self.normal = result.normal;
        self.local_normal = result.local_normal;
        self.ref_is_a = result.ref_is_a;
        self.velocity_bias = 0.0;
    }

    /// The narrow phase did not confirm the contact this step.
    pub(crate) fn clear(&mut self) {
        self.points.clear();
        self.velocity_bias = 0.0;
    }
}

//! Object pools for short-lived entities
//!
//! Bullets and effects churn every tick. Each kind gets its own free list so a
//! retired instance can be handed back out instead of built from scratch.
//!
//! Capacity is enforced on release, not on acquire: `discard-oldest` keeps
//! handing out fresh instances past the cap and trims the free list afterwards.
//! Only the `error` policy refuses an acquisition.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::{PoolConfig, PoolSettings};
use super::state::{Bullet, Explosion, HealthHit, Particle, ShieldHit};

/// Entity kinds that are pooled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolKind {
    Bullet,
    Explosion,
    ShieldHit,
    HealthHit,
    Particle,
}

impl PoolKind {
    pub const ALL: [PoolKind; 5] = [
        PoolKind::Bullet,
        PoolKind::Explosion,
        PoolKind::ShieldHit,
        PoolKind::HealthHit,
        PoolKind::Particle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolKind::Bullet => "bullet",
            PoolKind::Explosion => "explosion",
            PoolKind::ShieldHit => "shield-hit",
            PoolKind::HealthHit => "health-hit",
            PoolKind::Particle => "particle",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a pool does once its free list outgrows the configured capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Never evict, never refuse
    #[default]
    Grow,
    /// Evict the longest-retired instance first
    DiscardOldest,
    /// Refuse acquisitions past capacity; evict newest-first on release
    Error,
}

impl OverflowPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "grow" => Some(OverflowPolicy::Grow),
            "discard-oldest" | "discard_oldest" | "oldest" => Some(OverflowPolicy::DiscardOldest),
            "error" => Some(OverflowPolicy::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("{kind} pool exhausted (capacity {capacity})")]
    Exhausted { kind: PoolKind, capacity: usize },
}

/// An entity that can live in a [`Pool`]
pub trait Poolable: Sized {
    /// Arguments used to build or re-initialize an instance
    type Init;

    const KIND: PoolKind;

    fn create(init: Self::Init) -> Self;

    /// Re-initialize a retired instance. Defaults to a full overwrite.
    fn reset(&mut self, init: Self::Init) {
        *self = Self::create(init);
    }

    fn is_alive(&self) -> bool;

    /// Mark as no longer alive
    fn retire(&mut self);

    /// The pool for this kind inside a manager
    fn pool(pools: &mut PoolManager) -> &mut Pool<Self>;
}

/// Counters for one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub kind: PoolKind,
    pub allocated: usize,
    pub free: usize,
    pub capacity: usize,
    pub policy: OverflowPolicy,
}

/// Free list plus allocation bookkeeping for a single entity kind
#[derive(Debug, Clone)]
pub struct Pool<T> {
    kind: PoolKind,
    /// Retired instances, oldest at the front
    free: VecDeque<T>,
    allocated: usize,
    capacity: usize,
    policy: OverflowPolicy,
}

impl<T: Poolable> Pool<T> {
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            kind: T::KIND,
            free: VecDeque::new(),
            allocated: 0,
            capacity: settings.capacity,
            policy: settings.overflow,
        }
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            kind: self.kind,
            allocated: self.allocated,
            free: self.free.len(),
            capacity: self.capacity,
            policy: self.policy,
        }
    }

    /// Acquire with the kind's own constructor and reset
    pub fn acquire(&mut self, init: T::Init) -> Result<T, PoolError> {
        self.acquire_with(init, T::create, T::reset)
    }

    /// Acquire with caller-supplied constructor and reset
    pub fn acquire_with(
        &mut self,
        init: T::Init,
        create: impl FnOnce(T::Init) -> T,
        reset: impl FnOnce(&mut T, T::Init),
    ) -> Result<T, PoolError> {
        if let Some(mut item) = self.free.pop_back() {
            debug_assert!(!item.is_alive(), "live {} instance on the free list", self.kind);
            reset(&mut item, init);
            debug_assert!(item.is_alive(), "{} reset left instance retired", self.kind);
            return Ok(item);
        }

        if self.allocated >= self.capacity {
            match self.policy {
                OverflowPolicy::Error => {
                    log::warn!("{} pool exhausted at {}", self.kind, self.capacity);
                    return Err(PoolError::Exhausted {
                        kind: self.kind,
                        capacity: self.capacity,
                    });
                }
                // Past the cap: stay available, trim on release
                OverflowPolicy::DiscardOldest | OverflowPolicy::Grow => {}
            }
        }

        self.allocated += 1;
        Ok(create(init))
    }

    /// Return an instance to the free list, dropping any evictions
    pub fn release(&mut self, item: T) -> usize {
        self.release_with(item, drop)
    }

    /// Return an instance to the free list, handing evictions to `dispose`.
    ///
    /// Takes ownership, so an instance cannot be filed twice. Returns the
    /// number of instances evicted.
    pub fn release_with(&mut self, mut item: T, mut dispose: impl FnMut(T)) -> usize {
        item.retire();
        self.free.push_back(item);

        // Instances built outside the pool are adopted on first release
        if self.free.len() > self.allocated {
            self.allocated = self.free.len();
        }

        if self.policy == OverflowPolicy::Grow {
            return 0;
        }

        let mut evicted = 0;
        while self.free.len() > self.capacity {
            let victim = match self.policy {
                OverflowPolicy::DiscardOldest => self.free.pop_front(),
                _ => self.free.pop_back(),
            };
            let Some(victim) = victim else { break };
            self.allocated = self.allocated.saturating_sub(1);
            dispose(victim);
            evicted += 1;
        }
        evicted
    }
}

/// One pool per pooled entity kind
#[derive(Debug, Clone)]
pub struct PoolManager {
    pub bullets: Pool<Bullet>,
    pub explosions: Pool<Explosion>,
    pub shield_hits: Pool<ShieldHit>,
    pub health_hits: Pool<HealthHit>,
    pub particles: Pool<Particle>,
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}

impl PoolManager {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            bullets: Pool::new(config.bullets),
            explosions: Pool::new(config.explosions),
            shield_hits: Pool::new(config.shield_hits),
            health_hits: Pool::new(config.health_hits),
            particles: Pool::new(config.particles),
        }
    }

    pub fn acquire<T: Poolable>(&mut self, init: T::Init) -> Result<T, PoolError> {
        T::pool(self).acquire(init)
    }

    pub fn release<T: Poolable>(&mut self, item: T) -> usize {
        T::pool(self).release(item)
    }

    pub fn stats(&self, kind: PoolKind) -> PoolStats {
        match kind {
            PoolKind::Bullet => self.bullets.stats(),
            PoolKind::Explosion => self.explosions.stats(),
            PoolKind::ShieldHit => self.shield_hits.stats(),
            PoolKind::HealthHit => self.health_hits.stats(),
            PoolKind::Particle => self.particles.stats(),
        }
    }

    pub fn all_stats(&self) -> Vec<PoolStats> {
        PoolKind::ALL.iter().map(|k| self.stats(*k)).collect()
    }
}

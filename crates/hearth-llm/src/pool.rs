//! The worker pool.
//!
//! Members are partitioned into fixed-assignment clients, each permanently
//! bound to one role, and random-assignment clients that are interchangeable.
//! Selection is a strategy object behind [`Assignment`]; the pool keeps no
//! mutable state between calls.

use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::config::PoolConfig;
use crate::llm::GenerationClient;

/// What a client is being acquired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Governance and arbitration calls.
    Arbiter,
    /// Intent calls for the agents in batch `n` (zero-based).
    IntentBatch(usize),
    /// Environment and story calls.
    Narrator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arbiter => f.write_str("arbiter"),
            Self::IntentBatch(n) => write!(f, "intent-batch-{n}"),
            Self::Narrator => f.write_str("narrator"),
        }
    }
}

/// A selection policy over a slice of pool members.
pub trait Assignment: Send + Sync + fmt::Debug {
    /// Pick a member, or `None` if no suitable member exists.
    fn select<'a>(
        &self,
        members: &'a [Arc<GenerationClient>],
        rng: &mut dyn RngCore,
    ) -> Option<&'a Arc<GenerationClient>>;
}

/// Always the member at one index.
#[derive(Debug, Clone, Copy)]
pub struct FixedIndex(pub usize);

impl Assignment for FixedIndex {
    fn select<'a>(
        &self,
        members: &'a [Arc<GenerationClient>],
        _rng: &mut dyn RngCore,
    ) -> Option<&'a Arc<GenerationClient>> {
        members.get(self.0)
    }
}

/// Uniformly random among configured members.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPick;

impl Assignment for RandomPick {
    fn select<'a>(
        &self,
        members: &'a [Arc<GenerationClient>],
        rng: &mut dyn RngCore,
    ) -> Option<&'a Arc<GenerationClient>> {
        let configured: Vec<&'a Arc<GenerationClient>> =
            members.iter().filter(|m| m.is_configured()).collect();
        configured.choose(rng).copied()
    }
}

/// Named collection of generation clients.
#[derive(Debug)]
pub struct WorkerPool {
    fixed: Vec<Arc<GenerationClient>>,
    shared: Vec<Arc<GenerationClient>>,
    shared_strategy: Box<dyn Assignment>,
    inert: Arc<GenerationClient>,
}

impl WorkerPool {
    /// Pool over explicit member lists, with [`RandomPick`] for the shared
    /// members.
    pub fn new(fixed: Vec<GenerationClient>, shared: Vec<GenerationClient>) -> Self {
        Self {
            fixed: fixed.into_iter().map(Arc::new).collect(),
            shared: shared.into_iter().map(Arc::new).collect(),
            shared_strategy: Box::new(RandomPick),
            inert: Arc::new(GenerationClient::inert("inert")),
        }
    }

    /// Replace the selection policy for random-assignment members.
    #[must_use]
    pub fn with_shared_strategy(mut self, strategy: impl Assignment + 'static) -> Self {
        self.shared_strategy = Box::new(strategy);
        self
    }

    /// Build the pool from environment-derived configuration.
    pub fn from_config(config: &PoolConfig) -> Self {
        let fixed = config
            .fixed_keys
            .iter()
            .enumerate()
            .map(|(i, key)| GenerationClient::from_config(format!("fixed-{i}"), &config.member(key)))
            .collect();
        let shared = config
            .shared_keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                GenerationClient::from_config(format!("shared-{i}"), &config.member(key))
            })
            .collect();
        Self::new(fixed, shared)
    }

    /// Number of fixed-assignment members.
    pub fn fixed_len(&self) -> usize {
        self.fixed.len()
    }

    /// Number of random-assignment members holding a credential.
    pub fn configured_shared(&self) -> usize {
        self.shared.iter().filter(|m| m.is_configured()).count()
    }

    /// Resolve a client for `role`.
    ///
    /// Never fails: a missing member resolves to the inert placeholder, whose
    /// calls fail and send the caller down its fallback path.
    pub fn acquire(&self, role: Role, rng: &mut dyn RngCore) -> Arc<GenerationClient> {
        let picked = match role {
            Role::Arbiter => FixedIndex(0).select(&self.fixed, rng),
            Role::IntentBatch(n) => n
                .checked_add(1)
                .and_then(|index| FixedIndex(index).select(&self.fixed, rng)),
            Role::Narrator => self.shared_strategy.select(&self.shared, rng),
        };

        match picked {
            Some(client) => Arc::clone(client),
            None => {
                debug!(%role, "no pool member, using inert placeholder");
                Arc::clone(&self.inert)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::llm::ScriptedBackend;

    fn scripted(label: &str) -> GenerationClient {
        GenerationClient::scripted(label, ScriptedBackend::fixed("{}"))
    }

    #[test]
    fn fixed_roles_are_deterministic() {
        let pool = WorkerPool::new(
            vec![scripted("arbiter"), scripted("batch-0"), scripted("batch-1")],
            Vec::new(),
        );
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(pool.acquire(Role::Arbiter, &mut rng).label(), "arbiter");
            assert_eq!(pool.acquire(Role::IntentBatch(0), &mut rng).label(), "batch-0");
            assert_eq!(pool.acquire(Role::IntentBatch(1), &mut rng).label(), "batch-1");
        }
    }

    #[test]
    fn missing_fixed_member_is_inert() {
        let pool = WorkerPool::new(vec![scripted("arbiter")], Vec::new());
        let mut rng = SmallRng::seed_from_u64(2);
        let client = pool.acquire(Role::IntentBatch(4), &mut rng);
        assert!(!client.is_configured());
    }

    #[test]
    fn narrator_never_picks_unconfigured() {
        let pool = WorkerPool::new(
            Vec::new(),
            vec![
                GenerationClient::inert("empty-0"),
                scripted("narrator"),
                GenerationClient::inert("empty-2"),
            ],
        );
        assert_eq!(pool.configured_shared(), 1);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            assert_eq!(pool.acquire(Role::Narrator, &mut rng).label(), "narrator");
        }
    }

    #[test]
    fn narrator_spreads_over_configured_members() {
        let pool = WorkerPool::new(Vec::new(), vec![scripted("a"), scripted("b")]);
        let mut rng = SmallRng::seed_from_u64(4);
        let picks: Vec<String> = (0..64)
            .map(|_| pool.acquire(Role::Narrator, &mut rng).label().to_owned())
            .collect();
        assert!(picks.iter().any(|l| l == "a"));
        assert!(picks.iter().any(|l| l == "b"));
    }

    #[test]
    fn no_shared_members_yields_inert() {
        let pool = WorkerPool::new(Vec::new(), vec![GenerationClient::inert("empty")]);
        let mut rng = SmallRng::seed_from_u64(5);
        assert!(!pool.acquire(Role::Narrator, &mut rng).is_configured());
    }

    #[test]
    fn shared_strategy_is_swappable() {
        let pool = WorkerPool::new(Vec::new(), vec![scripted("first"), scripted("second")])
            .with_shared_strategy(FixedIndex(1));
        let mut rng = SmallRng::seed_from_u64(6);
        assert_eq!(pool.acquire(Role::Narrator, &mut rng).label(), "second");
    }

    #[test]
    fn from_config_marks_empty_keys_unconfigured() {
        let config = PoolConfig::from_lookup(|name| match name {
            "LLM_FIXED_KEYS" => Some(String::from("k0,k1")),
            "LLM_SHARED_KEYS" => Some(String::from(",k2,")),
            _ => None,
        })
        .unwrap();
        let pool = WorkerPool::from_config(&config);
        assert_eq!(pool.fixed_len(), 2);
        assert_eq!(pool.configured_shared(), 1);
    }
}

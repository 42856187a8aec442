//! Agent registry
//!
//! Agents move through a small owner-driven state machine:
//!
//! ```text
//! Unregistered ──register──▶ Active(reputation = 100) ◀──activate/deactivate──▶ Inactive
//! ```
//!
//! Agents are never deleted. Authorization is derived on every query from
//! `(is_active, reputation_score)`, never stored.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use types::{recover_signer, Address, PoolId, SignedInstruction, H256};

use crate::error::RegistryError;

/// Reputation assigned on registration
pub const INITIAL_REPUTATION: u64 = 100;

/// Minimum reputation for an active agent to be authorized
pub const MIN_AUTHORIZED_REPUTATION: u64 = 50;

/// Registry handle shared between the gate and administrative callers
pub type SharedRegistry = Arc<RwLock<AgentRegistry>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub address: Address,
    pub name: String,
    pub description: String,
    pub reputation_score: u64,
    pub is_active: bool,
    pub registered_at: u64,
}

impl AgentIdentity {
    pub fn is_authorized(&self) -> bool {
        self.is_active && self.reputation_score >= MIN_AUTHORIZED_REPUTATION
    }
}

#[derive(Debug, Clone)]
pub struct AgentRegistry {
    owner: Address,
    agents: HashMap<Address, AgentIdentity>,
    /// Last consumed instruction nonce per agent
    nonces: HashMap<Address, u64>,
}

impl AgentRegistry {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            agents: HashMap::new(),
            nonces: HashMap::new(),
        }
    }

    pub fn shared(owner: Address) -> SharedRegistry {
        Arc::new(RwLock::new(Self::new(owner)))
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    fn only_owner(&self, caller: Address) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::NotOwner { caller });
        }
        Ok(())
    }

    fn agent_mut(&mut self, agent: Address) -> Result<&mut AgentIdentity, RegistryError> {
        self.agents
            .get_mut(&agent)
            .ok_or(RegistryError::UnknownAgent(agent))
    }

    pub fn register_agent(
        &mut self,
        caller: Address,
        agent: Address,
        name: impl Into<String>,
        description: impl Into<String>,
        now: u64,
    ) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        if self.agents.contains_key(&agent) {
            return Err(RegistryError::AlreadyRegistered(agent));
        }

        let identity = AgentIdentity {
            address: agent,
            name: name.into(),
            description: description.into(),
            reputation_score: INITIAL_REPUTATION,
            is_active: true,
            registered_at: now,
        };
        info!(agent = ?agent, name = %identity.name, "Agent registered");
        self.agents.insert(agent, identity);
        Ok(())
    }

    /// Allowed in either activity state
    pub fn update_reputation(
        &mut self,
        caller: Address,
        agent: Address,
        score: u64,
    ) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        let identity = self.agent_mut(agent)?;
        debug!(
            agent = ?agent,
            from = identity.reputation_score,
            to = score,
            "Reputation updated"
        );
        identity.reputation_score = score;
        Ok(())
    }

    pub fn deactivate_agent(&mut self, caller: Address, agent: Address) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        self.agent_mut(agent)?.is_active = false;
        info!(agent = ?agent, "Agent deactivated");
        Ok(())
    }

    pub fn activate_agent(&mut self, caller: Address, agent: Address) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        self.agent_mut(agent)?.is_active = true;
        info!(agent = ?agent, "Agent activated");
        Ok(())
    }

    pub fn is_authorized(&self, agent: Address) -> bool {
        self.agents
            .get(&agent)
            .map(AgentIdentity::is_authorized)
            .unwrap_or(false)
    }

    pub fn get_agent_info(&self, agent: Address) -> Option<&AgentIdentity> {
        self.agents.get(&agent)
    }

    /// Last consumed nonce, zero if none
    pub fn get_nonce(&self, agent: Address) -> u64 {
        self.nonces.get(&agent).copied().unwrap_or(0)
    }

    /// Whether `signature` over `digest` recovers to `agent`
    pub fn verify_signature(&self, agent: Address, digest: H256, signature: &[u8]) -> bool {
        recover_signer(digest, signature) == Some(agent)
    }

    /// Accept a signed instruction for `pool` exactly once.
    ///
    /// Checks authorization, pool, deadline, nonce ordering and signature, then advances
    /// the stored nonce. Nothing is mutated on failure.
    pub fn consume_instruction(
        &mut self,
        pool: PoolId,
        instruction: &SignedInstruction,
        now: u64,
    ) -> Result<(), RegistryError> {
        let agent = instruction.signer;
        if !self.is_authorized(agent) {
            return Err(RegistryError::NotAuthorized(agent));
        }
        if instruction.pool_id != pool {
            return Err(RegistryError::PoolMismatch {
                instructed: instruction.pool_id,
                pool,
            });
        }
        if instruction.is_expired(now) {
            return Err(RegistryError::Expired {
                deadline: instruction.deadline,
                now,
            });
        }
        let last = self.get_nonce(agent);
        if instruction.nonce <= last {
            return Err(RegistryError::StaleNonce {
                nonce: instruction.nonce,
                last,
            });
        }
        if !self.verify_signature(agent, instruction.digest(), &instruction.signature) {
            return Err(RegistryError::InvalidSignature(agent));
        }

        self.nonces.insert(agent, instruction.nonce);
        Ok(())
    }
}

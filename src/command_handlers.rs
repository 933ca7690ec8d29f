// Copyright 2025 Cowboy AI, LLC.

//! Command handler wiring the aggregate to its collaborators
//!
//! The handler loads one referral, applies one command, persists the result
//! and fans the events out. Persistence must provide at-most-one-writer
//! semantics per referral ID (row lock, optimistic retry or a single-writer
//! actor): two concurrent transitions on the same referral must not both
//! commit if together they would violate an invariant.
//!
//! Search-index and notification failures never roll the committed
//! transition back; they are logged and left to the observability stack.

use crate::commands::{CommandAcknowledgment, CommandEnvelope};
use crate::entity::AggregateRoot;
use crate::events::DomainEvent;
use crate::identifiers::ReferralId;
use crate::notifications::{EventDispatcher, UnitDirectory};
use crate::referral::Referral;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Repository for loading and saving referral aggregates
///
/// Implementations must serialize writers per referral ID; the aggregate
/// itself is single-threaded and relies on this contract.
pub trait ReferralRepository: Send + Sync {
    /// Load a referral by ID
    fn load(&self, id: ReferralId) -> Result<Option<Referral>, String>;

    /// Save a referral
    fn save(&self, referral: &Referral) -> Result<(), String>;

    /// Delete a referral and everything that cascades with it
    fn delete(&self, id: ReferralId) -> Result<(), String>;
}

/// In-memory repository for testing
pub struct InMemoryReferralRepository {
    storage: Arc<RwLock<HashMap<ReferralId, Referral>>>,
}

impl Default for InMemoryReferralRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReferralRepository {
    /// Create a new in-memory repository for testing
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl ReferralRepository for InMemoryReferralRepository {
    fn load(&self, id: ReferralId) -> Result<Option<Referral>, String> {
        Ok(self.storage.read().unwrap().get(&id).cloned())
    }

    fn save(&self, referral: &Referral) -> Result<(), String> {
        self.storage
            .write()
            .unwrap()
            .insert(referral.id(), referral.clone());
        Ok(())
    }

    fn delete(&self, id: ReferralId) -> Result<(), String> {
        self.storage.write().unwrap().remove(&id);
        Ok(())
    }
}

/// Full-text index over referral projections
#[async_trait]
pub trait SearchIndexer: Send + Sync {
    /// Reindex the current projection of the referral
    async fn index(&self, referral: &Referral) -> anyhow::Result<()>;

    /// Drop the referral (or its note) from the index
    async fn delete(&self, referral: ReferralId) -> anyhow::Result<()>;
}

/// Search indexer that does nothing, for tests and tooling
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSearchIndexer;

#[async_trait]
impl SearchIndexer for NoopSearchIndexer {
    async fn index(&self, _referral: &Referral) -> anyhow::Result<()> {
        Ok(())
    }

    async fn delete(&self, _referral: ReferralId) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Handles referral commands end to end
///
/// load → apply → save → index → dispatch. Only the first three steps can
/// reject the command; everything after the save is non-fatal.
pub struct ReferralCommandHandler {
    repository: Arc<dyn ReferralRepository>,
    indexer: Arc<dyn SearchIndexer>,
    dispatcher: EventDispatcher,
    directory: Arc<dyn UnitDirectory>,
}

impl ReferralCommandHandler {
    /// Create a handler over the given collaborators
    pub fn new(
        repository: Arc<dyn ReferralRepository>,
        indexer: Arc<dyn SearchIndexer>,
        dispatcher: EventDispatcher,
        directory: Arc<dyn UnitDirectory>,
    ) -> Self {
        Self {
            repository,
            indexer,
            dispatcher,
            directory,
        }
    }

    /// Handle one command envelope
    pub async fn handle(&self, envelope: CommandEnvelope) -> CommandAcknowledgment {
        let mut referral = match self.repository.load(envelope.referral) {
            Ok(Some(referral)) => referral,
            Ok(None) => {
                return CommandAcknowledgment::rejected(
                    envelope.command_id,
                    format!("referral {} not found", envelope.referral),
                );
            }
            Err(error) => {
                return CommandAcknowledgment::rejected(envelope.command_id, error);
            }
        };

        let events = match referral.apply(&envelope.command) {
            Ok(events) => events,
            Err(error) => {
                debug!(
                    referral = %envelope.referral,
                    %error,
                    "command rejected by the aggregate"
                );
                return CommandAcknowledgment::rejected(envelope.command_id, error.to_string());
            }
        };

        if let Err(error) = self.repository.save(&referral) {
            return CommandAcknowledgment::rejected(envelope.command_id, error);
        }

        // From here on the transition is committed; side-channel failures
        // must not surface as rejections.
        if let Err(error) = self.indexer.index(&referral).await {
            warn!(referral = %envelope.referral, %error, "search index update failed");
        }

        let pairs = self
            .dispatcher
            .dispatch(&referral, &events, self.directory.as_ref())
            .await;
        debug!(
            referral = %envelope.referral,
            events = events.len(),
            notified = pairs,
            event_types = ?events.iter().map(|e| e.event_type()).collect::<Vec<_>>(),
            "command committed"
        );

        CommandAcknowledgment::accepted(envelope.command_id)
    }
}

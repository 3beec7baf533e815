//! Wiring of the pipeline over concrete collaborators.

use std::sync::Arc;

use curator_auth::{CachedPermissionSource, InMemoryPermissionCache, PermissionCache, PermissionSource};
use curator_core::UserId;
use curator_events::EventPublisher;
use curator_observability::CorrelationId;
use curator_persistence::{
    ConstantLockFactory, DocumentStore, InMemoryDocumentStore, LockFactory, PostgresDocumentStore,
};

use crate::commands::UseCases;
use crate::config::{AppConfig, StoreBackend};
use crate::context::RequestContext;
use crate::error::AppError;
use crate::permission_source::StorePermissionSource;
use crate::pipeline::{AchievementCallback, Authorization, Command, CommandHandler, Logging, Transactional};

pub type Pipeline = Logging<Authorization<Transactional<AchievementCallback<UseCases>>>>;

/// Entry point for executing commands.
pub struct Curator {
    pipeline: Pipeline,
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn PermissionCache>,
}

impl Curator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        locks: Arc<dyn LockFactory>,
        cache: Arc<dyn PermissionCache>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let permissions: Arc<dyn PermissionSource> = Arc::new(CachedPermissionSource::new(
            StorePermissionSource::new(Arc::clone(&store)),
            Arc::clone(&cache),
        ));

        let pipeline = Logging::new(Authorization::new(
            Transactional::new(
                AchievementCallback::new(UseCases),
                Arc::clone(&store),
                locks,
                Arc::clone(&cache),
                publisher,
            ),
            permissions,
        ));

        Self { pipeline, store, cache }
    }

    /// Build collaborators from `config`. Postgres collections are created
    /// if they do not exist yet.
    pub async fn from_config(config: &AppConfig, publisher: Arc<dyn EventPublisher>) -> Result<Self, AppError> {
        let store: Arc<dyn DocumentStore> = match &config.store {
            StoreBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
            StoreBackend::Postgres { database_url } => {
                let store = PostgresDocumentStore::connect(database_url).await?;
                store.migrate().await?;
                Arc::new(store)
            }
        };

        let locks: Arc<dyn LockFactory> = match &config.lock_token {
            Some(token) => Arc::new(ConstantLockFactory::new(token.clone())),
            None => Arc::new(ConstantLockFactory::default()),
        };

        Ok(Self::new(store, locks, permission_cache(config)?, publisher))
    }

    pub async fn execute<C>(&self, caller: UserId, command: C) -> Result<C::Output, AppError>
    where
        C: Command,
        Pipeline: CommandHandler<C>,
    {
        let mut ctx = RequestContext::new(caller);
        self.pipeline.handle(&mut ctx, command).await
    }

    /// Like [`Curator::execute`], tagging logs and events with `correlation_id`.
    pub async fn execute_correlated<C>(
        &self,
        caller: UserId,
        correlation_id: CorrelationId,
        command: C,
    ) -> Result<C::Output, AppError>
    where
        C: Command,
        Pipeline: CommandHandler<C>,
    {
        let mut ctx = RequestContext::with_correlation_id(caller, correlation_id);
        self.pipeline.handle(&mut ctx, command).await
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn permission_cache(&self) -> &Arc<dyn PermissionCache> {
        &self.cache
    }
}

#[cfg(feature = "redis")]
fn permission_cache(config: &AppConfig) -> Result<Arc<dyn PermissionCache>, AppError> {
    use crate::config::ConfigError;

    match &config.redis_url {
        Some(url) => {
            let cache = curator_auth::RedisPermissionCache::new(url, "curator:permissions").map_err(|e| {
                ConfigError::Invalid {
                    name: "REDIS_URL",
                    value: e.to_string(),
                }
            })?;
            Ok(Arc::new(cache))
        }
        None => Ok(Arc::new(InMemoryPermissionCache::new())),
    }
}

#[cfg(not(feature = "redis"))]
fn permission_cache(_config: &AppConfig) -> Result<Arc<dyn PermissionCache>, AppError> {
    Ok(Arc::new(InMemoryPermissionCache::new()))
}

//! `curator-app` - moderation use cases behind a command pipeline.
//!
//! Commands run through logging, authorization, a transactional session and
//! an achievement callback before reaching their use case. Outbound events
//! leave only after the session has committed.

pub mod commands;
pub mod config;
pub mod context;
pub mod curator;
pub mod error;
pub mod permission_source;
pub mod pipeline;

pub use commands::{
    AcceptContribution, CreateUser, GrantPermissions, Moderated, RejectContribution, SubmitAddMovie, SubmitAddPerson,
    SubmitEditMovie, SubmitEditPerson, Submitted, UseCases,
};
pub use config::{AppConfig, ConfigError, StoreBackend};
pub use context::RequestContext;
pub use curator::{Curator, Pipeline};
pub use error::AppError;
pub use permission_source::StorePermissionSource;
pub use pipeline::{Command, CommandHandler, CommandOutput};

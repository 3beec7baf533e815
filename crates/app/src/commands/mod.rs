//! Use cases: the innermost handlers of the pipeline.
//!
//! Each command is a plain struct; [`UseCases`] implements
//! [`CommandHandler`](crate::pipeline::CommandHandler) for all of them. Handlers
//! assume a session is open and never commit it themselves.

mod milestones;
mod moderation;
mod submit;
mod users;

pub use moderation::{AcceptContribution, Moderated, RejectContribution};
pub use submit::{SubmitAddMovie, SubmitAddPerson, SubmitEditMovie, SubmitEditPerson, Submitted};
pub use users::{CreateUser, GrantPermissions};

/// Handler for every command of the application.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseCases;

use async_trait::async_trait;
use chrono::Utc;

use curator_auth::{CommandAuthorization, Permissions};
use curator_core::UserId;
use curator_domain::User;
use curator_persistence::UserField;

use crate::context::RequestContext;
use crate::error::AppError;
use crate::pipeline::{Command, CommandHandler, CommandOutput};

use super::UseCases;

/// Register a new user. Open to everyone; new users may contribute.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl CommandAuthorization for CreateUser {
    fn required_permissions(&self) -> Permissions {
        Permissions::NONE
    }
}

impl Command for CreateUser {
    const NAME: &'static str = "create_user";
    type Output = User;
}

impl CommandOutput for User {}

#[async_trait]
impl CommandHandler<CreateUser> for UseCases {
    async fn handle(&self, ctx: &mut RequestContext, command: CreateUser) -> Result<User, AppError> {
        let user = User::register(command.id, command.name, command.email, Permissions::CONTRIBUTOR, Utc::now())?;
        let session = ctx.session()?;

        // Early checks give a precise answer; the unique indexes still decide
        // when two registrations race.
        if session.users().by_id(user.id).await?.is_some() {
            return Err(AppError::AlreadyTaken(UserField::Id));
        }
        if session.users().by_name(&user.name).await?.is_some() {
            return Err(AppError::AlreadyTaken(UserField::Name));
        }
        if session.users().by_email(&user.email).await?.is_some() {
            return Err(AppError::AlreadyTaken(UserField::Email));
        }

        session.users().save(user.clone())?;
        Ok(user)
    }
}

/// Replace a user's permission bits.
#[derive(Debug, Clone)]
pub struct GrantPermissions {
    pub user_id: UserId,
    pub permissions: Permissions,
}

impl CommandAuthorization for GrantPermissions {
    fn required_permissions(&self) -> Permissions {
        Permissions::MANAGE_USERS
    }
}

impl Command for GrantPermissions {
    const NAME: &'static str = "grant_permissions";
    type Output = User;
}

#[async_trait]
impl CommandHandler<GrantPermissions> for UseCases {
    async fn handle(&self, ctx: &mut RequestContext, command: GrantPermissions) -> Result<User, AppError> {
        let mut users = ctx.session()?.users();
        let mut user = users
            .acquire_by_id(command.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user", command.user_id))?;

        user.permissions = command.permissions;
        users.update(user.clone())?;
        Ok(user)
    }
}

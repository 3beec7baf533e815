//! `curator-core` - domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod maybe;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    AchievementId, ContributionId, CrewMemberId, MovieId, PersonId, RoleId, UserId, WriterId,
};
pub use maybe::Maybe;
pub use value_object::{Money, ValueObject};

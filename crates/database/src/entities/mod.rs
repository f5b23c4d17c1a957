//! Domain entities for the database layer
//!
//! Entity definitions for use by the repository layer

pub mod auth;
pub mod profile;
pub mod role;

// Re-export all entity types
pub use auth::{UserAuth, UserListQuery, UserVO};
pub use profile::{UpdateProfileRequest, UserInfoVO, UserProfile};
pub use role::Role;

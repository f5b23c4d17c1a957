//! User credential entity definitions

use serde::{Deserialize, Serialize};

use super::role::Role;

/// Credential and login record backing the `user_auth` table.
///
/// Each row references exactly one [`super::UserProfile`] through
/// `user_info_id`; the password column holds a hash produced by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAuth {
    pub id: i64,
    pub user_info_id: i64,
    pub username: String,
    pub password: String,
    pub login_type: i64,
    pub ip_address: String,
    pub ip_source: String,
    pub created_at: String,
    pub updated_at: String,
    pub last_login_time: Option<String>,
    pub is_disable: bool,
}

/// Filter and pagination parameters for user listings.
///
/// `page` is 1-indexed. A `login_type` of 0 means "any"; an empty
/// `username` disables the username filter; `nickname` is always applied
/// as a substring match (empty matches all).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListQuery {
    pub page: i64,
    pub size: i64,
    pub login_type: i64,
    pub nickname: String,
    pub username: String,
}

/// Flattened read-only projection of credential and profile fields plus
/// the user's role set, assembled for list/detail display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserVO {
    pub id: i64,
    pub user_info_id: i64,
    pub avatar: String,
    pub nickname: String,
    pub login_type: i64,
    pub ip_address: String,
    pub ip_source: String,
    pub created_at: String,
    pub last_login_time: Option<String>,
    pub is_disable: bool,
    pub roles: Vec<Role>,
}

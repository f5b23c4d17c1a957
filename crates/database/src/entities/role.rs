//! Role entity definitions

use serde::{Deserialize, Serialize};

/// Authorization grouping. Users relate to roles through the `user_role`
/// join table keyed by `(role_id, user_auth_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub label: String,
}

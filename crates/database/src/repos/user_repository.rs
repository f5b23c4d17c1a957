//! User repository for database operations.

use std::collections::HashMap;

use crate::entities::{Role, UpdateProfileRequest, UserAuth, UserListQuery, UserProfile, UserVO};
use crate::repos::RoleRepository;
use crate::types::{UserError, UserResult};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Repository for user database operations
///
/// Translates domain-level requests into store queries and surfaces store
/// errors unchanged to the caller. Single-row lookups that match nothing
/// return [`UserError::UserNotFound`]; nothing here retries.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
    roles: RoleRepository,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            roles: RoleRepository::new(pool.clone()),
            pool,
        }
    }

    /// Find the profile row for the given profile id
    pub async fn find_profile_by_id(&self, id: i64) -> UserResult<UserProfile> {
        let row = sqlx::query(
            "SELECT id, email, nickname, avatar, intro, website, created_at, updated_at
             FROM user_info WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => row_to_profile(&row),
            None => Err(UserError::UserNotFound),
        }
    }

    /// Find the credential row with an exact username match
    pub async fn find_auth_by_username(&self, username: &str) -> UserResult<UserAuth> {
        let row = sqlx::query(
            "SELECT id, user_info_id, username, password, login_type, ip_address, ip_source,
                    created_at, updated_at, last_login_time, is_disable
             FROM user_auth WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => row_to_auth(&row),
            None => Err(UserError::UserNotFound),
        }
    }

    /// Find the credential row for the given auth id
    pub async fn find_auth_by_id(&self, id: i64) -> UserResult<UserAuth> {
        let row = sqlx::query(
            "SELECT id, user_info_id, username, password, login_type, ip_address, ip_source,
                    created_at, updated_at, last_login_time, is_disable
             FROM user_auth WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => row_to_auth(&row),
            None => Err(UserError::UserNotFound),
        }
    }

    /// List users with their profile fields and role sets, plus the total
    /// count of matching rows ignoring pagination.
    ///
    /// `login_type` filters only when non-zero, `username` only when
    /// non-empty; the nickname substring filter is always applied (an
    /// empty pattern matches every row). The username match is
    /// case-sensitive, which rules out SQLite's ASCII-insensitive `LIKE`.
    /// Pages are 1-indexed and ordered by auth id.
    pub async fn list_users(&self, query: &UserListQuery) -> UserResult<(Vec<UserVO>, i64)> {
        let nickname_pattern = format!("%{}%", query.nickname);

        let mut filters = String::from("user_info.nickname LIKE ?");
        if query.login_type != 0 {
            filters.push_str(" AND user_auth.login_type = ?");
        }
        if !query.username.is_empty() {
            filters.push_str(" AND instr(user_auth.username, ?) > 0");
        }

        let count_sql = format!(
            "SELECT COUNT(*) FROM user_auth
             LEFT JOIN user_info ON user_info.id = user_auth.user_info_id
             WHERE {filters}"
        );

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(&nickname_pattern);
        if query.login_type != 0 {
            count_query = count_query.bind(query.login_type);
        }
        if !query.username.is_empty() {
            count_query = count_query.bind(&query.username);
        }

        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let page_sql = format!(
            "SELECT user_auth.id, user_auth.user_info_id, user_auth.login_type,
                    user_auth.ip_address, user_auth.ip_source, user_auth.created_at,
                    user_auth.last_login_time, user_auth.is_disable,
                    user_info.nickname, user_info.avatar
             FROM user_auth
             LEFT JOIN user_info ON user_info.id = user_auth.user_info_id
             WHERE {filters}
             ORDER BY user_auth.id ASC
             LIMIT ? OFFSET ?"
        );

        let offset = (query.page.max(1) - 1) * query.size;
        let mut page_query = sqlx::query(&page_sql).bind(&nickname_pattern);
        if query.login_type != 0 {
            page_query = page_query.bind(query.login_type);
        }
        if !query.username.is_empty() {
            page_query = page_query.bind(&query.username);
        }
        page_query = page_query.bind(query.size).bind(offset);

        let rows = page_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let mut auth_ids = Vec::with_capacity(rows.len());
        for row in &rows {
            auth_ids.push(
                row.try_get::<i64, _>("id")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?,
            );
        }

        // Stitch role sets in with one batched query instead of relying on
        // any relation-preloading machinery.
        let mut role_map: HashMap<i64, Vec<Role>> = HashMap::new();
        for (user_auth_id, role) in self.roles.find_by_user_auth_ids(&auth_ids).await? {
            role_map.entry(user_auth_id).or_default().push(role);
        }

        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row
                .try_get("id")
                .map_err(|e| UserError::DatabaseError(e.to_string()))?;
            users.push(UserVO {
                id,
                user_info_id: row
                    .try_get("user_info_id")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?,
                avatar: row
                    .try_get("avatar")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?,
                nickname: row
                    .try_get("nickname")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?,
                login_type: row
                    .try_get("login_type")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?,
                ip_address: row
                    .try_get("ip_address")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?,
                ip_source: row
                    .try_get("ip_source")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?,
                created_at: row
                    .try_get("created_at")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?,
                last_login_time: row
                    .try_get("last_login_time")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?,
                is_disable: row
                    .try_get("is_disable")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?,
                roles: role_map.remove(&id).unwrap_or_default(),
            });
        }

        Ok((users, total))
    }

    /// Update the nickname on the profile linked to the given auth id and,
    /// when `role_ids` is non-empty, replace the user's whole role set.
    ///
    /// An empty `role_ids` leaves the existing associations untouched;
    /// keeping at least one role is the caller's policy. Both writes run
    /// in a single transaction.
    pub async fn update_nickname_and_roles(
        &self,
        auth_id: i64,
        nickname: &str,
        role_ids: &[i64],
    ) -> UserResult<()> {
        let auth = self.find_auth_by_id(auth_id).await?;
        let now = Utc::now().to_rfc3339();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let result = sqlx::query("UPDATE user_info SET nickname = ?, updated_at = ? WHERE id = ?")
            .bind(nickname)
            .bind(&now)
            .bind(auth.user_info_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        if !role_ids.is_empty() {
            sqlx::query("DELETE FROM user_role WHERE user_auth_id = ?")
                .bind(auth.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| UserError::DatabaseError(e.to_string()))?;

            for role_id in role_ids {
                sqlx::query("INSERT INTO user_role (role_id, user_auth_id) VALUES (?, ?)")
                    .bind(role_id)
                    .bind(auth.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        info!(auth_id, roles = role_ids.len(), "updated user nickname and roles");
        Ok(())
    }

    /// Overwrite the stored password for the given auth id.
    ///
    /// The caller hashes before calling; this layer stores the value as-is.
    pub async fn update_password(&self, id: i64, password: &str) -> UserResult<()> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query("UPDATE user_auth SET password = ?, updated_at = ? WHERE id = ?")
            .bind(password)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        info!(auth_id = id, "updated user password");
        Ok(())
    }

    /// Update the four profile display fields for the given profile id.
    ///
    /// The column list is fixed; empty strings overwrite.
    pub async fn update_profile(&self, id: i64, request: &UpdateProfileRequest) -> UserResult<()> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE user_info SET nickname = ?, avatar = ?, intro = ?, website = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&request.nickname)
        .bind(&request.avatar)
        .bind(&request.intro)
        .bind(&request.website)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        Ok(())
    }

    /// Update only the disabled flag for the given auth id
    pub async fn update_disable(&self, id: i64, is_disable: bool) -> UserResult<()> {
        let now = Utc::now().to_rfc3339();

        let result =
            sqlx::query("UPDATE user_auth SET is_disable = ?, updated_at = ? WHERE id = ?")
                .bind(is_disable)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        info!(auth_id = id, is_disable, "updated user disabled flag");
        Ok(())
    }

    /// Record a login: IP address, IP source and the login timestamp.
    ///
    /// The write names exactly these columns so no other field can be
    /// clobbered with a zero value.
    pub async fn update_login_info(
        &self,
        id: i64,
        ip_address: &str,
        ip_source: &str,
    ) -> UserResult<()> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE user_auth SET ip_address = ?, ip_source = ?, last_login_time = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(ip_address)
        .bind(ip_source)
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        Ok(())
    }
}

fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> UserResult<UserProfile> {
    Ok(UserProfile {
        id: row
            .try_get("id")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        email: row
            .try_get("email")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        nickname: row
            .try_get("nickname")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        avatar: row
            .try_get("avatar")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        intro: row
            .try_get("intro")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        website: row
            .try_get("website")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
    })
}

fn row_to_auth(row: &sqlx::sqlite::SqliteRow) -> UserResult<UserAuth> {
    Ok(UserAuth {
        id: row
            .try_get("id")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        user_info_id: row
            .try_get("user_info_id")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        username: row
            .try_get("username")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        password: row
            .try_get("password")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        login_type: row
            .try_get("login_type")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        ip_address: row
            .try_get("ip_address")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        ip_source: row
            .try_get("ip_source")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        last_login_time: row
            .try_get("last_login_time")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        is_disable: row
            .try_get("is_disable")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
    })
}

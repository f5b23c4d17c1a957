//! Repository for role data access operations.

use crate::entities::Role;
use crate::types::{UserError, UserResult};
use sqlx::{Row, SqlitePool};

/// Repository for role database operations
#[derive(Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    /// Create a new role repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find all roles
    pub async fn find_all(&self) -> UserResult<Vec<Role>> {
        let rows = sqlx::query("SELECT id, name, label FROM role ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        rows.iter().map(row_to_role).collect()
    }

    /// Find the roles associated with a single user
    pub async fn find_by_user_auth_id(&self, user_auth_id: i64) -> UserResult<Vec<Role>> {
        let rows = sqlx::query(
            "SELECT role.id, role.name, role.label
             FROM user_role
             JOIN role ON role.id = user_role.role_id
             WHERE user_role.user_auth_id = ?
             ORDER BY role.id ASC",
        )
        .bind(user_auth_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        rows.iter().map(row_to_role).collect()
    }

    /// Find the roles for a batch of users in one query.
    ///
    /// Returns `(user_auth_id, role)` pairs; callers group them per user.
    pub async fn find_by_user_auth_ids(
        &self,
        user_auth_ids: &[i64],
    ) -> UserResult<Vec<(i64, Role)>> {
        if user_auth_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = user_auth_ids
            .iter()
            .map(|_| "?")
            .collect::<Vec<_>>()
            .join(",");
        let query_str = format!(
            "SELECT user_role.user_auth_id, role.id, role.name, role.label
             FROM user_role
             JOIN role ON role.id = user_role.role_id
             WHERE user_role.user_auth_id IN ({})
             ORDER BY role.id ASC",
            placeholders
        );

        let mut query = sqlx::query(&query_str);
        for &id in user_auth_ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let user_auth_id: i64 = row
                    .try_get("user_auth_id")
                    .map_err(|e| UserError::DatabaseError(e.to_string()))?;
                Ok((user_auth_id, row_to_role(row)?))
            })
            .collect()
    }
}

fn row_to_role(row: &sqlx::sqlite::SqliteRow) -> UserResult<Role> {
    Ok(Role {
        id: row
            .try_get("id")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        name: row
            .try_get("name")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        label: row
            .try_get("label")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        crate::migrations::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed_user(pool: &SqlitePool, nickname: &str, username: &str) -> i64 {
        let now = chrono::Utc::now().to_rfc3339();

        let info = sqlx::query(
            "INSERT INTO user_info (nickname, avatar, created_at, updated_at) VALUES (?, '', ?, ?)",
        )
        .bind(nickname)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();

        let auth = sqlx::query(
            "INSERT INTO user_auth (user_info_id, username, password, created_at, updated_at)
             VALUES (?, ?, 'hash', ?, ?)",
        )
        .bind(info.last_insert_rowid())
        .bind(username)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();

        auth.last_insert_rowid()
    }

    async fn seed_role(pool: &SqlitePool, id: i64, name: &str) {
        sqlx::query("INSERT INTO role (id, name, label) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(name)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn assign_role(pool: &SqlitePool, role_id: i64, user_auth_id: i64) {
        sqlx::query("INSERT INTO user_role (role_id, user_auth_id) VALUES (?, ?)")
            .bind(role_id)
            .bind(user_auth_id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_find_all_returns_roles_in_id_order() {
        let pool = create_test_pool().await;
        seed_role(&pool, 2, "editor").await;
        seed_role(&pool, 1, "admin").await;

        let repo = RoleRepository::new(pool);
        let roles = repo.find_all().await.unwrap();

        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].name, "admin");
        assert_eq!(roles[1].name, "editor");
    }

    #[tokio::test]
    async fn test_find_by_user_auth_id() {
        let pool = create_test_pool().await;
        let auth_id = seed_user(&pool, "alice", "alice").await;
        seed_role(&pool, 1, "admin").await;
        seed_role(&pool, 2, "editor").await;
        assign_role(&pool, 2, auth_id).await;

        let repo = RoleRepository::new(pool);
        let roles = repo.find_by_user_auth_id(auth_id).await.unwrap();

        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].id, 2);
    }

    #[tokio::test]
    async fn test_find_by_user_auth_ids_batches_users() {
        let pool = create_test_pool().await;
        let first = seed_user(&pool, "alice", "alice").await;
        let second = seed_user(&pool, "bob", "bob").await;
        seed_role(&pool, 1, "admin").await;
        seed_role(&pool, 2, "editor").await;
        assign_role(&pool, 1, first).await;
        assign_role(&pool, 2, first).await;
        assign_role(&pool, 2, second).await;

        let repo = RoleRepository::new(pool);
        let pairs = repo.find_by_user_auth_ids(&[first, second]).await.unwrap();

        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.iter().filter(|(id, _)| *id == first).count(), 2);
        assert_eq!(pairs.iter().filter(|(id, _)| *id == second).count(), 1);
    }

    #[tokio::test]
    async fn test_find_by_user_auth_ids_empty_input() {
        let pool = create_test_pool().await;
        let repo = RoleRepository::new(pool);

        let pairs = repo.find_by_user_auth_ids(&[]).await.unwrap();
        assert!(pairs.is_empty());
    }
}

//! Inkpost Database Crate
//!
//! This crate provides the data-access layer for the Inkpost blog backend,
//! including connection management, migrations, and repository
//! implementations over the user tables.

use inkpost_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::{prepare_database, DatabaseConnection};
pub use migrations::run_migrations;

// Re-export repositories
pub use repos::{RoleRepository, UserRepository};

// Re-export entities
pub use entities::{
    auth::{UserAuth, UserListQuery, UserVO},
    profile::{UpdateProfileRequest, UserInfoVO, UserProfile},
    role::Role,
};

// Re-export types
pub use types::{
    errors::{DatabaseError, UserError},
    DatabaseResult, UserResult,
};

/// Re-export commonly used types for convenience
pub use sqlx::Pool;

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_database() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite:{}", db_path.display());

        let config = DatabaseConfig {
            url: db_url,
            max_connections: 1,
        };

        let pool = initialize_database(&config).await.unwrap();
        (pool, temp_dir)
    }

    #[tokio::test]
    async fn test_database_initialization() {
        let (_pool, _temp_dir) = create_test_database().await;
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let (pool, _temp_dir) = create_test_database().await;

        let result: (bool,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(result.0, true);
    }

    #[tokio::test]
    async fn test_repositories_share_one_pool() {
        let (pool, _temp_dir) = create_test_database().await;

        let users = UserRepository::new(pool.clone());
        let roles = RoleRepository::new(pool);

        assert!(matches!(
            users.find_profile_by_id(1).await,
            Err(UserError::UserNotFound)
        ));
        assert!(roles.find_all().await.unwrap().is_empty());
    }
}

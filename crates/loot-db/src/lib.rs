//! # loot-db
//!
//! PostgreSQL implementations of the loot-core repository traits via SQLx.
//!
//! - Connection pool management
//! - Database models with SQLx `FromRow` derives
//! - Model to entity mappers
//! - Repository implementations for guilds, roles and member role assignments
//!
//! Schema management is left to the deployment; the tables the queries
//! expect are listed in `tests/fixtures/schema.sql`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use loot_db::pool::{create_pool, DatabaseConfig};
//! use loot_db::repositories::PgRoleRepository;
//! use loot_core::traits::RoleRepository;
//!
//! async fn example(app: &loot_common::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from(&app.database)).await?;
//!     let roles = PgRoleRepository::new(pool);
//!     // Use the repository...
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, DatabaseConfig, PgPool};
pub use repositories::{PgGuildRepository, PgMemberRepository, PgRoleRepository};

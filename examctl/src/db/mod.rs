//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern: each entity has a repository struct in
//! [`handlers`] that wraps a `&mut PgConnection`, encapsulates all query
//! construction for that entity, and returns record types from [`models`].
//!
//! # Transactions
//!
//! Repositories work with SQLx transactions to ensure ACID properties.
//! Mutating flows always create repositories from a transaction, not directly
//! from the pool:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut slots = Slots::new(&mut tx);
//! // ... operations ...
//! tx.commit().await?;
//! ```
//!
//! This matters most for the slot capacity path: the row lock taken by
//! [`handlers::slots::Slots::lock_by_key`] lives exactly as long as the
//! enclosing transaction, which is what serializes concurrent bookings of the
//! same slot.
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/`
//! directory. [`crate::migrator`] provides access to the migrator.

pub mod errors;
pub mod handlers;
pub mod models;

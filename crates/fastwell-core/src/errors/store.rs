// ABOUTME: Persistence error types shared by every store trait
// ABOUTME: Not found, optimistic version conflicts, backend, and serialization failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use thiserror::Error;

/// Errors returned by keyed persistence and the activity log
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No entity exists under the key
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind (profile, advice, session)
        entity: &'static str,
        /// Key that was looked up
        id: String,
    },

    /// Compare-and-set failed because another writer got there first
    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict {
        /// Version the writer based its change on
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// The underlying storage backend failed
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a "not found" error
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

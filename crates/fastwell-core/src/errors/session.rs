// ABOUTME: Fasting session state machine error types
// ABOUTME: Conflict, invalid transition, invalid target, and persistence failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use super::StoreError;
use crate::models::{FastingState, SessionCommand};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced synchronously by session commands.
///
/// Every variant guarantees that no state was mutated.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A session is already Active or Paused for this user
    #[error("user {user_id} already has an open fasting session {session_id}")]
    Conflict {
        /// User that issued the start command
        user_id: Uuid,
        /// The session that is still open
        session_id: Uuid,
    },

    /// The command does not apply to the session's current state
    #[error("cannot {command} a session that is {from}")]
    InvalidTransition {
        /// State the session was in when the command arrived
        from: FastingState,
        /// Command that was rejected
        command: SessionCommand,
    },

    /// Custom fasting target outside the accepted bounds
    #[error("invalid fasting target: {0}")]
    InvalidTarget(String),

    /// The session store rejected the write
    #[error("session persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

// ABOUTME: Fasting session lifecycle: state machine, display ticker, theme tiers, UI signals
// ABOUTME: Re-exports the public surface used by the service container and the CLI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

//! # Fasting Sessions
//!
//! `SessionStateMachine` is the only writer of a user's fasting session.
//! Everything else observes it through `watch` receivers.

mod machine;
mod signals;
mod theme;
mod ticker;

pub use machine::{SessionSnapshot, SessionStateMachine, SnapshotOrigin, SnapshotRefresher};
pub use signals::{NavigationSurfaces, UiSignals};
pub use theme::{ThemeStyle, ThemeTier};
pub use ticker::SessionTicker;

// ABOUTME: Fasting session model with pause intervals and derived timing
// ABOUTME: FastingType windows, FastingState, and the pure transition rules for a session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use crate::constants::fasting::{MAX_CUSTOM_TARGET_MINUTES, MIN_CUSTOM_TARGET_MINUTES};
use crate::errors::SessionError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fasting protocol chosen when a session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FastingType {
    /// 12 hours fasting, 12 hours eating
    TwelveTwelve,
    /// 14:10 window
    FourteenTen,
    /// 16:8 window
    SixteenEight,
    /// 18:6 window
    EighteenSix,
    /// 20:4 window
    TwentyFour,
    /// One meal a day (23:1)
    OneMealADay,
    /// User-defined target
    Custom {
        /// Target fasting time in minutes
        target_minutes: u32,
    },
}

struct FixedWindow {
    fasting_type: FastingType,
    fasting_hours: i64,
    label: &'static str,
}

const FIXED_WINDOWS: &[FixedWindow] = &[
    FixedWindow {
        fasting_type: FastingType::TwelveTwelve,
        fasting_hours: 12,
        label: "12:12",
    },
    FixedWindow {
        fasting_type: FastingType::FourteenTen,
        fasting_hours: 14,
        label: "14:10",
    },
    FixedWindow {
        fasting_type: FastingType::SixteenEight,
        fasting_hours: 16,
        label: "16:8",
    },
    FixedWindow {
        fasting_type: FastingType::EighteenSix,
        fasting_hours: 18,
        label: "18:6",
    },
    FixedWindow {
        fasting_type: FastingType::TwentyFour,
        fasting_hours: 20,
        label: "20:4",
    },
    FixedWindow {
        fasting_type: FastingType::OneMealADay,
        fasting_hours: 23,
        label: "OMAD",
    },
];

impl FastingType {
    fn fixed_window(self) -> Option<&'static FixedWindow> {
        FIXED_WINDOWS.iter().find(|w| w.fasting_type == self)
    }

    /// Target fasting duration for this protocol
    #[must_use]
    pub fn target_duration(self) -> Duration {
        match self {
            Self::Custom { target_minutes } => Duration::minutes(i64::from(target_minutes)),
            fixed => fixed
                .fixed_window()
                .map_or_else(Duration::zero, |w| Duration::hours(w.fasting_hours)),
        }
    }

    /// Short display label ("16:8", "OMAD", "custom")
    #[must_use]
    pub fn label(self) -> &'static str {
        self.fixed_window().map_or("custom", |w| w.label)
    }

    /// Parse a label or common alias, returning `None` for unknown values
    #[must_use]
    pub fn parse_label(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        if normalized == "omad" || normalized == "23:1" {
            return Some(Self::OneMealADay);
        }
        FIXED_WINDOWS
            .iter()
            .find(|w| w.label.eq_ignore_ascii_case(&normalized))
            .map(|w| w.fasting_type)
    }

    /// Check that a custom target is within accepted bounds
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTarget` for custom targets outside 1h..=72h.
    pub fn validate(self) -> Result<(), SessionError> {
        if let Self::Custom { target_minutes } = self {
            if !(MIN_CUSTOM_TARGET_MINUTES..=MAX_CUSTOM_TARGET_MINUTES).contains(&target_minutes) {
                return Err(SessionError::InvalidTarget(format!(
                    "custom target of {target_minutes} minutes is outside \
                     {MIN_CUSTOM_TARGET_MINUTES}..={MAX_CUSTOM_TARGET_MINUTES}"
                )));
            }
        }
        Ok(())
    }
}

/// Lifecycle state of a fasting session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FastingState {
    /// No session running
    #[default]
    Idle,
    /// Clock is running
    Active,
    /// Clock is stopped, session still open
    Paused,
    /// Ended by the user as a success
    Completed,
    /// Ended early
    Abandoned,
}

impl FastingState {
    /// Active or Paused
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }

    /// Completed or Abandoned
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }

    /// Lowercase name used in logs and error messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for FastingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands accepted by the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCommand {
    /// Idle -> Active
    Start,
    /// Active -> Paused
    Pause,
    /// Paused -> Active
    Resume,
    /// Active/Paused -> Completed/Abandoned
    End,
}

impl fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::End => "end",
        })
    }
}

/// A stretch of time during which the session clock was stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseInterval {
    /// When the pause began
    pub started_at: DateTime<Utc>,
    /// When the session resumed (None while still paused)
    pub ended_at: Option<DateTime<Utc>>,
}

impl PauseInterval {
    /// Length of the pause as seen at `at`; an open pause counts up to `at`
    #[must_use]
    pub fn duration_at(&self, at: DateTime<Utc>) -> Duration {
        let end = self.ended_at.unwrap_or(at).min(at);
        (end - self.started_at).max(Duration::zero())
    }
}

/// One fasting session.
///
/// Elapsed, remaining and progress are always derived from the timestamps,
/// never stored. The only way to change a session is through the transition
/// methods below, which validate the source state first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastingSession {
    /// Session identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Chosen protocol
    pub fasting_type: FastingType,
    /// When the start command was accepted
    pub started_at: DateTime<Utc>,
    /// Target duration captured at start, in seconds
    pub target_duration_secs: i64,
    /// Current lifecycle state
    pub state: FastingState,
    /// Pause intervals, oldest first; at most the last one is open
    pub pauses: Vec<PauseInterval>,
    /// Optional free-text goal set by the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_goal: Option<String>,
    /// When the session ended (terminal states only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency version, bumped by the store on every write
    pub version: u64,
}

impl FastingSession {
    /// Create a freshly started session in the Active state
    #[must_use]
    pub fn start(
        user_id: Uuid,
        fasting_type: FastingType,
        personal_goal: Option<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            fasting_type,
            started_at,
            target_duration_secs: fasting_type.target_duration().num_seconds(),
            state: FastingState::Active,
            pauses: Vec::new(),
            personal_goal,
            ended_at: None,
            version: 0,
        }
    }

    /// Target duration captured at start
    #[must_use]
    pub fn target_duration(&self) -> Duration {
        Duration::seconds(self.target_duration_secs)
    }

    /// Clamp an observation instant into the session's lifetime
    fn observed_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let upper = self.ended_at.map_or(now, |end| end.min(now));
        upper.max(self.started_at)
    }

    /// Total stopped time up to `now`
    #[must_use]
    pub fn paused_duration(&self, now: DateTime<Utc>) -> Duration {
        let at = self.observed_at(now);
        self.pauses
            .iter()
            .fold(Duration::zero(), |acc, pause| acc + pause.duration_at(at))
    }

    /// Running time: wall clock since start minus all pauses
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let at = self.observed_at(now);
        (at - self.started_at - self.paused_duration(at)).max(Duration::zero())
    }

    /// Time left until the target, never negative
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.target_duration() - self.elapsed(now)).max(Duration::zero())
    }

    /// Elapsed over target, clamped to [0, 1]
    #[must_use]
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        let target_ms = self.target_duration().num_milliseconds();
        if target_ms <= 0 {
            return 1.0;
        }
        let elapsed_ms = self.elapsed(now).num_milliseconds();
        (elapsed_ms as f64 / target_ms as f64).clamp(0.0, 1.0)
    }

    /// The pause interval that is still open, if any
    #[must_use]
    pub fn open_pause(&self) -> Option<&PauseInterval> {
        self.pauses.last().filter(|p| p.ended_at.is_none())
    }

    fn expect_state(&self, expected: FastingState, command: SessionCommand) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.state,
                command,
            })
        }
    }

    /// Active -> Paused
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is Active.
    pub fn pause_at(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        self.expect_state(FastingState::Active, SessionCommand::Pause)?;
        self.pauses.push(PauseInterval {
            started_at: at.max(self.started_at),
            ended_at: None,
        });
        self.state = FastingState::Paused;
        Ok(())
    }

    /// Paused -> Active, closing the open pause interval
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is Paused.
    pub fn resume_at(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        self.expect_state(FastingState::Paused, SessionCommand::Resume)?;
        self.close_open_pause(at);
        self.state = FastingState::Active;
        Ok(())
    }

    /// Active/Paused -> Completed or Abandoned
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is open.
    pub fn end_at(&mut self, at: DateTime<Utc>, completed: bool) -> Result<(), SessionError> {
        if !self.state.is_open() {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                command: SessionCommand::End,
            });
        }
        let end = at.max(self.started_at);
        self.close_open_pause(end);
        self.ended_at = Some(end);
        self.state = if completed {
            FastingState::Completed
        } else {
            FastingState::Abandoned
        };
        Ok(())
    }

    fn close_open_pause(&mut self, at: DateTime<Utc>) {
        if let Some(pause) = self.pauses.last_mut().filter(|p| p.ended_at.is_none()) {
            pause.ended_at = Some(at.max(pause.started_at));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_fixed_windows_are_table_driven() {
        assert_eq!(FastingType::SixteenEight.target_duration(), Duration::hours(16));
        assert_eq!(FastingType::OneMealADay.target_duration(), Duration::hours(23));
        assert_eq!(FastingType::SixteenEight.label(), "16:8");
        assert_eq!(
            FastingType::Custom { target_minutes: 90 }.target_duration(),
            Duration::minutes(90)
        );
        assert_eq!(FastingType::parse_label("18:6"), Some(FastingType::EighteenSix));
        assert_eq!(FastingType::parse_label("omad"), Some(FastingType::OneMealADay));
        assert_eq!(FastingType::parse_label("9:15"), None);
    }

    #[test]
    fn test_custom_target_bounds() {
        assert!(FastingType::Custom { target_minutes: 30 }.validate().is_err());
        assert!(FastingType::Custom { target_minutes: 600 }.validate().is_ok());
        assert!(FastingType::SixteenEight.validate().is_ok());
    }

    #[test]
    fn test_sixteen_hour_fast_with_half_hour_pause() {
        let mut session = FastingSession::start(Uuid::new_v4(), FastingType::SixteenEight, None, t0());
        session.pause_at(t0() + Duration::hours(2)).unwrap();
        session
            .resume_at(t0() + Duration::hours(2) + Duration::minutes(30))
            .unwrap();

        let now = t0() + Duration::hours(16) + Duration::minutes(30);
        assert_eq!(session.elapsed(now), Duration::hours(16));
        assert_eq!(session.remaining(now), Duration::zero());
        assert!((session.progress(now) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_open_pause_counts_until_now() {
        let mut session = FastingSession::start(Uuid::new_v4(), FastingType::TwelveTwelve, None, t0());
        session.pause_at(t0() + Duration::hours(1)).unwrap();

        let now = t0() + Duration::hours(3);
        assert_eq!(session.paused_duration(now), Duration::hours(2));
        assert_eq!(session.elapsed(now), Duration::hours(1));
        assert!(session.open_pause().is_some());
    }

    #[test]
    fn test_terminal_session_freezes_at_end() {
        let mut session = FastingSession::start(Uuid::new_v4(), FastingType::SixteenEight, None, t0());
        session.pause_at(t0() + Duration::hours(4)).unwrap();
        let end = t0() + Duration::hours(5);
        session.end_at(end, false).unwrap();

        assert_eq!(session.state, FastingState::Abandoned);
        assert!(session.open_pause().is_none());

        let much_later = t0() + Duration::days(3);
        let total = session.elapsed(much_later) + session.paused_duration(much_later);
        assert_eq!(total, end - session.started_at);
        assert_eq!(session.elapsed(much_later), Duration::hours(4));
    }

    #[test]
    fn test_wrong_source_state_is_rejected_without_mutation() {
        let mut session = FastingSession::start(Uuid::new_v4(), FastingType::SixteenEight, None, t0());
        let before = session.clone();

        let err = session.resume_at(t0() + Duration::minutes(5)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: FastingState::Active,
                command: SessionCommand::Resume
            }
        ));
        assert_eq!(session, before);

        session.end_at(t0() + Duration::hours(1), true).unwrap();
        assert!(session.pause_at(t0() + Duration::hours(2)).is_err());
        assert!(session.end_at(t0() + Duration::hours(2), true).is_err());
    }

    #[test]
    fn test_progress_is_clamped() {
        let session = FastingSession::start(Uuid::new_v4(), FastingType::TwelveTwelve, None, t0());
        assert!(session.progress(t0() - Duration::hours(1)).abs() < f64::EPSILON);
        assert!((session.progress(t0() + Duration::days(2)) - 1.0).abs() < f64::EPSILON);
    }
}

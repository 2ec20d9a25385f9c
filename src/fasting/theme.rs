// ABOUTME: Progress-driven visual theme tiers for the fasting timer
// ABOUTME: Table lookup of label, accent color, and motivational line per quartile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use serde::Serialize;

/// Visual tier chosen from session progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeTier {
    /// [0, 0.25)
    Starting,
    /// [0.25, 0.5)
    Building,
    /// [0.5, 0.75)
    Deepening,
    /// [0.75, 1)
    FinalStretch,
    /// Target reached
    Complete,
}

/// Display attributes of a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeStyle {
    /// Short label shown next to the ring
    pub label: &'static str,
    /// Accent color as `#rrggbb`
    pub accent: &'static str,
    /// Motivational line
    pub message: &'static str,
}

const THEME_TABLE: [(ThemeTier, ThemeStyle); 5] = [
    (
        ThemeTier::Starting,
        ThemeStyle {
            label: "Starting",
            accent: "#4f9dde",
            message: "You've started. Stay hydrated and settle in.",
        },
    ),
    (
        ThemeTier::Building,
        ThemeStyle {
            label: "Building",
            accent: "#3bb58a",
            message: "Momentum is building. Hunger waves pass in minutes.",
        },
    ),
    (
        ThemeTier::Deepening,
        ThemeStyle {
            label: "Deepening",
            accent: "#e0a526",
            message: "Past halfway. Your body is switching fuel sources.",
        },
    ),
    (
        ThemeTier::FinalStretch,
        ThemeStyle {
            label: "Final stretch",
            accent: "#e0672b",
            message: "Almost there. Plan a gentle meal to break your fast.",
        },
    ),
    (
        ThemeTier::Complete,
        ThemeStyle {
            label: "Complete",
            accent: "#8c5cd6",
            message: "Target reached. Well done.",
        },
    ),
];

impl ThemeTier {
    /// Tier for a progress value; values outside [0, 1] are clamped
    #[must_use]
    pub fn for_progress(progress: f64) -> Self {
        let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        if p >= 1.0 {
            Self::Complete
        } else if p >= 0.75 {
            Self::FinalStretch
        } else if p >= 0.5 {
            Self::Deepening
        } else if p >= 0.25 {
            Self::Building
        } else {
            Self::Starting
        }
    }

    /// Display attributes for this tier
    #[must_use]
    pub fn style(self) -> ThemeStyle {
        THEME_TABLE
            .iter()
            .find(|(tier, _)| *tier == self)
            .map_or(THEME_TABLE[0].1, |(_, style)| *style)
    }

    /// Motivational line for this tier
    #[must_use]
    pub fn motivation(self) -> &'static str {
        self.style().message
    }
}

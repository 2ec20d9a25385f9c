// ABOUTME: UI side effects of fasting state such as hidden navigation surfaces
// ABOUTME: Bitflags for food-related surfaces and the signal bundle published per user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Navigation surfaces the app can hide while a fast is running
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct NavigationSurfaces: u8 {
        /// Food browsing and discovery feed
        const FOOD_DISCOVERY = 0b0000_0001;
        /// Recipe collections
        const RECIPES = 0b0000_0010;
        /// Meal photo logging camera
        const MEAL_CAMERA = 0b0000_0100;
        /// Restaurant promotions
        const RESTAURANT_DEALS = 0b0000_1000;
    }
}

impl NavigationSurfaces {
    /// Surfaces hidden during an active fast
    #[must_use]
    pub const fn while_fasting() -> Self {
        Self::FOOD_DISCOVERY
            .union(Self::RECIPES)
            .union(Self::MEAL_CAMERA)
    }
}

/// UI state derived from the session lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSignals {
    /// Whether food content should pass through the content filter
    pub content_filter_enabled: bool,
    /// Surfaces to remove from navigation
    pub hidden_surfaces: NavigationSurfaces,
}

impl UiSignals {
    /// Signals applied when a fast starts
    #[must_use]
    pub const fn fasting() -> Self {
        Self {
            content_filter_enabled: true,
            hidden_surfaces: NavigationSurfaces::while_fasting(),
        }
    }

    /// Signals when no fast is running
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            content_filter_enabled: false,
            hidden_surfaces: NavigationSurfaces::empty(),
        }
    }

    /// Whether a surface is currently hidden
    #[must_use]
    pub const fn hides(&self, surface: NavigationSurfaces) -> bool {
        self.hidden_surfaces.contains(surface)
    }
}

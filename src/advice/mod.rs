// ABOUTME: Personalized advice generation grounded in retrieved reference material
// ABOUTME: Request types, per-type templates, prompt assembly, and the generator pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

mod generator;
mod prompts;
/// Per-type default queries, canned fallbacks and keyword inference
pub mod templates;

pub use generator::{AdviceDependencies, AdviceGenerator, AdviceRequest};
pub use prompts::{build_user_prompt, COACH_SYSTEM_PROMPT};

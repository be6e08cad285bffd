// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the persona router.
//!
//! Mocks for the two external collaborators the router consumes, with
//! scripted results, injected failures, and artificial latency.

pub mod mock_history;
pub mod mock_llm;

pub use mock_history::MockHistoryProvider;
pub use mock_llm::MockLlmProvider;

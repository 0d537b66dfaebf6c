// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Warmup engine and integration tests.
//!
//! Provides in-memory collaborators and fixtures for fast, deterministic,
//! CI-runnable tests without a database or mail server.
//!
//! # Components
//!
//! - [`MemoryStore`] - mutex-guarded `WarmupStore` with failure injection
//! - [`MockTransport`] - mail transport with scripted failures and captured sends
//! - [`ManualClock`] - clock that only moves when told to
//! - [`CampaignBuilder`] / [`DomainBuilder`] - fixture builders

pub mod clock;
pub mod fixtures;
pub mod memory_store;
pub mod mock_transport;

pub use clock::ManualClock;
pub use fixtures::{contact, CampaignBuilder, DomainBuilder};
pub use memory_store::MemoryStore;
pub use mock_transport::{CapturedSend, MockTransport};

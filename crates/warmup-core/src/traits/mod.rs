// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Adapters extend the [`PluginAdapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod adapter;
pub mod clock;
pub mod render;
pub mod storage;
pub mod transport;

pub use adapter::PluginAdapter;
pub use clock::{Clock, SystemClock};
pub use render::ContentRenderer;
pub use storage::WarmupStore;
pub use transport::MailTransport;

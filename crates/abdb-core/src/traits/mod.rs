// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the coordinator and its outward-facing collaborators.
//!
//! Traits use `#[async_trait]` so they stay usable as trait objects.

pub mod store;

pub use store::TransactionalStore;

// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON action bridge for ABDB.
//!
//! Decodes `{"id", "action", "args"}` envelopes, runs them against any
//! [`abdb_core::TransactionalStore`], and encodes the outcome as a response
//! envelope carrying either a result or a coded error.

pub mod dispatch;
pub mod request;
pub mod response;

pub use dispatch::Dispatcher;
pub use request::{Envelope, Request};
pub use response::{ErrorBody, Response};

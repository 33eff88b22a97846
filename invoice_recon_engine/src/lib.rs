//! Invoice Reconciliation Engine
//!
//! The reconciliation engine takes invoices extracted from vendor documents, checks them against their
//! reference purchase orders, and shepherds exceptions through a human approval loop. This library contains
//! the core logic for the engine. It is notification-channel agnostic.
//!
//! The library is divided into these main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need
//!    to access the database directly. Instead, use the public API provided by the engine. The exception is the
//!    data types used in the database. These are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`mod@ivr_api`]). This provides the public-facing functionality of the engine:
//!    ingestion, the purchase-order check, the approval round-trip, and submission to the order-management
//!    service. Backends need to implement the traits in the [`traits`] module in order to act as storage for
//!    the engine.
//! 3. The matching policy ([`matching`]), a set of pure functions that compare invoice lines against reference
//!    lines within configurable tolerances.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain
//! actions occur, for example when a flagged invoice needs a human decision. A simple actor framework is used
//! so that you can easily hook into these events and perform custom actions.

pub mod db_types;
pub mod events;
pub mod helpers;
mod ivr_api;
pub mod matching;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db, SqliteDatabase};
pub use ivr_api::{errors::ReconciliationError, recon_api::ReconciliationApi};

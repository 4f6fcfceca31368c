//! Shared application state.

use std::sync::Arc;

use axum::extract::State;

use procstatus_core::collector::SnapshotSource;

/// Snapshot source shared by every request. Collection holds no mutable
/// state, so no lock is needed.
pub(crate) type SharedState = Arc<dyn SnapshotSource>;

pub(crate) type AppState = State<SharedState>;

//! Diagnostics buffer commands

use shelfsight_common::DiagnosticsStats;
use shelfsight_domain::{Result as DomainResult, ShelfSightError};

use crate::context::AppContext;

pub fn diagnostics_stats(ctx: &AppContext) -> DiagnosticsStats {
    ctx.diagnostics.stats()
}

/// Every retained diagnostics entry as pretty-printed JSON.
///
/// # Errors
/// `Internal` if an entry cannot be serialized.
pub fn export_diagnostics(ctx: &AppContext) -> DomainResult<String> {
    ctx.diagnostics.export_json().map_err(|err| ShelfSightError::Internal(format!("diagnostics export failed: {err}")))
}

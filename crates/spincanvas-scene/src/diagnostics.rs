//! Where recovered load failures are reported

use tracing::error;

use crate::error::AssetLoadFailure;

pub trait DiagnosticsSink {
    fn report_load_failure(&mut self, failure: &AssetLoadFailure);
}

/// Default sink: one `error!` event per failure
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn report_load_failure(&mut self, failure: &AssetLoadFailure) {
        error!(path = %failure.path, "{}", failure);
    }
}

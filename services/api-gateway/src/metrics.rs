//! Prometheus counters for BOM operations.

use std::sync::OnceLock;

use prometheus::{IntCounterVec, Opts};
use tracing::warn;

static BOM_OPERATIONS: OnceLock<Option<IntCounterVec>> = OnceLock::new();

fn bom_operations() -> Option<&'static IntCounterVec> {
    BOM_OPERATIONS
        .get_or_init(|| {
            let counter = IntCounterVec::new(
                Opts::new("meridian_bom_operations_total", "BOM operations by outcome"),
                &["operation", "outcome"],
            )
            .and_then(|counter| {
                prometheus::register(Box::new(counter.clone()))?;
                Ok(counter)
            });
            match counter {
                Ok(counter) => Some(counter),
                Err(e) => {
                    warn!(error = %e, "BOM operation metrics disabled");
                    None
                }
            }
        })
        .as_ref()
}

/// Counts one BOM operation. `outcome` is `ok` or the error code.
pub fn record_bom_operation(operation: &str, outcome: &str) {
    if let Some(counter) = bom_operations() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

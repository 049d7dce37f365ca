//! Summary of one document pass.

use std::fmt;

use serde::Serialize;

use crate::op::Operation;

/// Operation counts by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationCounts {
    pub construct: usize,
    pub set_field: usize,
    pub register: usize,
    pub expose: usize,
}

impl OperationCounts {
    pub fn tally(ops: &[Operation]) -> Self {
        let mut counts = Self::default();
        for op in ops {
            match op {
                Operation::Construct { .. } => counts.construct += 1,
                Operation::SetField { .. } => counts.set_field += 1,
                Operation::Register { .. } => counts.register += 1,
                Operation::Expose { .. } => counts.expose += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.construct + self.set_field + self.register + self.expose
    }
}

/// What a pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmissionReport {
    /// Entries in the document, platform entries included.
    pub entries: usize,
    /// Identifiers declared, generated ones included.
    pub identifiers: usize,
    pub operations: OperationCounts,
    /// Times an entry waited for a later entry.
    pub suspensions: usize,
}

impl fmt::Display for EmissionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Emission Report ===")?;
        writeln!(f, "Entries: {}", self.entries)?;
        writeln!(f, "Identifiers: {}", self.identifiers)?;
        writeln!(
            f,
            "Operations: {} ({} construct, {} set, {} register, {} expose)",
            self.operations.total(),
            self.operations.construct,
            self.operations.set_field,
            self.operations.register,
            self.operations.expose,
        )?;
        write!(f, "Suspensions: {}", self.suspensions)
    }
}

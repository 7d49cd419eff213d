pub mod residents;
pub mod seed;
pub mod stands;

use std::fmt;

/// Per-record outcomes of a bulk import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created: {}, updated: {}, skipped: {}, errors: {}",
            self.created, self.updated, self.skipped, self.errors
        )
    }
}

//! Semaphore classification of resistance-category text.
//!
//! The scoring service labels each (gene, drug) pair with a resistance
//! category string. The report summarises those categories as a
//! traffic-light semaphore with a fixed display colour per level.

use std::collections::HashMap;

/// Traffic-light classification of a per-drug resistance category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Semaphore {
    /// Susceptible / no resistance.
    Green,
    /// Low-level or potential low-level resistance.
    Blue,
    /// Intermediate-level resistance.
    Yellow,
    /// High-level resistance.
    Red,
    /// Unrecognised or missing category (explicit default, never an error).
    Gray,
}

impl Semaphore {
    /// Display name attached to enriched levels.
    pub fn name(self) -> &'static str {
        match self {
            Semaphore::Green => "GREEN",
            Semaphore::Blue => "BLUE",
            Semaphore::Yellow => "YELLOW",
            Semaphore::Red => "RED",
            Semaphore::Gray => "GRAY",
        }
    }

    /// Fixed display colour attached to enriched levels.
    pub fn color(self) -> &'static str {
        match self {
            Semaphore::Green => "#28a745",
            Semaphore::Blue => "#17a2b8",
            Semaphore::Yellow => "#ffc107",
            Semaphore::Red => "#dc3545",
            Semaphore::Gray => "#6c757d",
        }
    }
}

/// Immutable classification table injected into the enricher at call time.
///
/// Held as a value rather than module-level state so that concurrent report
/// requests share nothing mutable.
#[derive(Clone, Debug)]
pub struct SemaphoreConfig {
    table: HashMap<&'static str, Semaphore>,
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self {
            table: HashMap::from([
                ("Susceptible", Semaphore::Green),
                ("No Resistance", Semaphore::Green),
                ("Low-Level Resistance", Semaphore::Blue),
                ("Potential Low-Level Resistance", Semaphore::Blue),
                ("Intermediate-Level Resistance", Semaphore::Yellow),
                ("High-Level Resistance", Semaphore::Red),
            ]),
        }
    }
}

impl SemaphoreConfig {
    /// Classifies a resistance-category string; anything unrecognised or
    /// missing maps to [`Semaphore::Gray`].
    pub fn classify(&self, text: Option<&str>) -> Semaphore {
        text.and_then(|t| self.table.get(t).copied())
            .unwrap_or(Semaphore::Gray)
    }
}

//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services. Reading process-wide environment variables during request
//! handling leads to inconsistent behaviour in multi-threaded runtimes and
//! test harnesses, so the binaries resolve their environment at the edge and
//! construct a `CoreConfig` up front.

use crate::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::query::Page;
use crate::{TrackerError, TrackerResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    default_page_limit: usize,
    max_page_limit: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidInput` if either limit is zero or the
    /// default exceeds the maximum.
    pub fn new(default_page_limit: usize, max_page_limit: usize) -> TrackerResult<Self> {
        if default_page_limit == 0 || max_page_limit == 0 {
            return Err(TrackerError::InvalidInput(
                "page limits must be at least 1".into(),
            ));
        }
        if default_page_limit > max_page_limit {
            return Err(TrackerError::InvalidInput(format!(
                "default page limit {default_page_limit} exceeds maximum {max_page_limit}"
            )));
        }

        Ok(Self {
            default_page_limit,
            max_page_limit,
        })
    }

    pub fn default_page_limit(&self) -> usize {
        self.default_page_limit
    }

    pub fn max_page_limit(&self) -> usize {
        self.max_page_limit
    }

    /// Build a [`Page`] from raw caller-supplied pagination values, applying
    /// the configured default and clamping to the configured maximum.
    pub fn page(&self, limit: Option<usize>, offset: Option<usize>) -> Page {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(self.default_page_limit)
            .min(self.max_page_limit);
        Page {
            limit,
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: MAX_PAGE_LIMIT,
        }
    }
}

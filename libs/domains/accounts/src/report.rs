use serde::Serialize;
use uuid::Uuid;

use crate::error::GraphError;

/// What happened to one managed page during a linking run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PageOutcome {
    Linked {
        account_id: Uuid,
        remote_account_id: String,
    },
    NoBusinessAccount,
    LookupFailed {
        error: String,
    },
    DetailFailed {
        remote_account_id: String,
        error: String,
    },
    PersistFailed {
        remote_account_id: String,
        error: String,
    },
}

impl PageOutcome {
    pub fn lookup_failed(err: &GraphError) -> Self {
        PageOutcome::LookupFailed {
            error: err.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PageOutcome::LookupFailed { .. }
                | PageOutcome::DetailFailed { .. }
                | PageOutcome::PersistFailed { .. }
        )
    }

    /// A business account was discovered for the page, whatever happened after.
    pub fn found_account(&self) -> bool {
        matches!(
            self,
            PageOutcome::Linked { .. }
                | PageOutcome::DetailFailed { .. }
                | PageOutcome::PersistFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub page_id: String,
    #[serde(flatten)]
    pub outcome: PageOutcome,
}

impl PageReport {
    pub fn new(page_id: impl Into<String>, outcome: PageOutcome) -> Self {
        Self {
            page_id: page_id.into(),
            outcome,
        }
    }
}

/// Summary of one linking run, folded from per-page reports.
///
/// Kept for logging only. The callback redirect never exposes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    pub pages_seen: usize,
    pub accounts_found: usize,
    pub accounts_persisted: usize,
    pub accounts_skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_error: Option<String>,
    pub pages: Vec<PageReport>,
}

impl LinkReport {
    pub fn listing_failed(err: &GraphError) -> Self {
        Self {
            listing_error: Some(err.to_string()),
            ..Self::default()
        }
    }

    pub fn record(&mut self, page: PageReport) {
        self.pages_seen += 1;
        if page.outcome.found_account() {
            self.accounts_found += 1;
        }
        match page.outcome {
            PageOutcome::Linked { .. } => self.accounts_persisted += 1,
            PageOutcome::DetailFailed { .. } | PageOutcome::PersistFailed { .. } => {
                self.accounts_skipped += 1
            }
            _ => {}
        }
        self.pages.push(page);
    }

    /// Pages whose processing hit a provider or store failure.
    pub fn errors(&self) -> impl Iterator<Item = &PageReport> {
        self.pages.iter().filter(|p| p.outcome.is_failure())
    }

    pub fn is_clean(&self) -> bool {
        self.listing_error.is_none() && self.errors().next().is_none()
    }
}

impl FromIterator<PageReport> for LinkReport {
    fn from_iter<I: IntoIterator<Item = PageReport>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut report, page| {
            report.record(page);
            report
        })
    }
}

//! Classification of probe responses into pending / success / failure

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Verdict for a single probe response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Keep polling
    Pending,
    /// Target status reached (subject to stabilization)
    Success,
    /// The operation failed remotely; `status` is what was observed
    Failure { status: String },
}

impl Classification {
    pub fn failure(status: impl Into<String>) -> Self {
        Self::Failure {
            status: status.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Strategy mapping a probe response to a [`Classification`]
///
/// Any `Fn(&R) -> Classification` is a classifier, as is a [`StatusTable`]
/// (for responses that are themselves status strings) or a
/// [`TableClassifier`] built with [`StatusTable::with_extractor`].
pub trait Classify<R> {
    fn classify(&self, response: &R) -> Classification;

    /// Checked once before the first probe
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl<R, F> Classify<R> for F
where
    F: Fn(&R) -> Classification,
{
    fn classify(&self, response: &R) -> Classification {
        self(response)
    }
}

/// What to do with a status that is in none of the sets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownStatus {
    /// Keep polling (default)
    #[default]
    Pending,
    /// Stop with a failure carrying the unknown status
    Fail,
}

/// Status placeholder reported when a response carries no status at all
pub const MISSING_STATUS: &str = "<missing>";

/// Fixed pending / success / failure status lists for one operation
///
/// Statuses are compared as exact strings. Numeric and boolean API fields
/// are matched through their string form (see [`crate::status`]).
///
/// ```
/// use opwait::{Classification, StatusTable};
///
/// let table = StatusTable::new()
///     .success(["200"])
///     .failure(["300", "303", "800"]);
///
/// assert_eq!(table.classify_status("200"), Classification::Success);
/// assert_eq!(table.classify_status("303"), Classification::failure("303"));
/// assert_eq!(table.classify_status("100"), Classification::Pending);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTable {
    #[serde(default)]
    pending: BTreeSet<String>,
    #[serde(default)]
    success: BTreeSet<String>,
    #[serde(default)]
    failure: BTreeSet<String>,
    #[serde(default)]
    unknown: UnknownStatus,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending.extend(statuses.into_iter().map(Into::into));
        self
    }

    pub fn success<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.success.extend(statuses.into_iter().map(Into::into));
        self
    }

    pub fn failure<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure.extend(statuses.into_iter().map(Into::into));
        self
    }

    pub fn unknown(mut self, policy: UnknownStatus) -> Self {
        self.unknown = policy;
        self
    }

    pub fn classify_status(&self, status: &str) -> Classification {
        if self.failure.contains(status) {
            Classification::failure(status)
        } else if self.success.contains(status) {
            Classification::Success
        } else if self.pending.contains(status) {
            Classification::Pending
        } else {
            self.classify_unknown(status)
        }
    }

    /// Classify a response where no status could be read
    pub fn classify_missing(&self) -> Classification {
        self.classify_unknown(MISSING_STATUS)
    }

    fn classify_unknown(&self, status: &str) -> Classification {
        match self.unknown {
            UnknownStatus::Pending => Classification::Pending,
            UnknownStatus::Fail => Classification::failure(status),
        }
    }

    /// The three sets must be disjoint
    pub fn validate(&self) -> Result<()> {
        let sets = [
            ("pending", &self.pending),
            ("success", &self.success),
            ("failure", &self.failure),
        ];
        for (i, &(first, a)) in sets.iter().enumerate() {
            for &(second, b) in &sets[i + 1..] {
                if let Some(status) = a.intersection(b).next() {
                    return Err(ConfigError::OverlappingStatus {
                        status: status.clone(),
                        first,
                        second,
                    });
                }
            }
        }
        Ok(())
    }

    /// Turn the table into a classifier for arbitrary responses
    ///
    /// `extract` pulls the status out of a response, returning `None` when
    /// the response carries none.
    pub fn with_extractor<E>(self, extract: E) -> TableClassifier<E> {
        TableClassifier {
            table: self,
            extract,
        }
    }
}

impl<R: AsRef<str>> Classify<R> for StatusTable {
    fn classify(&self, response: &R) -> Classification {
        self.classify_status(response.as_ref())
    }

    fn validate(&self) -> Result<()> {
        StatusTable::validate(self)
    }
}

/// A [`StatusTable`] paired with a status extractor
#[derive(Debug, Clone)]
pub struct TableClassifier<E> {
    table: StatusTable,
    extract: E,
}

impl<E> TableClassifier<E> {
    pub fn table(&self) -> &StatusTable {
        &self.table
    }
}

impl<R, E> Classify<R> for TableClassifier<E>
where
    E: Fn(&R) -> Option<String>,
{
    fn classify(&self, response: &R) -> Classification {
        match (self.extract)(response) {
            Some(status) => self.table.classify_status(&status),
            None => self.table.classify_missing(),
        }
    }

    fn validate(&self) -> Result<()> {
        self.table.validate()
    }
}

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};
use formvault_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Named relative date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatePreset {
    /// From midnight today until now.
    #[serde(rename = "today")]
    Today,
    /// The whole previous calendar day.
    #[serde(rename = "yesterday")]
    Yesterday,
    /// The seven days up to now.
    #[serde(rename = "last7days")]
    Last7Days,
    /// The thirty days up to now.
    #[serde(rename = "last30days")]
    Last30Days,
    /// The ninety days up to now.
    #[serde(rename = "last90days")]
    Last90Days,
}

impl DatePreset {
    /// Returns stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Last7Days => "last7days",
            Self::Last30Days => "last30days",
            Self::Last90Days => "last90days",
        }
    }

    /// Resolves the preset to concrete bounds relative to `now` (UTC days).
    #[must_use]
    pub fn resolve(self, now: DateTime<Utc>) -> ResolvedDateRange {
        let start_of_today = now.date_naive().and_time(NaiveTime::MIN).and_utc();

        match self {
            Self::Today => ResolvedDateRange {
                start: start_of_today,
                end: now,
            },
            Self::Yesterday => ResolvedDateRange {
                start: start_of_today - Duration::days(1),
                end: start_of_today - Duration::milliseconds(1),
            },
            Self::Last7Days => ResolvedDateRange {
                start: now - Duration::days(7),
                end: now,
            },
            Self::Last30Days => ResolvedDateRange {
                start: now - Duration::days(30),
                end: now,
            },
            Self::Last90Days => ResolvedDateRange {
                start: now - Duration::days(90),
                end: now,
            },
        }
    }
}

impl FromStr for DatePreset {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "last7days" => Ok(Self::Last7Days),
            "last30days" => Ok(Self::Last30Days),
            "last90days" => Ok(Self::Last90Days),
            _ => Err(AppError::Validation(format!(
                "unknown date range preset '{value}'"
            ))),
        }
    }
}

/// Date filter as chosen in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateRange {
    /// Relative window resolved at evaluation time.
    Preset(DatePreset),
    /// Fixed bounds, both inclusive.
    Explicit {
        /// Inclusive lower bound.
        start: DateTime<Utc>,
        /// Inclusive upper bound.
        end: DateTime<Utc>,
    },
}

impl DateRange {
    /// Creates a validated explicit range.
    pub fn explicit(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if start > end {
            return Err(AppError::Validation(
                "date range start must not be after its end".to_owned(),
            ));
        }

        Ok(Self::Explicit { start, end })
    }

    /// Creates a range covering whole calendar days from `first` through `last`.
    pub fn between_dates(first: NaiveDate, last: NaiveDate) -> AppResult<Self> {
        let start = first.and_time(NaiveTime::MIN).and_utc();
        let end = last
            .checked_add_days(Days::new(1))
            .map(|next| next.and_time(NaiveTime::MIN).and_utc() - Duration::milliseconds(1))
            .ok_or_else(|| AppError::Validation(format!("date '{last}' is out of range")))?;

        Self::explicit(start, end)
    }

    /// Resolves to concrete bounds. Call once per filter pass.
    #[must_use]
    pub fn resolve(&self, now: DateTime<Utc>) -> ResolvedDateRange {
        match self {
            Self::Preset(preset) => preset.resolve(now),
            Self::Explicit { start, end } => ResolvedDateRange {
                start: *start,
                end: *end,
            },
        }
    }
}

/// Concrete inclusive time bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDateRange {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Inclusive upper bound.
    pub end: DateTime<Utc>,
}

impl ResolvedDateRange {
    /// Returns whether `timestamp` lies within both bounds.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Combined search, date and per-field filter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    /// Case-insensitive substring searched across title, labels and values.
    pub search_term: String,
    /// Optional submission-time window.
    pub date_range: Option<DateRange>,
    /// Expected value per field id; blank entries are inactive.
    pub field_filters: BTreeMap<String, String>,
}

impl FilterState {
    /// Returns a copy with a search term.
    #[must_use]
    pub fn with_search(mut self, search_term: impl Into<String>) -> Self {
        self.search_term = search_term.into();
        self
    }

    /// Returns a copy with a date range.
    #[must_use]
    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = Some(date_range);
        self
    }

    /// Returns a copy with one field filter.
    #[must_use]
    pub fn with_field_filter(
        mut self,
        field_id: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        self.field_filters.insert(field_id.into(), expected.into());
        self
    }

    /// Returns the trimmed search term when it is not blank.
    #[must_use]
    pub fn active_search_term(&self) -> Option<&str> {
        let term = self.search_term.trim();
        (!term.is_empty()).then_some(term)
    }

    /// Iterates field filters whose expected value is not blank.
    pub fn active_field_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.field_filters
            .iter()
            .map(|(field_id, expected)| (field_id.as_str(), expected.trim()))
            .filter(|(_, expected)| !expected.is_empty())
    }

    /// Returns whether no filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_search_term().is_none()
            && self.date_range.is_none()
            && self.active_field_filters().next().is_none()
    }

    /// Rejects inverted explicit ranges decoded from transport.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(DateRange::Explicit { start, end }) = self.date_range {
            DateRange::explicit(start, end)?;
        }

        Ok(())
    }
}

use serde::{Deserialize, Serialize};

/// Sort direction for submission listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Attribute submissions can be ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Submission timestamp.
    SubmittedAt,
    /// Form title captured at submission time.
    FormTitle,
    /// Review status.
    Status,
    /// Display text of one field, by field id.
    Field(String),
}

impl SortKey {
    /// Direction used when the key is first selected.
    #[must_use]
    pub fn natural_direction(&self) -> SortDirection {
        match self {
            Self::SubmittedAt => SortDirection::Desc,
            Self::FormTitle | Self::Status | Self::Field(_) => SortDirection::Asc,
        }
    }
}

/// Active ordering of the submission listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    /// Attribute to order by.
    pub key: SortKey,
    /// Order direction.
    pub direction: SortDirection,
}

impl SortState {
    /// Creates a sort state.
    #[must_use]
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Selects `key`, flipping direction if it is already active.
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.reversed();
        } else {
            self.direction = key.natural_direction();
            self.key = key;
        }
    }
}

impl Default for SortState {
    /// Newest submissions first.
    fn default() -> Self {
        Self::new(SortKey::SubmittedAt, SortDirection::Desc)
    }
}

#[cfg(test)]
mod tests {
    use super::{SortDirection, SortKey, SortState};

    #[test]
    fn default_is_newest_first() {
        let state = SortState::default();
        assert_eq!(state.key, SortKey::SubmittedAt);
        assert_eq!(state.direction, SortDirection::Desc);
    }

    #[test]
    fn toggling_same_key_flips_direction() {
        let mut state = SortState::default();
        state.toggle(SortKey::SubmittedAt);
        assert_eq!(state.direction, SortDirection::Asc);

        state.toggle(SortKey::FormTitle);
        assert_eq!(state.key, SortKey::FormTitle);
        assert_eq!(state.direction, SortDirection::Asc);

        state.toggle(SortKey::FormTitle);
        assert_eq!(state.direction, SortDirection::Desc);
    }
}

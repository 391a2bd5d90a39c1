//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod field;
mod field_source;
mod filter;
mod sort;
mod submission;
mod value;

pub use field::{
    CheckboxConstraints, ChoiceConstraints, DateConstraints, FieldKind, FieldSchema,
    FileConstraints, NumberConstraints, RatingConstraints, TextConstraints, parse_calendar_date,
};
pub use field_source::FieldSchemaSource;
pub use filter::{DatePreset, DateRange, FilterState, ResolvedDateRange};
pub use sort::{SortDirection, SortKey, SortState};
pub use submission::{SubmissionMetadata, SubmissionNote, SubmissionRecord, SubmissionStatus};
pub use value::{FieldLookup, FieldValue, FileDescriptor};

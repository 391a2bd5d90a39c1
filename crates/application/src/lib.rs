//! Application services and ports.

#![forbid(unsafe_code)]

mod analytics;
mod export_formatter;
mod export_service;
mod field_format;
mod filter_engine;
mod paginator;
mod query_pipeline;
mod sorter;
mod submission_ports;
mod submission_service;

pub use analytics::{FieldAnalytics, SubmissionAnalytics, ValueCount, summarize};
pub use export_formatter::{
    ExportArtifact, ExportColumn, ExportFormat, ExportLimits, ExportOptions, ExportPreview,
    ExportValidation, METADATA_COLUMNS, export_columns, export_filename, preview, render_export,
    restrict_to_selection, to_csv, to_json, validate_export,
};
pub use export_service::{
    DEFAULT_EXPORT_HISTORY, ExportOutcome, ExportReceipt, ExportSession, SubmissionExporter,
};
pub use field_format::{format_for_display, format_for_export, summarize_record};
pub use filter_engine::{CompiledFilter, apply_filters};
pub use paginator::{PageInfo, PageMarker, Paginator};
pub use query_pipeline::{PipelineConfig, SubmissionQueryPipeline};
pub use sorter::{sort_records, sort_with};
pub use submission_ports::{Clock, DownloadTarget, FixedClock, SubmissionRepository, SystemClock};
pub use submission_service::{BulkDeleteReport, SubmissionService};

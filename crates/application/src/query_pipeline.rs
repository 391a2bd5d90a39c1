use std::collections::BTreeSet;
use std::sync::Arc;

use formvault_core::{AppError, AppResult};
use formvault_domain::{DateRange, FieldSchema, FilterState, SortKey, SortState, SubmissionRecord};
use tracing::{debug, warn};

use crate::analytics::{SubmissionAnalytics, summarize};
use crate::field_format::summarize_record;
use crate::filter_engine::CompiledFilter;
use crate::paginator::{PageInfo, PageMarker, Paginator};
use crate::sorter::sort_with;
use crate::submission_ports::Clock;


/// Pagination defaults for a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Initial page size.
    pub page_size: usize,
    /// Largest page size a caller may pick.
    pub max_page_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_page_size: 1000,
        }
    }
}

/// How a view recomputation treats the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagePolicy {
    /// Keep the page, pulling it back if it no longer exists.
    Reclamp,
    /// Jump to the first page of the new results.
    Reset,
}

/// Stateful filter, sort, paginate and select pipeline over one record set.
///
/// Filter and sort changes reset to the first page. Record changes keep the
/// current page unless it no longer exists. The selection is keyed by record
/// id and survives filtering; only records that disappear from the set are
/// dropped from it.
pub struct SubmissionQueryPipeline {
    records: Vec<SubmissionRecord>,
    fallback_fields: Vec<FieldSchema>,
    filter: FilterState,
    sort: SortState,
    paginator: Paginator,
    view: Vec<usize>,
    selection: BTreeSet<String>,
    source_error: Option<AppError>,
    clock: Arc<dyn Clock>,
}

impl SubmissionQueryPipeline {
    /// Creates an empty pipeline.
    pub fn new(config: PipelineConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        Ok(Self {
            records: Vec::new(),
            fallback_fields: Vec::new(),
            filter: FilterState::default(),
            sort: SortState::default(),
            paginator: Paginator::new(config.page_size, config.max_page_size)?,
            view: Vec::new(),
            selection: BTreeSet::new(),
            source_error: None,
            clock,
        })
    }

    /// Returns every record, unfiltered.
    #[must_use]
    pub fn records(&self) -> &[SubmissionRecord] {
        &self.records
    }

    /// Finds a record by id.
    #[must_use]
    pub fn find(&self, submission_id: &str) -> Option<&SubmissionRecord> {
        self.records
            .iter()
            .find(|record| record.id() == submission_id)
    }

    /// Returns the fallback field list used for legacy records.
    #[must_use]
    pub fn fallback_fields(&self) -> &[FieldSchema] {
        &self.fallback_fields
    }

    /// Replaces the fallback field list.
    pub fn set_fallback_fields(&mut self, fields: Vec<FieldSchema>) {
        self.fallback_fields = fields;
        self.recompute(PagePolicy::Reclamp);
    }

    /// Replaces the record set with a fresh snapshot from the data source.
    ///
    /// Clears any data-source error and drops selected ids that are gone.
    pub fn replace_records(&mut self, records: Vec<SubmissionRecord>) {
        self.records = records;
        self.source_error = None;
        let known: BTreeSet<&str> = self.records.iter().map(SubmissionRecord::id).collect();
        self.selection.retain(|id| known.contains(id.as_str()));
        self.recompute(PagePolicy::Reclamp);
    }

    /// Inserts a record, replacing any record with the same id.
    pub fn insert_record(&mut self, record: SubmissionRecord) {
        match self
            .records
            .iter_mut()
            .find(|existing| existing.id() == record.id())
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        self.recompute(PagePolicy::Reclamp);
    }

    /// Removes a record and its selection entry.
    pub fn remove_record(&mut self, submission_id: &str) -> Option<SubmissionRecord> {
        let position = self
            .records
            .iter()
            .position(|record| record.id() == submission_id)?;
        let removed = self.records.remove(position);
        self.selection.remove(submission_id);
        self.recompute(PagePolicy::Reclamp);
        Some(removed)
    }

    /// Keeps the current records and marks the data source as failed.
    pub fn record_source_failure(&mut self, error: AppError) {
        warn!(
            error = %error,
            retained = self.records.len(),
            "submission source failed; keeping last known records"
        );
        self.source_error = Some(error);
    }

    /// Returns the last data-source failure, if it has not been cleared by a
    /// successful snapshot.
    #[must_use]
    pub fn source_error(&self) -> Option<&AppError> {
        self.source_error.as_ref()
    }

    /// Returns the active filter.
    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Replaces the whole filter state.
    pub fn set_filter(&mut self, filter: FilterState) -> AppResult<()> {
        filter.validate()?;
        self.filter = filter;
        self.recompute(PagePolicy::Reset);
        Ok(())
    }

    /// Sets the search term.
    pub fn set_search_term(&mut self, search_term: impl Into<String>) {
        self.filter.search_term = search_term.into();
        self.recompute(PagePolicy::Reset);
    }

    /// Sets or clears the date range.
    pub fn set_date_range(&mut self, date_range: Option<DateRange>) {
        self.filter.date_range = date_range;
        self.recompute(PagePolicy::Reset);
    }

    /// Sets one field filter; a blank value removes it.
    pub fn set_field_filter(&mut self, field_id: impl Into<String>, expected: impl Into<String>) {
        let field_id = field_id.into();
        let expected = expected.into();
        if expected.trim().is_empty() {
            self.filter.field_filters.remove(&field_id);
        } else {
            self.filter.field_filters.insert(field_id, expected);
        }
        self.recompute(PagePolicy::Reset);
    }

    /// Removes every filter.
    pub fn clear_filters(&mut self) {
        self.filter = FilterState::default();
        self.recompute(PagePolicy::Reset);
    }

    /// Returns the active ordering.
    #[must_use]
    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    /// Replaces the ordering.
    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
        self.recompute(PagePolicy::Reset);
    }

    /// Selects `key`, flipping direction when it is already active.
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort.toggle(key);
        self.recompute(PagePolicy::Reset);
    }

    /// Re-evaluates relative date windows against the current time.
    pub fn refresh(&mut self) {
        self.recompute(PagePolicy::Reclamp);
    }

    /// Jumps to a page, clamped into range.
    pub fn go_to_page(&mut self, page: usize) {
        self.paginator.go_to_page(page);
    }

    /// Advances one page.
    pub fn next_page(&mut self) {
        self.paginator.next_page();
    }

    /// Goes back one page.
    pub fn prev_page(&mut self) {
        self.paginator.prev_page();
    }

    /// Changes the page size, keeping the first visible record on screen.
    pub fn change_page_size(&mut self, page_size: usize) -> AppResult<()> {
        self.paginator.change_page_size(page_size)
    }

    /// Returns the filtered and sorted records.
    #[must_use]
    pub fn filtered_records(&self) -> Vec<&SubmissionRecord> {
        self.view.iter().map(|index| &self.records[*index]).collect()
    }

    /// Returns the number of records passing the filter.
    #[must_use]
    pub fn filtered_count(&self) -> usize {
        self.view.len()
    }

    /// Returns the records on the current page.
    #[must_use]
    pub fn page_records(&self) -> Vec<&SubmissionRecord> {
        self.paginator
            .paginate(&self.view)
            .iter()
            .map(|index| &self.records[*index])
            .collect()
    }

    /// Returns the pagination snapshot.
    #[must_use]
    pub fn page_info(&self) -> PageInfo {
        self.paginator.page_info()
    }

    /// Returns the page-number strip.
    #[must_use]
    pub fn visible_pages(&self, max_visible: usize) -> Vec<PageMarker> {
        self.paginator.visible_pages(max_visible)
    }

    /// Toggles selection of one record; unknown ids are ignored.
    ///
    /// Returns whether the record is selected afterwards.
    pub fn toggle_selection(&mut self, submission_id: &str) -> bool {
        if self.selection.remove(submission_id) {
            return false;
        }
        if self.find(submission_id).is_none() {
            return false;
        }
        self.selection.insert(submission_id.to_owned())
    }

    /// Selects every record on the current page.
    pub fn select_page(&mut self) {
        let ids: Vec<String> = self
            .page_records()
            .iter()
            .map(|record| record.id().to_owned())
            .collect();
        self.selection.extend(ids);
    }

    /// Selects every record passing the filter.
    pub fn select_all_filtered(&mut self) {
        let ids: Vec<String> = self
            .filtered_records()
            .iter()
            .map(|record| record.id().to_owned())
            .collect();
        self.selection.extend(ids);
    }

    /// Deselects everything, including hidden selections.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Returns whether a record is selected, visible or not.
    #[must_use]
    pub fn is_selected(&self, submission_id: &str) -> bool {
        self.selection.contains(submission_id)
    }

    /// Returns the selected records inside the filtered view, in view order.
    #[must_use]
    pub fn active_selection(&self) -> Vec<&SubmissionRecord> {
        self.filtered_records()
            .into_iter()
            .filter(|record| self.selection.contains(record.id()))
            .collect()
    }

    /// Returns how many selected records the filter currently hides.
    #[must_use]
    pub fn hidden_selection_count(&self) -> usize {
        self.selection
            .len()
            .saturating_sub(self.active_selection().len())
    }

    /// Returns the records an export should cover: the active selection when
    /// there is one, otherwise the whole filtered view.
    #[must_use]
    pub fn export_scope(&self) -> Vec<&SubmissionRecord> {
        let selected = self.active_selection();
        if selected.is_empty() {
            self.filtered_records()
        } else {
            selected
        }
    }

    /// Summarizes one record with the pipeline's fallback fields.
    #[must_use]
    pub fn summarize(&self, submission_id: &str, max_fields: Option<usize>) -> Option<Vec<String>> {
        self.find(submission_id)
            .map(|record| summarize_record(record, self.fallback(), max_fields))
    }

    /// Aggregates the whole record set, ignoring filters.
    #[must_use]
    pub fn analytics(&self) -> SubmissionAnalytics {
        summarize(&self.records, self.fallback(), self.clock.now())
    }

    fn fallback(&self) -> Option<&[FieldSchema]> {
        (!self.fallback_fields.is_empty()).then_some(self.fallback_fields.as_slice())
    }

    fn recompute(&mut self, policy: PagePolicy) {
        let fallback = (!self.fallback_fields.is_empty()).then_some(self.fallback_fields.as_slice());
        let compiled = CompiledFilter::compile(&self.filter, fallback, self.clock.now());
        let records = &self.records;

        let mut view: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| compiled.matches(record))
            .map(|(index, _)| index)
            .collect();
        sort_with(&mut view, |index| &records[*index], &self.sort, fallback);

        self.view = view;
        self.paginator.set_total(self.view.len());
        if policy == PagePolicy::Reset {
            self.paginator.go_to_page(1);
        }

        debug!(
            total = self.records.len(),
            matched = self.view.len(),
            page = self.paginator.current_page(),
            "submission view recomputed"
        );
    }
}

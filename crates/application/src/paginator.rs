use formvault_core::{AppError, AppResult};
use serde::Serialize;

/// Snapshot of the pagination window for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// One-based current page.
    pub current_page: usize,
    /// Items per page.
    pub page_size: usize,
    /// Total item count across pages.
    pub total_items: usize,
    /// Number of pages; zero when there are no items.
    pub total_pages: usize,
    /// One-based index of the first visible item; zero when empty.
    pub first_item: usize,
    /// One-based index of the last visible item; zero when empty.
    pub last_item: usize,
    /// Whether a previous page exists.
    pub has_previous: bool,
    /// Whether a next page exists.
    pub has_next: bool,
}

/// Entry in a page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "page")]
pub enum PageMarker {
    /// Literal page number.
    Page(usize),
    /// Skipped run of pages.
    Ellipsis,
}

/// Page-window state over a result set of known size.
///
/// `current_page` always points at a page that exists, or at page 1 when
/// there are no items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    current_page: usize,
    page_size: usize,
    max_page_size: usize,
    total_items: usize,
}

impl Paginator {
    /// Creates a paginator on page 1 with no items.
    pub fn new(page_size: usize, max_page_size: usize) -> AppResult<Self> {
        if max_page_size == 0 {
            return Err(AppError::Validation(
                "maximum page size must be greater than zero".to_owned(),
            ));
        }
        validate_page_size(page_size, max_page_size)?;

        Ok(Self {
            current_page: 1,
            page_size,
            max_page_size,
            total_items: 0,
        })
    }

    /// Returns the one-based current page.
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Returns items per page.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the total item count.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.total_items
    }

    /// Returns the number of pages; zero when there are no items.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    /// Updates the item count and pulls the current page back into range.
    pub fn set_total(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.go_to_page(self.current_page);
    }

    /// Jumps to `page`, clamped into `[1, total_pages]`.
    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.total_pages().max(1));
    }

    /// Advances one page, staying on the last page.
    pub fn next_page(&mut self) {
        self.go_to_page(self.current_page.saturating_add(1));
    }

    /// Goes back one page, staying on page 1.
    pub fn prev_page(&mut self) {
        self.go_to_page(self.current_page.saturating_sub(1));
    }

    /// Changes the page size while keeping the first visible item on screen.
    pub fn change_page_size(&mut self, page_size: usize) -> AppResult<()> {
        validate_page_size(page_size, self.max_page_size)?;

        let first_item = self.first_item_index().max(1);
        self.page_size = page_size;
        self.go_to_page(first_item.div_ceil(page_size));
        Ok(())
    }

    /// Returns the current page's window of `items`.
    #[must_use]
    pub fn paginate<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.current_page - 1)
            .saturating_mul(self.page_size)
            .min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }

    /// Returns the pagination snapshot.
    #[must_use]
    pub fn page_info(&self) -> PageInfo {
        let total_pages = self.total_pages();
        let first_item = self.first_item_index();
        let last_item = if first_item == 0 {
            0
        } else {
            (first_item + self.page_size - 1).min(self.total_items)
        };

        PageInfo {
            current_page: self.current_page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages,
            first_item,
            last_item,
            has_previous: self.current_page > 1,
            has_next: self.current_page < total_pages,
        }
    }

    /// Builds a page-number strip of at most `max_visible` page numbers.
    ///
    /// The first and last pages are always shown when the strip is
    /// truncated; the remaining slots form a window centred on the current
    /// page, with an ellipsis marking each skipped run.
    #[must_use]
    pub fn visible_pages(&self, max_visible: usize) -> Vec<PageMarker> {
        let total_pages = self.total_pages();
        if total_pages == 0 {
            return Vec::new();
        }
        if total_pages <= max_visible.max(3) {
            return (1..=total_pages).map(PageMarker::Page).collect();
        }

        let window = max_visible.max(3) - 2;
        let last_start = total_pages - window;
        let start = self
            .current_page
            .saturating_sub(window / 2)
            .clamp(2, last_start);
        let end = start + window - 1;

        let mut markers = vec![PageMarker::Page(1)];
        if start > 2 {
            markers.push(PageMarker::Ellipsis);
        }
        markers.extend((start..=end).map(PageMarker::Page));
        if end < total_pages - 1 {
            markers.push(PageMarker::Ellipsis);
        }
        markers.push(PageMarker::Page(total_pages));
        markers
    }

    fn first_item_index(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            (self.current_page - 1) * self.page_size + 1
        }
    }
}

fn validate_page_size(page_size: usize, max_page_size: usize) -> AppResult<()> {
    if page_size == 0 || page_size > max_page_size {
        return Err(AppError::Validation(format!(
            "page size must be between 1 and {max_page_size}, got {page_size}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{PageMarker, Paginator};

    fn paginator(page_size: usize) -> Paginator {
        Paginator::new(page_size, 1000).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn rejects_invalid_page_sizes() {
        assert!(Paginator::new(0, 100).is_err());
        assert!(Paginator::new(101, 100).is_err());
        assert!(paginator(10).change_page_size(0).is_err());
    }

    #[test]
    fn shrinking_total_reclamps_to_last_page() {
        let mut pages = paginator(10);
        pages.set_total(47);
        pages.go_to_page(5);
        let items: Vec<usize> = (1..=47).collect();
        assert_eq!(pages.paginate(&items), &[41, 42, 43, 44, 45, 46, 47]);

        pages.set_total(12);
        assert_eq!(pages.current_page(), 2);
    }

    #[test]
    fn go_to_page_clamps() {
        let mut pages = paginator(10);
        pages.go_to_page(4);
        assert_eq!(pages.current_page(), 1);

        pages.set_total(35);
        pages.go_to_page(0);
        assert_eq!(pages.current_page(), 1);
        pages.go_to_page(99);
        assert_eq!(pages.current_page(), 4);
        pages.next_page();
        assert_eq!(pages.current_page(), 4);
        pages.prev_page();
        assert_eq!(pages.current_page(), 3);
    }

    #[test]
    fn page_size_change_keeps_first_item_visible() {
        let mut pages = paginator(10);
        pages.set_total(100);
        pages.go_to_page(3);

        pages
            .change_page_size(25)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(pages.current_page(), 1);
        let info = pages.page_info();
        assert!(info.first_item <= 21 && 21 <= info.last_item);
    }

    #[test]
    fn page_info_reports_window() {
        let mut pages = paginator(10);
        pages.set_total(23);
        pages.go_to_page(3);

        let info = pages.page_info();
        assert_eq!(info.first_item, 21);
        assert_eq!(info.last_item, 23);
        assert!(info.has_previous);
        assert!(!info.has_next);

        pages.set_total(0);
        let empty = pages.page_info();
        assert_eq!((empty.current_page, empty.first_item, empty.last_item), (1, 0, 0));
    }

    #[test]
    fn visible_pages_centres_on_current_page() {
        let mut pages = paginator(1);
        pages.set_total(20);
        pages.go_to_page(10);

        assert_eq!(
            pages.visible_pages(7),
            vec![
                PageMarker::Page(1),
                PageMarker::Ellipsis,
                PageMarker::Page(8),
                PageMarker::Page(9),
                PageMarker::Page(10),
                PageMarker::Page(11),
                PageMarker::Page(12),
                PageMarker::Ellipsis,
                PageMarker::Page(20),
            ]
        );
    }

    #[test]
    fn visible_pages_near_edges_and_small_totals() {
        let mut pages = paginator(1);
        pages.set_total(5);
        assert_eq!(pages.visible_pages(7).len(), 5);

        pages.set_total(20);
        pages.go_to_page(1);
        assert_eq!(
            pages.visible_pages(7),
            vec![
                PageMarker::Page(1),
                PageMarker::Page(2),
                PageMarker::Page(3),
                PageMarker::Page(4),
                PageMarker::Page(5),
                PageMarker::Page(6),
                PageMarker::Ellipsis,
                PageMarker::Page(20),
            ]
        );

        pages.go_to_page(20);
        assert_eq!(pages.visible_pages(7)[1], PageMarker::Ellipsis);
        assert_eq!(pages.visible_pages(7)[2], PageMarker::Page(15));

        pages.set_total(0);
        assert!(pages.visible_pages(7).is_empty());
    }

    proptest! {
        #[test]
        fn current_page_never_empty_while_items_exist(
            page_size in 1_usize..50,
            totals in prop::collection::vec(0_usize..500, 1..10),
            target in 1_usize..60,
        ) {
            let mut pages = paginator(page_size);
            for total in totals {
                pages.set_total(total);
                pages.go_to_page(target);
                let items: Vec<usize> = (0..total).collect();
                prop_assert!(pages.current_page() >= 1);
                if total > 0 {
                    prop_assert!(!pages.paginate(&items).is_empty());
                }
            }
        }

        #[test]
        fn page_size_change_keeps_first_item(
            total in 1_usize..1000,
            old_size in 1_usize..100,
            new_size in 1_usize..100,
            page in 1_usize..100,
        ) {
            let mut pages = paginator(old_size);
            pages.set_total(total);
            pages.go_to_page(page);
            let first = pages.page_info().first_item;

            pages.change_page_size(new_size).unwrap_or_else(|_| unreachable!());
            let info = pages.page_info();
            prop_assert!(info.first_item <= first && first <= info.last_item);
        }
    }
}

//! Page-number pagination with the lenient lookup feeds use: a missing or
//! garbled page number means the first page, an out-of-range one means the
//! last page, and an empty sequence still has one (empty) page.

use serde::Serialize;

/// Position of one page within a sequence of `total_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub page_size: u64,
}

impl PageWindow {
    /// `requested` is the raw `page` query value.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    pub fn new(total_items: u64, page_size: u64, requested: Option<&str>) -> Self {
        assert!(page_size > 0, "page size must be positive");

        let total_pages = total_items.div_ceil(page_size).max(1);
        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n >= 1 && (n as u64) <= total_pages => n as u64,
            Some(Ok(_)) => total_pages,
        };

        Self {
            number,
            total_pages,
            total_items,
            page_size,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.page_size
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.number > 1
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            page_number: window.number,
            total_pages: window.total_pages,
            total_items: window.total_items,
            has_next: window.has_next(),
            has_prev: window.has_prev(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            total_pages: self.total_pages,
            total_items: self.total_items,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

/// Slices an in-memory sequence into the requested page.
pub fn paginate<T>(items: Vec<T>, page_size: u64, requested: Option<&str>) -> Page<T> {
    let window = PageWindow::new(items.len() as u64, page_size, requested);
    let items = items
        .into_iter()
        .skip(window.offset() as usize)
        .take(window.limit() as usize)
        .collect();
    Page::new(items, window)
}

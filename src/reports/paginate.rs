use serde::Serialize;

/// Page metadata returned alongside every paginated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub total_pages: usize,
}

pub fn total_pages(total_rows: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total_rows.div_ceil(page_size).max(1)
}

/// Clamp a requested 1-based page into `1..=total_pages`. The engine
/// never leaves the page cursor pointing past the end of a shrunken
/// result set.
pub fn clamp_page(page: usize, total_rows: usize, page_size: usize) -> usize {
    page.max(1).min(total_pages(total_rows, page_size))
}

/// 1-based page slice. The caller is expected to clamp first; an
/// out-of-range page still degrades to an empty slice rather than
/// panicking.
pub fn slice<T>(rows: &[T], page: usize, page_size: usize) -> &[T] {
    if page_size == 0 {
        return rows;
    }
    let start = page.max(1).saturating_sub(1).saturating_mul(page_size);
    if start >= rows.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(rows.len());
    &rows[start..end]
}

/// Clamp, slice, and describe in one step.
pub fn paginate<T>(rows: &[T], requested_page: usize, page_size: usize) -> (&[T], PageInfo) {
    let page = clamp_page(requested_page, rows.len(), page_size);
    let info = PageInfo {
        page,
        page_size,
        total_rows: rows.len(),
        total_pages: total_pages(rows.len(), page_size),
    };
    (slice(rows, page, page_size), info)
}

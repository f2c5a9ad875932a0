//! List query value object.

use super::{Order, OrderStatus};

/// Builder for filtered, paginated order listings.
///
/// Pagination is 1-based. A page of 0 is read as the first page and a page
/// size of 0 as [`ListFilter::DEFAULT_PAGE_SIZE`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only return orders in this status.
    pub status: Option<OrderStatus>,

    /// 1-based page number.
    pub page: u32,

    /// Number of orders per page.
    pub page_size: u32,
}

impl ListFilter {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;

    /// Creates a filter matching every order, first page, default size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Selects a 1-based page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// The page number after defaults are applied.
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    /// The page size after defaults are applied.
    pub fn effective_page_size(&self) -> u32 {
        if self.page_size == 0 {
            Self::DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }

    /// Number of matching orders to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.effective_page() - 1) * u64::from(self.effective_page_size())
    }

    /// Maximum number of orders to return.
    pub fn limit(&self) -> u64 {
        u64::from(self.effective_page_size())
    }

    /// Returns true if the order satisfies the status predicate.
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|status| order.status() == status)
    }

    /// Slices an already filtered and ordered sequence to the requested page.
    ///
    /// An out-of-range page yields an empty vector.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_zero_values() {
        let filter = ListFilter::new();
        assert_eq!(filter.effective_page(), 1);
        assert_eq!(filter.effective_page_size(), ListFilter::DEFAULT_PAGE_SIZE);
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn builder_chain() {
        let filter = ListFilter::new()
            .status(OrderStatus::Pending)
            .page(3)
            .page_size(10);

        assert_eq!(filter.status, Some(OrderStatus::Pending));
        assert_eq!(filter.offset(), 20);
        assert_eq!(filter.limit(), 10);
    }

    #[test]
    fn second_page_of_three_items() {
        let filter = ListFilter::new().page(2).page_size(2);
        assert_eq!(filter.paginate(vec![1, 2, 3]), vec![3]);
    }

    #[test]
    fn page_beyond_data_is_empty() {
        let filter = ListFilter::new().page(5).page_size(2);
        assert!(filter.paginate(vec![1, 2, 3]).is_empty());
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let filter = ListFilter::new().page(u32::MAX).page_size(u32::MAX);
        assert!(filter.paginate(vec![1, 2, 3]).is_empty());
    }
}

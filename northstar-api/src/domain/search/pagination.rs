use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Slice an already-sorted result set to the requested page.
///
/// `total` reflects the full filtered set, `totalPages = ceil(total/limit)`,
/// and out-of-range pages yield an empty slice rather than an error.
pub fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> Paginated<T> {
    let total = items.len() as u64;
    let total_pages = total.div_ceil(limit as u64);

    let start = (page as usize).saturating_sub(1).saturating_mul(limit as usize);
    let data = if start >= items.len() {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect()
    };

    Paginated {
        data,
        pagination: PageMeta {
            page,
            limit,
            total,
            total_pages,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_last_page() {
        let page = paginate((0..45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.data[0], 40);
        assert_eq!(page.pagination.total, 45);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn slice_never_exceeds_limit() {
        for total in [0usize, 1, 19, 20, 21, 45, 100] {
            for page in 1..=7u32 {
                let result = paginate((0..total).collect::<Vec<_>>(), page, 20);
                assert!(result.data.len() <= 20);
                assert_eq!(
                    result.pagination.total_pages,
                    (total as u64).div_ceil(20)
                );
            }
        }
    }

    #[test]
    fn out_of_range_page_is_empty_not_an_error() {
        let page = paginate(vec![1, 2, 3], 5, 10);
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 1);
    }

    #[test]
    fn empty_set_has_zero_pages() {
        let page = paginate(Vec::<i32>::new(), 1, 20);
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_pages, 0);
    }
}

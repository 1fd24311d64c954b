use serde::{Deserialize, Serialize};

/// A page of results as returned by the list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: u32,
    pub size: u32,
    pub total: u64,
    #[serde(rename = "pageCount")]
    pub page_count: u32,
    pub content: Vec<T>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Pages are numbered from zero.
    pub fn is_last(&self) -> bool {
        self.page_count == 0 || self.page + 1 >= self.page_count
    }

    pub fn next_page(&self) -> Option<u32> {
        if self.is_last() {
            None
        } else {
            Some(self.page + 1)
        }
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }
}

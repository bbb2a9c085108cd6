//! Query values shared by the trigger and fetch stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// Sort direction accepted by the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(SearchError::InvalidQuery(format!(
                "unknown sort direction '{}', expected 'asc' or 'desc'",
                s
            ))),
        }
    }
}

/// Active sort column and direction.
///
/// An empty key means the API's default relevance order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    pub fn is_relevance(&self) -> bool {
        self.key.trim().is_empty()
    }
}

/// Zero-based page position and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    index: u32,
    size: u32,
}

impl PageRequest {
    pub fn new(index: u32, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(SearchError::InvalidQuery(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { index, size })
    }

    pub fn first(size: u32) -> Result<Self> {
        Self::new(0, size)
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Same page size, first page.
    pub fn rewind(self) -> Self {
        Self { index: 0, ..self }
    }
}

/// Immutable description of one fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    text: String,
    sort: SortSpec,
    page: PageRequest,
}

impl QuerySpec {
    pub fn new(text: impl Into<String>, sort: SortSpec, page: PageRequest) -> Self {
        Self {
            text: text.into(),
            sort,
            page,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn sort_key(&self) -> &str {
        &self.sort.key
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort.direction
    }

    pub fn page_index(&self) -> u32 {
        self.page.index
    }

    pub fn page_size(&self) -> u32 {
        self.page.size
    }

    /// 1-based page number sent to the search API.
    pub fn search_page_number(&self) -> u32 {
        self.page.index.saturating_add(1)
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "q={:?} sort={}:{} page={} per_page={}",
            self.text,
            self.sort.key,
            self.sort.direction,
            self.search_page_number(),
            self.page.size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_from_str() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_page_request_rejects_zero_size() {
        assert!(PageRequest::new(3, 0).is_err());
        assert!(PageRequest::first(0).is_err());
        assert_eq!(PageRequest::new(3, 10).unwrap().index(), 3);
    }

    #[test]
    fn test_rewind_keeps_page_size() {
        let page = PageRequest::new(7, 50).unwrap().rewind();
        assert_eq!(page.index(), 0);
        assert_eq!(page.size(), 50);
    }

    #[test]
    fn test_search_page_number_is_one_based() {
        let spec = QuerySpec::new(
            "octo",
            SortSpec::new("followers", SortDirection::Asc),
            PageRequest::new(4, 25).unwrap(),
        );
        assert_eq!(spec.page_index(), 4);
        assert_eq!(spec.search_page_number(), 5);
        assert_eq!(spec.page_size(), 25);
    }

    #[test]
    fn test_sort_spec_relevance() {
        assert!(SortSpec::default().is_relevance());
        assert!(SortSpec::new("  ", SortDirection::Asc).is_relevance());
        assert!(!SortSpec::new("followers", SortDirection::Asc).is_relevance());
    }

    #[test]
    fn test_query_spec_display() {
        let spec = QuerySpec::new(
            "octo",
            SortSpec::new("repositories", SortDirection::Desc),
            PageRequest::new(0, 30).unwrap(),
        );
        assert_eq!(
            spec.to_string(),
            "q=\"octo\" sort=repositories:desc page=1 per_page=30"
        );
    }
}

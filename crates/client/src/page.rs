//! Directory listing pages.

use serde::{Deserialize, Serialize};

use crate::api::Api;
use crate::types::Entry;
use crate::ClientError;

/// Default number of entries per listing page.
pub const DEFAULT_PER_PAGE: u32 = 200;

/// Position of a page within a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub current: u64,
    /// Number of the last page.
    #[serde(rename = "final", default)]
    pub last: u64,
}

/// One page of a directory listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirPage {
    #[serde(default)]
    pub files: Vec<Entry>,
    /// Total number of entries in the directory.
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub page: PageInfo,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub dir_path: String,
}

impl DirPage {
    pub fn has_next(&self) -> bool {
        self.next.as_deref().is_some_and(|u| !u.is_empty())
    }

    pub fn has_previous(&self) -> bool {
        self.previous.as_deref().is_some_and(|u| !u.is_empty())
    }

    pub fn next_page_number(&self) -> Option<u64> {
        (self.has_next() && self.page.current > 0).then(|| self.page.current + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        (self.has_previous() && self.page.current > 1).then(|| self.page.current - 1)
    }

    /// Fetches the following page, if any.
    pub async fn next_page(&self, api: &Api) -> Result<Option<DirPage>, ClientError> {
        match self.next.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => api.list_dir_by_url(url).await.map(Some),
            None => Ok(None),
        }
    }

    /// Fetches the preceding page, if any.
    pub async fn previous_page(&self, api: &Api) -> Result<Option<DirPage>, ClientError> {
        match self.previous.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => api.list_dir_by_url(url).await.map(Some),
            None => Ok(None),
        }
    }

    /// Object entries of this page; directories are left out.
    pub fn objects(&self) -> impl Iterator<Item = &Entry> {
        self.files.iter().filter(|e| e.is_object())
    }

    /// `(name, full path)` of every object on this page.
    pub fn object_paths(&self) -> Vec<(String, String)> {
        self.objects()
            .map(|e| {
                let path = format!("{}/{}", self.dir_path, e.name)
                    .trim_start_matches('/')
                    .to_string();
                (e.name.clone(), path)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "code": 200,
        "bucket_name": "photos",
        "dir_path": "2024/trip",
        "files": [
            {"name": "sub", "fod": false},
            {"name": "a.jpg", "fod": true, "si": 12},
            {"name": "b.jpg", "fod": true, "si": 34}
        ],
        "count": 7,
        "page": {"current": 1, "final": 3},
        "next": "http://h/api/v1/dir/photos/2024/trip/?offset=3&limit=3",
        "previous": null
    }"#;

    #[test]
    fn parses_listing_page() {
        let page: DirPage = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.count, 7);
        assert_eq!(page.page, PageInfo { current: 1, last: 3 });
        assert_eq!(page.files.len(), 3);
        assert!(page.has_next());
        assert!(!page.has_previous());
        assert_eq!(page.next_page_number(), Some(2));
        assert_eq!(page.previous_page_number(), None);
    }

    #[test]
    fn objects_skip_directories() {
        let page: DirPage = serde_json::from_str(PAGE).unwrap();
        let names: Vec<_> = page.objects().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.jpg", "b.jpg"]);
        assert_eq!(
            page.object_paths(),
            vec![
                ("a.jpg".to_string(), "2024/trip/a.jpg".to_string()),
                ("b.jpg".to_string(), "2024/trip/b.jpg".to_string()),
            ]
        );
    }

    #[test]
    fn root_listing_paths_have_no_leading_slash() {
        let page: DirPage =
            serde_json::from_str(r#"{"dir_path": "", "files": [{"name": "x", "fod": true}]}"#)
                .unwrap();
        assert_eq!(page.object_paths(), vec![("x".to_string(), "x".to_string())]);
        assert!(!page.has_next());
    }
}

//! Developer-portal download catalog models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Catalog partition on the developer portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    /// Operating-system images (iOS, macOS, tvOS, ...)
    Os,
    /// Everything else (Xcode, KDKs, tools, ...)
    More,
}

impl DownloadKind {
    pub const ALL: [DownloadKind; 2] = [DownloadKind::Os, DownloadKind::More];

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadKind::Os => "os",
            DownloadKind::More => "more",
        }
    }

    /// File name used when a listing is written to an output directory
    pub fn json_file_name(&self) -> String {
        format!("dev_portal_{}.json", self.as_str())
    }
}

impl fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "os" => Ok(DownloadKind::Os),
            "more" => Ok(DownloadKind::More),
            other => Err(Error::Config(format!(
                "Unknown download kind: {}. Valid kinds: os, more",
                other
            ))),
        }
    }
}

/// One downloadable entry in a portal catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    /// Portal-assigned identifier, stable across polls
    pub id: String,
    /// Display title, e.g. "iOS 17 beta 3"
    pub title: String,
    /// Partition this item was listed under
    pub kind: DownloadKind,
    /// Portal category (e.g. "Developer Tools")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Date posted, as reported by the portal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Concrete file URL
    pub url: String,
    /// Size in bytes, when advertised
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl DownloadItem {
    /// File name component of the item URL
    pub fn file_name(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(self.id.as_str())
    }

    /// Case-insensitive match against title or category
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self
                .category
                .as_deref()
                .map(|c| c.to_lowercase().contains(&term))
                .unwrap_or(false)
    }
}

/// Sort a catalog snapshot into its canonical display order
///
/// Items are ordered by title, then id, so the same snapshot always renders
/// (and resolves selections) identically.
pub fn sort_download_items(items: &mut [DownloadItem]) {
    items.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, title: &str) -> DownloadItem {
        DownloadItem {
            id: id.to_string(),
            title: title.to_string(),
            kind: DownloadKind::More,
            category: Some("Developer Tools".to_string()),
            release_date: None,
            url: format!("https://download.example.com/{}/Xcode_15.xip?x=1", id),
            size: None,
        }
    }

    #[test]
    fn test_kind_parse_and_file_name() {
        assert_eq!("OS".parse::<DownloadKind>().unwrap(), DownloadKind::Os);
        assert_eq!("more".parse::<DownloadKind>().unwrap(), DownloadKind::More);
        assert!("apps".parse::<DownloadKind>().is_err());
        assert_eq!(DownloadKind::Os.json_file_name(), "dev_portal_os.json");
        assert_eq!(DownloadKind::More.json_file_name(), "dev_portal_more.json");
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&DownloadKind::More).unwrap(), "\"more\"");
    }

    #[test]
    fn test_file_name_strips_query() {
        assert_eq!(item("1", "Xcode 15").file_name(), "Xcode_15.xip");
    }

    #[test]
    fn test_matches_term() {
        let it = item("1", "Xcode 15 beta");
        assert!(it.matches_term("xcode"));
        assert!(it.matches_term("developer"));
        assert!(!it.matches_term("macos"));
    }

    #[test]
    fn test_sort_is_stable_by_title_then_id() {
        let mut items = vec![item("b", "Xcode"), item("z", "KDK"), item("a", "Xcode")];
        sort_download_items(&mut items);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "b"]);
    }
}

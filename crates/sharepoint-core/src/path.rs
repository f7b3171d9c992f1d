//! Virtual path to drive-item address translation.
//!
//! Callers speak in virtual paths such as `/Reports/2024 Q1.xlsx`. Graph
//! addresses items relative to the drive root with a colon syntax:
//!
//! | Virtual path | Suffix | Address |
//! |---|---|---|
//! | `/` | `children` | `root/children` |
//! | `/` | (none) | `root` |
//! | `/a b/c.txt` | `content` | `root:/a%20b/c.txt:/content` |
//! | `/a b/c.txt` | (none) | `root:/a%20b/c.txt` |

use std::borrow::Cow;

use crate::error::{Error, Result};

const SEPARATOR: char = '/';

/// What the address should point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    /// The item itself (metadata, existence, delete).
    Item,
    /// The item's children (listing, folder creation).
    Children,
    /// The item's raw content (download, upload).
    Content,
}

impl Suffix {
    fn as_str(self) -> &'static str {
        match self {
            Self::Item => "",
            Self::Children => "children",
            Self::Content => "content",
        }
    }
}

/// Collapses a virtual path to its segments joined by `/`, without leading
/// or trailing separators. The root becomes the empty string.
pub fn normalize(path: &str) -> String {
    segments(path).collect::<Vec<_>>().join("/")
}

/// Returns `true` if `path` denotes the drive root.
pub fn is_root(path: &str) -> bool {
    segments(path).next().is_none()
}

/// The canonical virtual path reported back to callers (`/` + normalized).
pub fn virtual_path(path: &str) -> String {
    format!("{SEPARATOR}{}", normalize(path))
}

/// Percent-encodes every segment, keeping `/` as the separator.
pub fn encode(path: &str) -> String {
    segments(path)
        .map(urlencoding::encode)
        .collect::<Vec<Cow<'_, str>>>()
        .join("/")
}

/// Builds the drive-relative address of `path` (without the leading
/// `drives/{id}/`).
pub fn item_address(path: &str, suffix: Suffix) -> String {
    match (is_root(path), suffix) {
        (true, Suffix::Item) => "root".to_string(),
        (true, suffix) => format!("root/{}", suffix.as_str()),
        (false, Suffix::Item) => format!("root:/{}", encode(path)),
        (false, suffix) => format!("root:/{}:/{}", encode(path), suffix.as_str()),
    }
}

/// Address of a file's content. The root is never a file.
///
/// # Errors
///
/// Returns [`Error::Validation`] when `path` is the root.
pub fn content_address(path: &str) -> Result<String> {
    if is_root(path) {
        return Err(Error::Validation(format!(
            "'{path}' refers to the drive root, not a file"
        )));
    }
    Ok(item_address(path, Suffix::Content))
}

/// Splits a path into its parent folder and leaf name.
///
/// `"/docs/new"` yields `("docs", "new")`; `"/new"` yields `("", "new")`.
/// The root has an empty leaf.
pub fn split_parent(path: &str) -> (String, String) {
    let normalized = normalize(path);
    match normalized.rsplit_once(SEPARATOR) {
        Some((parent, leaf)) => (parent.to_string(), leaf.to_string()),
        None => (String::new(), normalized),
    }
}

/// Virtual path of `name` inside `folder`.
pub fn child_path(folder: &str, name: &str) -> String {
    let folder = normalize(folder);
    if folder.is_empty() {
        format!("{SEPARATOR}{name}")
    } else {
        format!("{SEPARATOR}{folder}{SEPARATOR}{name}")
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|segment| !segment.is_empty())
}

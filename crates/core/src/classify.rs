//! Request classification by URL path.
//!
//! Rules are tested in a fixed order and the first match wins, so a path like
//! `/media/covers/42.jpg` is an image, not a cover:
//!
//! 1. static asset suffix (`css`, `js`, `svg`, fonts)
//! 2. raster image suffix
//! 3. `/media/covers/` prefix
//! 4. `/media/books/` prefix
//! 5. dynamic segment (`/book`, `/search`, `/last-read`)

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static STATIC_ASSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(css|js|svg|woff2?|ttf|eot)$").expect("static asset pattern"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(png|jpg|jpeg|gif|webp|ico)$").expect("image pattern"));
static COVER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/media/covers/").expect("cover pattern"));
static BOOK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/media/books/").expect("book pattern"));
static DYNAMIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(book|search|last-read)").expect("dynamic pattern"));

/// Category of an intercepted request, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Static,
    Image,
    Cover,
    Book,
    Dynamic,
    Uncategorized,
}

/// Caching strategy applied to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    NetworkFirstWithOffline,
}

/// Classify a URL path.
pub fn classify(path: &str) -> Category {
    if STATIC_ASSET.is_match(path) {
        Category::Static
    } else if IMAGE.is_match(path) {
        Category::Image
    } else if COVER.is_match(path) {
        Category::Cover
    } else if BOOK.is_match(path) {
        Category::Book
    } else if DYNAMIC.is_match(path) {
        Category::Dynamic
    } else {
        Category::Uncategorized
    }
}

impl Category {
    /// Strategy for this category. Uncategorized HTML navigations get the
    /// offline page fallback; everything else not cache-first is network-first.
    pub fn strategy(self, accepts_html: bool) -> Strategy {
        match self {
            Category::Static | Category::Image | Category::Cover | Category::Book => Strategy::CacheFirst,
            Category::Dynamic => Strategy::NetworkFirst,
            Category::Uncategorized if accepts_html => Strategy::NetworkFirstWithOffline,
            Category::Uncategorized => Strategy::NetworkFirst,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Static => "static",
            Category::Image => "image",
            Category::Cover => "cover",
            Category::Book => "book",
            Category::Dynamic => "dynamic",
            Category::Uncategorized => "uncategorized",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::NetworkFirstWithOffline => "network-first-with-offline",
        };
        f.write_str(name)
    }
}

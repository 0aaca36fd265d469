use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of revision characters kept in an image tag.
pub const SHORT_REVISION_LEN: usize = 7;

/// A container image reference addressed by application and revision.
///
/// The tag depends only on `(application id, revision prefix)`, never on the
/// build id, so two builds of the same revision resolve to the same image.
///
/// # Examples
///
/// ```
/// use dockyard_core::ImageTag;
///
/// let tag = ImageTag::for_revision("app123", "abc1234567");
/// assert_eq!(tag.to_string(), "app123:abc1234");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageTag {
    pub repository: String,
    pub tag: String,
}

impl ImageTag {
    pub fn for_revision(application_id: &str, revision: &str) -> Self {
        Self {
            repository: application_id.to_owned(),
            tag: short_revision(revision).to_owned(),
        }
    }
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// The first [`SHORT_REVISION_LEN`] characters of a revision, case preserved.
/// Shorter revisions are returned whole.
pub fn short_revision(revision: &str) -> &str {
    match revision.char_indices().nth(SHORT_REVISION_LEN) {
        Some((idx, _)) => &revision[..idx],
        None => revision,
    }
}

//! Application-wide constants

/// Items per page on every API collection.
pub const PAGE_SIZE: u64 = 10;

/// Display length of a website URL before it is cut and suffixed with `...`.
pub const SHORT_URL_LENGTH: usize = 54;

/// Suffix appended to a shortened URL.
pub const SHORT_URL_ELLIPSIS: &str = "...";

/// Maximum number of tags kept from a theme form.
pub const MAX_TAGS_PER_THEME: usize = 10;

/// Maximum length of a single tag name.
pub const MAX_TAG_LENGTH: usize = 50;

/// Role granted to every registered account.
pub const ROLE_USER: &str = "ROLE_USER";

/// Slug used when a title has no ASCII letters or digits left.
pub const FALLBACK_SLUG: &str = "theme";

/// Path segments under `/themes/` that routes claim before slug lookup.
pub const RESERVED_SLUGS: &[&str] = &["new"];

pub mod archive;
pub mod error;
pub mod fetcher;
pub mod links;
pub mod sanitize;
pub mod search;
pub mod text_extract;

pub use archive::{Archive, ArchiveConfig};
pub use error::{ArchiveError, Result};
pub use links::search_result_links;
pub use sanitize::strip_expired_markup;
pub use search::SearchResult;
pub use text_extract::visible_text;

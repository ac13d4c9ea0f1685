pub mod models;
pub mod record;
pub mod search;
pub mod traits;

pub use models::{SearchPage, SearchRequest, Variant, VideoRecord};
pub use record::{DurationFilter, RecordExtractor, ResolutionPolicy};
pub use search::SearchClient;
pub use traits::SearchApi;

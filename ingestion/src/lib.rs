pub mod bulk;
pub mod preprocess;

pub use bulk::{read_bulk_request, read_bulk_response, write_bulk_response, BulkError, BulkRow};
pub use preprocess::preprocess_text;

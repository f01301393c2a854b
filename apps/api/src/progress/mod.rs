// Reporting path: read all rows (cached), coerce, aggregate.
// Read failures surface as an empty table, never as an error.

pub mod cache;
pub mod handlers;
pub mod reporter;
pub mod summary;

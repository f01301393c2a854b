// Logging path: free text -> extraction -> set records -> one batch append.
// All model calls go through llm_client; all writes go through log_store.

pub mod handlers;
pub mod normalize;
pub mod parser;
pub mod prompts;
pub mod recorder;

// Term Sheet documents
// Implements: render orchestration, PDF storage, and the HTTP handlers around them.

pub mod handlers;
pub mod pipeline;
pub mod store;

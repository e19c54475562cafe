// Template Fill Engine
// Implements: placeholder substitution, logo resolution, fallbacks, adaptive label sizing.
// Pure string work apart from the logo fetch, which goes through crate::fetch.

pub mod engine;
pub mod fields;
pub mod logo;
pub mod placeholder;
pub mod schema;
pub mod sizing;

pub use engine::{FillOptions, FillReport, FilledDocument, TemplateEngine};
pub use fields::FieldMapping;
pub use logo::{LogoMode, LogoResolver};
pub use schema::FieldSchema;

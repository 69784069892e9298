//! Dashboard state and the components that mutate it.
//!
//! DESIGN
//! ======
//! State is split by concern: `sections` is the registry every other module
//! projects through, `loader`, `search`, `form` and `paginator` drive the
//! remote operations, and `schema`/`validate` hold the field model.

pub mod form;
pub mod loader;
pub mod paginator;
pub mod schema;
pub mod search;
pub mod sections;
pub mod validate;

pub mod models;
pub mod rewrite;

pub mod prelude {
    pub use super::models::create_model;
    pub use super::rewrite::RewriteEngine;
    pub use rb_core::{CompletionModel, Error, Result, RewriteResult};
}

pub use models::create_model;
pub use rewrite::RewriteEngine;

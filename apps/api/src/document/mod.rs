//! Document model, content segmentation, and assembly into renderable HTML.

pub mod assemble;
pub mod html;
pub mod markdown;
pub mod model;
pub mod segment;

pub use assemble::{assemble, AssemblyError};
pub use html::render_html;
pub use model::DocumentModel;

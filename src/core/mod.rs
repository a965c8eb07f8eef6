// Core Layer
pub mod resolver;

pub use resolver::SelectionResolver;

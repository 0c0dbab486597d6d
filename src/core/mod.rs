pub mod archive;
pub mod extract;
pub mod pipeline;
pub mod prompt;
pub mod tryon;

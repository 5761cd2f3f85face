//! CLI command handlers. Each command is in its own file for clarity.

mod archive;
mod info;
mod render;

pub use archive::run_archive;
pub use info::run_info;
pub use render::run_render;

//! Command implementations for OxiIO CLI.

pub mod cat;
pub mod convert;
pub mod info;
pub mod lines;

pub use cat::{CatOptions, cmd_cat};
pub use convert::{ConvertOptions, cmd_convert};
pub use info::cmd_info;
pub use lines::{LinesOptions, cmd_lines};

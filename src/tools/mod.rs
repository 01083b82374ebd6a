//! Tool surface
//!
//! [`Toolbox`] binds every operation to one project root and renders results
//! as text; [`ToolRegistry`] dispatches named tools from JSON parameters.

pub mod format;
pub mod registry;
pub mod toolbox;

pub use format::{render, render_error, ERROR_PREFIX};
pub use registry::{Tool, ToolInput, ToolRegistry};
pub use toolbox::{
    ListDirParams, Patterns, ReplaceParams, RunCommandParams, SearchTextParams, ShellHandle,
    Toolbox, ViewFileParams, WalkTreeParams,
};

//! Named tools dispatched from JSON parameters

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::format::render_error;
use super::toolbox::{
    ListDirParams, ReplaceParams, RunCommandParams, SearchTextParams, Toolbox, ViewFileParams,
    WalkTreeParams,
};
use crate::error::{Error, Result};

/// Parameters handed to a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInput {
    params: Value,
}

impl ToolInput {
    /// Wrap raw parameters; `null` is treated as an empty object
    pub fn new(params: Value) -> Self {
        let params = match params {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        Self { params }
    }

    /// Fill `key` with `value` when the caller did not supply it
    pub fn with_default(mut self, key: &str, value: Value) -> Self {
        if let Value::Object(map) = &mut self.params {
            map.entry(key.to_string()).or_insert(value);
        }
        self
    }

    /// Deserialize into the tool's parameter struct
    pub fn parse<T: DeserializeOwned>(&self, tool: &str) -> Result<T> {
        serde_json::from_value(self.params.clone()).map_err(|e| Error::InvalidParameters {
            tool: tool.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn params(&self) -> &Value {
        &self.params
    }
}

/// A named operation that always answers with text
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Run the tool; failures are rendered as `Error: ...`
    async fn execute(&self, input: ToolInput) -> String;
}

/// Parse parameters and run a synchronous toolbox operation
fn run_sync<T: DeserializeOwned>(
    tool: &str,
    input: &ToolInput,
    op: impl FnOnce(T) -> String,
) -> String {
    match input.parse::<T>(tool) {
        Ok(params) => op(params),
        Err(e) => render_error(&e),
    }
}

pub struct BashTool {
    toolbox: Arc<Toolbox>,
}

impl BashTool {
    pub fn new(toolbox: Arc<Toolbox>) -> Self {
        Self { toolbox }
    }
}

#[async_trait::async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Run a command in a persistent bash session rooted at the project directory"
    }

    async fn execute(&self, input: ToolInput) -> String {
        match input.parse::<RunCommandParams>(self.name()) {
            Ok(params) => self.toolbox.run_command(params).await,
            Err(e) => render_error(&e),
        }
    }
}

pub struct GrepTool {
    toolbox: Arc<Toolbox>,
}

impl GrepTool {
    pub fn new(toolbox: Arc<Toolbox>) -> Self {
        Self { toolbox }
    }
}

#[async_trait::async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search file contents by substring or regex, optionally filtered by glob"
    }

    async fn execute(&self, input: ToolInput) -> String {
        let cap = self.toolbox.search_config().default_max_matches;
        let input = input.with_default("max_matches", Value::from(cap));
        run_sync(self.name(), &input, |params: SearchTextParams| {
            self.toolbox.search_text(params)
        })
    }
}

pub struct LsTool {
    toolbox: Arc<Toolbox>,
}

impl LsTool {
    pub fn new(toolbox: Arc<Toolbox>) -> Self {
        Self { toolbox }
    }
}

#[async_trait::async_trait]
impl Tool for LsTool {
    fn name(&self) -> &str {
        "ls"
    }

    fn description(&self) -> &str {
        "List the immediate children of a directory"
    }

    async fn execute(&self, input: ToolInput) -> String {
        run_sync(self.name(), &input, |params: ListDirParams| {
            self.toolbox.list_dir(params)
        })
    }
}

pub struct TreeTool {
    toolbox: Arc<Toolbox>,
}

impl TreeTool {
    pub fn new(toolbox: Arc<Toolbox>) -> Self {
        Self { toolbox }
    }
}

#[async_trait::async_trait]
impl Tool for TreeTool {
    fn name(&self) -> &str {
        "tree"
    }

    fn description(&self) -> &str {
        "Show a directory tree up to three levels deep"
    }

    async fn execute(&self, input: ToolInput) -> String {
        run_sync(self.name(), &input, |params: WalkTreeParams| {
            self.toolbox.walk_tree(params)
        })
    }
}

pub struct TextViewTool {
    toolbox: Arc<Toolbox>,
}

impl TextViewTool {
    pub fn new(toolbox: Arc<Toolbox>) -> Self {
        Self { toolbox }
    }
}

#[async_trait::async_trait]
impl Tool for TextViewTool {
    fn name(&self) -> &str {
        "text_view"
    }

    fn description(&self) -> &str {
        "View a text file inside the project root, optionally by line range"
    }

    async fn execute(&self, input: ToolInput) -> String {
        run_sync(self.name(), &input, |params: ViewFileParams| {
            self.toolbox.view_file(params)
        })
    }
}

/// Exact-match replacement, registered under several names
pub struct StrReplaceEditTool {
    name: &'static str,
    toolbox: Arc<Toolbox>,
}

impl StrReplaceEditTool {
    /// Names the replacement tool answers to
    pub const NAMES: [&'static str; 3] = [
        "str_replace_edit",
        "str_replace_editor",
        "str_replace_based_edit_tool",
    ];

    pub fn new(name: &'static str, toolbox: Arc<Toolbox>) -> Self {
        Self { name, toolbox }
    }
}

#[async_trait::async_trait]
impl Tool for StrReplaceEditTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Replace one exact occurrence of a string in a file inside the project root"
    }

    async fn execute(&self, input: ToolInput) -> String {
        run_sync(self.name, &input, |params: ReplaceParams| {
            self.toolbox.replace_in_file(params)
        })
    }
}

/// Tools by name
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool bound to `toolbox`
    pub fn with_defaults(toolbox: Arc<Toolbox>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BashTool::new(Arc::clone(&toolbox))));
        registry.register(Arc::new(GrepTool::new(Arc::clone(&toolbox))));
        registry.register(Arc::new(LsTool::new(Arc::clone(&toolbox))));
        registry.register(Arc::new(TreeTool::new(Arc::clone(&toolbox))));
        registry.register(Arc::new(TextViewTool::new(Arc::clone(&toolbox))));
        for name in StrReplaceEditTool::NAMES {
            registry.register(Arc::new(StrReplaceEditTool::new(name, Arc::clone(&toolbox))));
        }
        registry
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if self.tools.insert(tool.name().to_string(), Arc::clone(&tool)).is_some() {
            warn!("Tool '{}' was registered twice; keeping the latest", tool.name());
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Run the tool called `name` with JSON parameters
    pub async fn dispatch(&self, name: &str, params: Value) -> String {
        let Some(tool) = self.get(name) else {
            return render_error(&Error::UnknownTool {
                name: name.to_string(),
            });
        };
        debug!("Dispatching tool '{}'", name);
        tool.execute(ToolInput::new(params)).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

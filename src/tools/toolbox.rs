//! Tool facade
//!
//! [`Toolbox`] exposes every operation with typed parameters and renders
//! results as text. Failures become strings starting with `Error: `; the
//! structured [`Error`] never crosses this boundary.

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use super::format::{
    format_command_output, format_entries, format_matches, format_tree, render, render_error,
};
use crate::config::{Config, EditorConfig, SearchConfig, ShellConfig};
use crate::editor::{replace_in_file, view_file, Sandbox, ViewRange};
use crate::error::{Error, Result};
use crate::fs::{list_dir, search_text, walk_tree, ListOptions, SearchOptions, TreeOptions};
use crate::safety::{check_command, CommandVerdict};
use crate::shell::{CommandOutput, SessionInfo, ShellSession};

/// One pattern or a list of patterns
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Patterns::One(pattern) => vec![pattern],
            Patterns::Many(patterns) => patterns,
        }
    }
}

fn into_pattern_list(patterns: Option<Patterns>) -> Vec<String> {
    patterns.map(Patterns::into_vec).unwrap_or_default()
}

fn default_dot() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> i64 {
    3
}

fn default_max_matches() -> Option<i64> {
    Some(SearchConfig::default().default_max_matches as i64)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunCommandParams {
    pub command: String,
    /// Return to the project root before running
    #[serde(default)]
    pub reset_cwd: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchTextParams {
    #[serde(default = "default_dot")]
    pub root: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub glob: Option<Patterns>,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    #[serde(default)]
    pub use_regex: bool,
    #[serde(default)]
    pub include_binary: bool,
    /// `null` means unlimited
    #[serde(default = "default_max_matches")]
    pub max_matches: Option<i64>,
}

impl Default for SearchTextParams {
    fn default() -> Self {
        Self {
            root: default_dot(),
            query: String::new(),
            glob: None,
            case_sensitive: true,
            use_regex: false,
            include_binary: false,
            max_matches: default_max_matches(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListDirParams {
    #[serde(default = "default_dot")]
    pub directory: String,
    #[serde(default)]
    pub patterns: Option<Patterns>,
    #[serde(default = "default_true")]
    pub include_files: bool,
    #[serde(default = "default_true")]
    pub include_dirs: bool,
    #[serde(default)]
    pub absolute_paths: bool,
}

impl Default for ListDirParams {
    fn default() -> Self {
        Self {
            directory: default_dot(),
            patterns: None,
            include_files: true,
            include_dirs: true,
            absolute_paths: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalkTreeParams {
    #[serde(default = "default_dot")]
    pub root: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,
    #[serde(default)]
    pub patterns: Option<Patterns>,
    #[serde(default = "default_true")]
    pub include_files: bool,
    #[serde(default = "default_true")]
    pub include_dirs: bool,
    #[serde(default)]
    pub absolute_paths: bool,
}

impl Default for WalkTreeParams {
    fn default() -> Self {
        Self {
            root: default_dot(),
            max_depth: default_max_depth(),
            patterns: None,
            include_files: true,
            include_dirs: true,
            absolute_paths: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewFileParams {
    pub file_path: String,
    #[serde(default)]
    pub start_line: Option<i64>,
    #[serde(default)]
    pub end_line: Option<i64>,
    #[serde(default)]
    pub max_characters: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplaceParams {
    pub file_path: String,
    pub old_str: String,
    pub new_str: String,
    #[serde(default)]
    pub occurrence_index: i64,
}

/// Lazily started, self-healing access to the persistent shell
///
/// Requests are serialized through an async mutex. A session that has
/// exited, timed out or lost framing is replaced on the next request.
#[derive(Debug)]
pub struct ShellHandle {
    config: ShellConfig,
    root: PathBuf,
    session: Mutex<Option<ShellSession>>,
}

impl ShellHandle {
    pub fn new(config: ShellConfig, root: PathBuf) -> Self {
        Self {
            config,
            root,
            session: Mutex::new(None),
        }
    }

    /// Lock the session, starting a fresh shell if there is no live one
    pub async fn session(&self) -> Result<MappedMutexGuard<'_, ShellSession>> {
        let mut slot = self.session.lock().await;

        let alive = slot.as_mut().is_some_and(|session| session.is_alive());
        if !alive {
            if slot.take().is_some() {
                info!("Previous shell session is gone, starting a new one");
            }
            *slot = Some(ShellSession::start(&self.config, Some(&self.root)).await?);
        }

        MutexGuard::try_map(slot, |slot| slot.as_mut()).map_err(|_| Error::SessionClosed)
    }

    /// Run a caller-supplied command, optionally from the project root
    pub async fn run(&self, command: &str, reset_cwd: bool) -> Result<CommandOutput> {
        let mut session = self.session().await?;
        if reset_cwd {
            session.change_dir(&self.root).await?;
        }
        session.run(command).await
    }

    /// Metadata of the current session, if one is running
    pub async fn info(&self) -> Option<SessionInfo> {
        self.session.lock().await.as_ref().map(ShellSession::info)
    }

    /// Close the current session; the next request starts a new one
    pub async fn close(&self) {
        if let Some(mut session) = self.session.lock().await.take() {
            session.close();
        }
    }
}

/// Every repository tool, bound to one project root
#[derive(Debug)]
pub struct Toolbox {
    root: PathBuf,
    sandbox: Sandbox,
    search: SearchConfig,
    editor: EditorConfig,
    shell: ShellHandle,
}

impl Toolbox {
    /// Build a toolbox for the project root named by `config`
    pub fn new(config: &Config) -> Result<Self> {
        let root = config.resolve_project_root()?;
        let sandbox = Sandbox::new(&root)?.with_binary_probe(config.search.binary_probe_bytes);
        info!("Toolbox ready for project root {}", root.display());

        Ok(Self {
            shell: ShellHandle::new(config.shell.clone(), root.clone()),
            root,
            sandbox,
            search: config.search.clone(),
            editor: config.editor.clone(),
        })
    }

    /// Build a toolbox with default settings for `root`
    pub fn with_root(root: impl AsRef<Path>) -> Result<Self> {
        Self::new(&Config::default().with_project_root(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shell(&self) -> &ShellHandle {
        &self.shell
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Run a shell command in the persistent session
    pub async fn run_command(&self, params: RunCommandParams) -> String {
        match self.try_run_command(&params).await {
            Ok(output) => format_command_output(&output),
            Err(e) => render_error(&e),
        }
    }

    pub async fn try_run_command(&self, params: &RunCommandParams) -> Result<CommandOutput> {
        if params.command.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }
        if let CommandVerdict::Denied { reason } = check_command(&params.command) {
            return Err(Error::CommandRejected { reason });
        }
        self.shell
            .run(&params.command, params.reset_cwd.unwrap_or(false))
            .await
    }

    /// Search text under a directory
    pub fn search_text(&self, params: SearchTextParams) -> String {
        render(
            self.try_search_text(params)
                .map(|matches| format_matches(&matches)),
        )
    }

    pub fn try_search_text(&self, params: SearchTextParams) -> Result<Vec<crate::fs::SearchMatch>> {
        let root = self.resolve_dir(&params.root);
        let options = SearchOptions {
            globs: into_pattern_list(params.glob),
            case_sensitive: params.case_sensitive,
            use_regex: params.use_regex,
            include_binary: params.include_binary,
            max_matches: params.max_matches,
            binary_probe_bytes: self.search.binary_probe_bytes,
        };
        search_text(&root, &params.query, &options)
    }

    /// List the immediate children of a directory
    pub fn list_dir(&self, params: ListDirParams) -> String {
        let directory = self.resolve_dir(&params.directory);
        let options = ListOptions {
            patterns: into_pattern_list(params.patterns),
            include_files: params.include_files,
            include_dirs: params.include_dirs,
            absolute_paths: params.absolute_paths,
        };
        render(list_dir(&directory, &options).map(|entries| format_entries(&entries)))
    }

    /// Walk a directory tree up to three levels deep
    pub fn walk_tree(&self, params: WalkTreeParams) -> String {
        let root = self.resolve_dir(&params.root);
        let options = TreeOptions {
            // Negative depths fail the range check as 0
            max_depth: usize::try_from(params.max_depth).unwrap_or(0),
            patterns: into_pattern_list(params.patterns),
            include_files: params.include_files,
            include_dirs: params.include_dirs,
            absolute_paths: params.absolute_paths,
        };
        render(walk_tree(&root, &options).map(|entries| format_tree(&entries)))
    }

    /// View a file inside the project root
    pub fn view_file(&self, params: ViewFileParams) -> String {
        let range = ViewRange {
            start_line: params.start_line,
            end_line: params.end_line,
            max_chars: params.max_characters,
        };
        render(view_file(&self.sandbox, &params.file_path, range))
    }

    /// Replace one occurrence of a string in a file inside the project root
    pub fn replace_in_file(&self, params: ReplaceParams) -> String {
        let result = usize::try_from(params.occurrence_index)
            .map_err(|_| {
                Error::invalid_argument("occurrence_index", "must be a non-negative integer.")
            })
            .and_then(|occurrence| {
                replace_in_file(
                    &self.sandbox,
                    &params.file_path,
                    &params.old_str,
                    &params.new_str,
                    occurrence,
                    self.editor.snippet_radius,
                )
            });
        render(result)
    }

    /// Close the shell session
    pub async fn shutdown(&self) {
        self.shell.close().await;
    }

    /// Relative directories resolve against the project root
    fn resolve_dir(&self, dir: &str) -> PathBuf {
        let path: PathBuf = Path::new(dir)
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        if path.is_absolute() {
            path
        } else if path.as_os_str().is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }
}

//! External tool location and availability checks
//!
//! Tools are looked up by an ordered list of strategies; the first one that
//! finds an existing file wins, and the bare tool name is the last resort so
//! the OS can still try its own lookup at spawn time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::domain::model::*;
use crate::ports::*;

/// One place a tool may live
pub trait ResolveStrategy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Path of the tool if this strategy finds it
    fn locate(&self, tool: Tool, candidates: &[String], fs: &dyn FsPort) -> Option<PathBuf>;
}

/// Paths set explicitly in the settings file
pub struct ExplicitPathStrategy {
    overrides: ToolOverrides,
}

impl ExplicitPathStrategy {
    pub fn new(overrides: ToolOverrides) -> Self {
        Self { overrides }
    }
}

impl ResolveStrategy for ExplicitPathStrategy {
    fn name(&self) -> &'static str {
        "explicit"
    }

    fn locate(&self, tool: Tool, _candidates: &[String], fs: &dyn FsPort) -> Option<PathBuf> {
        let path = self.overrides.get(tool)?;
        if fs.is_file(path) {
            Some(path.to_path_buf())
        } else {
            debug!(%tool, path = %path.display(), "Configured tool path does not exist, ignoring");
            None
        }
    }
}

/// Resources directory of a self-contained application bundle
pub struct BundledResourcesStrategy {
    dir: Option<PathBuf>,
}

impl BundledResourcesStrategy {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// `<bundle>/Contents/Resources` when the executable lives in `<bundle>/Contents/MacOS`
    pub fn detect(exe_dir: &Path) -> Option<PathBuf> {
        if exe_dir.file_name()? != "MacOS" {
            return None;
        }
        let contents = exe_dir.parent()?;
        if contents.file_name()? != "Contents" {
            return None;
        }
        Some(contents.join("Resources"))
    }
}

impl ResolveStrategy for BundledResourcesStrategy {
    fn name(&self) -> &'static str {
        "bundled"
    }

    fn locate(&self, _tool: Tool, candidates: &[String], fs: &dyn FsPort) -> Option<PathBuf> {
        find_in_dir(self.dir.as_deref()?, candidates, fs)
    }
}

/// Directory containing the running executable
pub struct ExecutableDirStrategy {
    dir: Option<PathBuf>,
}

impl ExecutableDirStrategy {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

impl ResolveStrategy for ExecutableDirStrategy {
    fn name(&self) -> &'static str {
        "executable-dir"
    }

    fn locate(&self, _tool: Tool, candidates: &[String], fs: &dyn FsPort) -> Option<PathBuf> {
        find_in_dir(self.dir.as_deref()?, candidates, fs)
    }
}

/// Directories of the system executable search path
pub struct SearchPathStrategy {
    dirs: Vec<PathBuf>,
}

impl SearchPathStrategy {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Directories listed in `PATH`
    pub fn from_env() -> Self {
        let dirs = std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).collect())
            .unwrap_or_default();
        Self { dirs }
    }
}

impl ResolveStrategy for SearchPathStrategy {
    fn name(&self) -> &'static str {
        "search-path"
    }

    fn locate(&self, _tool: Tool, candidates: &[String], fs: &dyn FsPort) -> Option<PathBuf> {
        self.dirs
            .iter()
            .filter(|dir| !dir.as_os_str().is_empty())
            .find_map(|dir| find_in_dir(dir, candidates, fs))
    }
}

fn find_in_dir(dir: &Path, candidates: &[String], fs: &dyn FsPort) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| fs.is_file(path))
}

/// Resolves tool paths through a strategy chain and caches the results
pub struct ToolResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
    fs: Arc<dyn FsPort>,
    exe_suffix: String,
    resolved: Mutex<HashMap<Tool, PathBuf>>,
    availability: Mutex<HashMap<Tool, bool>>,
}

impl ToolResolver {
    /// Create a resolver with an explicit strategy chain
    pub fn new(strategies: Vec<Box<dyn ResolveStrategy>>, fs: Arc<dyn FsPort>) -> Self {
        Self {
            strategies,
            fs,
            exe_suffix: std::env::consts::EXE_SUFFIX.to_string(),
            resolved: Mutex::new(HashMap::new()),
            availability: Mutex::new(HashMap::new()),
        }
    }

    /// Default chain: settings overrides, app bundle, executable dir, `PATH`
    pub fn system(overrides: ToolOverrides, fs: Arc<dyn FsPort>) -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let bundle_dir = exe_dir.as_deref().and_then(BundledResourcesStrategy::detect);

        let strategies: Vec<Box<dyn ResolveStrategy>> = vec![
            Box::new(ExplicitPathStrategy::new(overrides)),
            Box::new(BundledResourcesStrategy::new(bundle_dir)),
            Box::new(ExecutableDirStrategy::new(exe_dir)),
            Box::new(SearchPathStrategy::from_env()),
        ];
        Self::new(strategies, fs)
    }

    /// Suffix of the second name variant checked in each directory
    pub fn with_exe_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.exe_suffix = suffix.into();
        self
    }

    /// Bare name, then the suffixed variant
    pub fn candidates(&self, tool: Tool) -> Vec<String> {
        let mut names = vec![tool.name().to_string()];
        if !self.exe_suffix.is_empty() {
            names.push(format!("{}{}", tool.name(), self.exe_suffix));
        }
        names
    }

    fn resolve_uncached(&self, tool: Tool) -> PathBuf {
        let candidates = self.candidates(tool);
        for strategy in &self.strategies {
            if let Some(path) = strategy.locate(tool, &candidates, self.fs.as_ref()) {
                debug!(%tool, strategy = strategy.name(), path = %path.display(), "Resolved tool");
                return path;
            }
            trace!(%tool, strategy = strategy.name(), "Tool not found by strategy");
        }
        debug!(%tool, "Tool not found, falling back to bare name");
        PathBuf::from(tool.name())
    }

    /// Run `<tool> -version`; `Some(first line)` on exit code 0
    async fn query_version(path: &Path) -> Option<String> {
        let output = Command::new(path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => Some(
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            ),
            Ok(output) => {
                debug!(path = %path.display(), status = %output.status, "Version query failed");
                None
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Could not spawn tool");
                None
            }
        }
    }
}

#[async_trait]
impl ToolPort for ToolResolver {
    fn resolve(&self, tool: Tool) -> PathBuf {
        if let Ok(cache) = self.resolved.lock() {
            if let Some(path) = cache.get(&tool) {
                return path.clone();
            }
        }
        let path = self.resolve_uncached(tool);
        if let Ok(mut cache) = self.resolved.lock() {
            cache.insert(tool, path.clone());
        }
        path
    }

    async fn is_available(&self, tool: Tool) -> bool {
        if let Some(available) = self
            .availability
            .lock()
            .ok()
            .and_then(|cache| cache.get(&tool).copied())
        {
            return available;
        }
        self.status(tool).await.available
    }

    async fn status(&self, tool: Tool) -> ToolStatus {
        let path = self.resolve(tool);
        let version = Self::query_version(&path).await;
        let available = version.is_some();
        if let Ok(mut cache) = self.availability.lock() {
            cache.insert(tool, available);
        }

        ToolStatus {
            tool,
            path,
            available,
            version: version.filter(|v| !v.is_empty()),
        }
    }
}

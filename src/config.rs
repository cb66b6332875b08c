use crate::domain::VersionBump;
use crate::error::{GitflowError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// File name searched for in the working directory, repository root and home directory.
pub const CONFIG_FILE_NAME: &str = ".gitflow.toml";

/// Represents the complete configuration for gitflow.
///
/// Loaded once per invocation and passed down by reference; nothing below the
/// command layer mutates it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub branches: BranchConfig,

    #[serde(default)]
    pub workflows: WorkflowConfig,

    #[serde(default)]
    pub commits: CommitConfig,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Optional hosting provider integration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ProviderConfig {
    /// `github`, `gitlab`, or empty to disable.
    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub base_url: String,

    /// Name of the environment variable holding the API token.
    #[serde(default)]
    pub token_env: String,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub repo: String,
}

impl ProviderConfig {
    pub fn is_enabled(&self) -> bool {
        !self.kind.trim().is_empty()
    }
}

fn default_feature_prefix() -> String {
    "feature/".to_string()
}

fn default_bugfix_prefix() -> String {
    "bugfix/".to_string()
}

fn default_hotfix_prefix() -> String {
    "hotfix/".to_string()
}

fn default_main_branch() -> String {
    "main".to_string()
}

/// Branch naming conventions.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchConfig {
    #[serde(default = "default_feature_prefix")]
    pub feature_prefix: String,

    #[serde(default = "default_bugfix_prefix")]
    pub bugfix_prefix: String,

    #[serde(default = "default_hotfix_prefix")]
    pub hotfix_prefix: String,

    #[serde(default = "default_main_branch")]
    pub main_branch: String,

    #[serde(default)]
    pub develop_branch: String,
}

impl Default for BranchConfig {
    fn default() -> Self {
        BranchConfig {
            feature_prefix: default_feature_prefix(),
            bugfix_prefix: default_bugfix_prefix(),
            hotfix_prefix: default_hotfix_prefix(),
            main_branch: default_main_branch(),
            develop_branch: String::new(),
        }
    }
}

/// Workflow-specific settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub start: StartConfig,

    #[serde(default)]
    pub pr: PrConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StartConfig {
    /// Empty means `branches.main_branch`.
    #[serde(default)]
    pub base_branch: String,

    #[serde(default = "default_true")]
    pub auto_push: bool,

    #[serde(default = "default_true")]
    pub fetch_first: bool,
}

impl Default for StartConfig {
    fn default() -> Self {
        StartConfig {
            base_branch: String::new(),
            auto_push: true,
            fetch_first: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PrConfig {
    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub default_reviewers: Vec<String>,

    #[serde(default)]
    pub labels: Vec<String>,
}

/// How `sync` integrates the base branch into the current branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    #[default]
    Rebase,
    Merge,
}

impl SyncStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStrategy::Rebase => "rebase",
            SyncStrategy::Merge => "merge",
        }
    }
}

impl FromStr for SyncStrategy {
    type Err = GitflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "rebase" => Ok(SyncStrategy::Rebase),
            "merge" => Ok(SyncStrategy::Merge),
            other => Err(GitflowError::config(format!(
                "unsupported sync strategy: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SyncConfig {
    #[serde(default)]
    pub strategy: SyncStrategy,

    #[serde(default = "default_true")]
    pub auto_push: bool,

    #[serde(default = "default_true")]
    pub force_push: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            strategy: SyncStrategy::Rebase,
            auto_push: true,
            force_push: true,
        }
    }
}

fn default_age_threshold_days() -> i64 {
    30
}

fn default_protected_branches() -> Vec<String> {
    vec![
        "main".to_string(),
        "master".to_string(),
        "develop".to_string(),
    ]
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CleanupConfig {
    #[serde(default = "default_true")]
    pub merged_only: bool,

    #[serde(default = "default_age_threshold_days")]
    pub age_threshold_days: i64,

    #[serde(default = "default_protected_branches")]
    pub protected_branches: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        CleanupConfig {
            merged_only: true,
            age_threshold_days: default_age_threshold_days(),
            protected_branches: default_protected_branches(),
        }
    }
}

/// Returns the default list of conventional commit types.
fn default_commit_types() -> Vec<String> {
    ["feat", "fix", "docs", "refactor", "test", "chore"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

/// Commit message policy for the `commit` workflow.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CommitConfig {
    #[serde(default)]
    pub conventional: bool,

    #[serde(default = "default_commit_types")]
    pub types: Vec<String>,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub require_scope: bool,
}

impl Default for CommitConfig {
    fn default() -> Self {
        CommitConfig {
            conventional: false,
            types: default_commit_types(),
            scopes: Vec::new(),
            require_scope: false,
        }
    }
}

fn default_tag_prefix() -> String {
    "v".to_string()
}

/// Returns the default changelog section order.
pub fn default_changelog_sections() -> Vec<String> {
    ["breaking", "features", "fixes", "other"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Release versioning policy.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    #[serde(default)]
    pub default_bump: VersionBump,

    #[serde(default = "default_changelog_sections")]
    pub changelog_sections: Vec<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            tag_prefix: default_tag_prefix(),
            default_bump: VersionBump::Patch,
            changelog_sections: default_changelog_sections(),
        }
    }
}

/// Output styling.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub color: bool,

    #[serde(default)]
    pub emoji: bool,

    #[serde(default)]
    pub verbose: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            color: true,
            emoji: false,
            verbose: false,
        }
    }
}

/// Command-line overrides for the `[ui]` section.
///
/// Only flags the user actually passed are `Some`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOverrides {
    pub color: Option<bool>,
    pub emoji: Option<bool>,
    pub verbose: Option<bool>,
}

impl Config {
    /// Base branch that work branches start from and sync against.
    pub fn base_branch(&self) -> String {
        [&self.workflows.start.base_branch, &self.branches.main_branch]
            .iter()
            .map(|b| b.trim())
            .find(|b| !b.is_empty())
            .unwrap_or("main")
            .to_string()
    }

    /// Returns a copy with command-line UI flags applied.
    pub fn with_ui_overrides(mut self, overrides: UiOverrides) -> Self {
        if let Some(color) = overrides.color {
            self.ui.color = color;
        }
        if let Some(emoji) = overrides.emoji {
            self.ui.emoji = emoji;
        }
        if let Some(verbose) = overrides.verbose {
            self.ui.verbose = verbose;
        }
        self
    }

    /// Fill empty settings with defaults and reject unsupported values.
    pub fn validate(&mut self) -> Result<()> {
        if self.branches.main_branch.trim().is_empty() {
            self.branches.main_branch = default_main_branch();
        }
        if self.branches.feature_prefix.is_empty() {
            self.branches.feature_prefix = default_feature_prefix();
        }
        if self.branches.bugfix_prefix.is_empty() {
            self.branches.bugfix_prefix = default_bugfix_prefix();
        }
        if self.branches.hotfix_prefix.is_empty() {
            self.branches.hotfix_prefix = default_hotfix_prefix();
        }
        if self.workflows.start.base_branch.trim().is_empty() {
            self.workflows.start.base_branch = self.branches.main_branch.clone();
        }
        if self.workflows.cleanup.protected_branches.is_empty() {
            self.workflows.cleanup.protected_branches = default_protected_branches();
        }
        if self.release.changelog_sections.is_empty() {
            self.release.changelog_sections = default_changelog_sections();
        }

        let kind = self.provider.kind.trim();
        if !kind.is_empty() && kind != "github" && kind != "gitlab" {
            return Err(GitflowError::config(format!(
                "unsupported provider type: {}",
                kind
            )));
        }

        Ok(())
    }
}

/// Every problem with a configuration, without applying defaults.
pub fn strict_problems(cfg: &Config) -> Vec<String> {
    let mut problems = Vec::new();

    if cfg.branches.main_branch.trim().is_empty() {
        problems.push("branches.main_branch is required".to_string());
    }
    if cfg.branches.feature_prefix.is_empty() {
        problems.push("branches.feature_prefix is required".to_string());
    }
    if cfg.workflows.cleanup.age_threshold_days < 0 {
        problems.push("workflows.cleanup.age_threshold_days must be >= 0".to_string());
    }
    for section in &cfg.release.changelog_sections {
        if !default_changelog_sections().contains(section) {
            problems.push(format!(
                "release.changelog_sections has unknown section '{}'",
                section
            ));
        }
    }

    if cfg.provider.is_enabled() {
        let kind = cfg.provider.kind.trim();
        if kind != "github" && kind != "gitlab" {
            problems.push("provider.type must be github or gitlab".to_string());
        }
        if cfg.provider.token_env.is_empty() {
            problems.push("provider.token_env is required when provider is enabled".to_string());
        }
        if cfg.provider.owner.is_empty() {
            problems.push("provider.owner is required when provider is enabled".to_string());
        }
        if cfg.provider.repo.is_empty() {
            problems.push("provider.repo is required when provider is enabled".to_string());
        }
    }

    if cfg.commits.conventional && cfg.commits.types.is_empty() {
        problems.push("commits.types must be set when commits.conventional is true".to_string());
    }

    problems
}

/// Validate a configuration as written, reporting all problems at once.
pub fn validate_strict(cfg: &Config) -> Result<()> {
    let problems = strict_problems(cfg);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(GitflowError::config(problems.join("\n")))
    }
}

/// Parse a boolean the way environment flags are usually written.
fn parse_env_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(GitflowError::config(format!(
            "invalid {}: {:?} is not a boolean",
            name, other
        ))),
    }
}

/// Apply `GITFLOW_*` overrides using `lookup` to read variables.
pub fn apply_env_overrides_with<F>(cfg: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("GITFLOW_RELEASE_TAG_PREFIX") {
        cfg.release.tag_prefix = value.trim().to_string();
    }
    if let Some(value) = lookup("GITFLOW_RELEASE_DEFAULT_BUMP") {
        cfg.release.default_bump = value.parse()?;
    }
    if let Some(value) = lookup("GITFLOW_UI_NO_COLOR") {
        cfg.ui.color = !parse_env_bool("GITFLOW_UI_NO_COLOR", &value)?;
    }
    if let Some(value) = lookup("GITFLOW_UI_EMOJI") {
        cfg.ui.emoji = parse_env_bool("GITFLOW_UI_EMOJI", &value)?;
    }
    if let Some(value) = lookup("GITFLOW_UI_VERBOSE") {
        cfg.ui.verbose = parse_env_bool("GITFLOW_UI_VERBOSE", &value)?;
    }
    Ok(())
}

/// Apply `GITFLOW_*` overrides from the process environment.
pub fn apply_env_overrides(cfg: &mut Config) -> Result<()> {
    apply_env_overrides_with(cfg, |name| std::env::var(name).ok())
}

/// A loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// `None` when built-in defaults were used.
    pub path: Option<PathBuf>,
    pub config: Config,
}

impl LoadResult {
    /// Printable description of the configuration source.
    pub fn source(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "defaults".to_string(),
        }
    }
}

/// Locate a configuration file for `start_dir`.
///
/// Search order:
/// 1. `.gitflow.toml` in `start_dir`
/// 2. `.gitflow.toml` at the root of the enclosing git repository
/// 3. `.gitflow.toml` in the user's home directory
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let local = start_dir.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    if let Some(root) = git2::Repository::discover(start_dir)
        .ok()
        .and_then(|repo| repo.workdir().map(Path::to_path_buf))
    {
        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let home = dirs::home_dir()?.join(CONFIG_FILE_NAME);
    home.is_file().then_some(home)
}

/// Parse the configuration file at `path` as written, without overrides or
/// normalization.
pub fn read_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        GitflowError::config(format!("failed to read config at {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| GitflowError::config(format!("failed to parse {}: {}", path.display(), e)))
}

/// Read, override and validate the configuration file at `path`.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let mut config = read_config_file(path)?;
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration by searching from `start_dir`, falling back to defaults.
pub fn load_from_dir(start_dir: &Path) -> Result<LoadResult> {
    match find_config(start_dir) {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            let config = load_from_path(&path)?;
            Ok(LoadResult {
                path: Some(path),
                config,
            })
        }
        None => {
            debug!("no configuration file found, using defaults");
            let mut config = Config::default();
            apply_env_overrides(&mut config)?;
            config.validate()?;
            Ok(LoadResult { path: None, config })
        }
    }
}

/// Loads configuration from an explicit file or by discovery from the
/// current directory.
pub fn load_config(config_path: Option<&Path>) -> Result<LoadResult> {
    match config_path {
        Some(path) => Ok(LoadResult {
            path: Some(path.to_path_buf()),
            config: load_from_path(path)?,
        }),
        None => load_from_dir(&std::env::current_dir()?),
    }
}

/// Serialize `cfg` as TOML to `path`.
pub fn write_config(path: &Path, cfg: &Config) -> Result<()> {
    let content = toml::to_string_pretty(cfg)?;
    fs::write(path, content)?;
    Ok(())
}

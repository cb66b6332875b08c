//! Release computation, tagging and publishing
//!
//! [compute_release] resolves the latest version tag, reads the commits since
//! it, and derives the next version and its changelog. [create_release] adds
//! the annotated tag, and [publish] pushes the notes to the hosting provider.

use crate::analyzer::VersionAnalyzer;
use crate::changelog;
use crate::config::Config;
use crate::domain::{format_tag, resolve_latest, SemanticVersion};
use crate::error::{GitflowError, Result};
use crate::git::Repository;
use crate::notice::Notice;
use crate::provider::{self, Provider, ReleaseCreation};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseOptions {
    /// Compute only; skip the clean-tree check and the tag.
    pub dry_run: bool,
    /// Version to release instead of the computed one, used as given.
    pub version_override: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseResult {
    pub base_version: SemanticVersion,
    /// Tag `base_version` came from; `None` for the implicit 0.0.0 baseline.
    pub base_tag: Option<String>,
    pub next_version: SemanticVersion,
    pub commit_count: usize,
    pub changelog: String,
    pub tag: String,
    pub date: String,
    pub notices: Vec<Notice>,
}

/// Compute the next release from the tags and the commits since the latest.
///
/// `today` is the fallback release date (`YYYY-MM-DD`) when there are no
/// commits since the last tag.
pub fn compute_release(
    repo: &dyn Repository,
    cfg: &Config,
    opts: &ReleaseOptions,
    today: &str,
) -> Result<ReleaseResult> {
    let version_override = opts
        .version_override
        .as_deref()
        .map(SemanticVersion::parse_override)
        .transpose()?;

    let prefix = cfg.release.tag_prefix.as_str();
    let mut notices = Vec::new();

    let tags = repo.list_tags()?;
    let latest = resolve_latest(&tags, prefix);
    notices.extend(latest.skipped.iter().map(|tag| Notice::UnparsableTag {
        tag: tag.clone(),
        prefix: prefix.to_string(),
    }));

    let commits = repo.commits_between(latest.tag.as_deref(), "HEAD")?;
    debug!(
        base_tag = ?latest.tag,
        commits = commits.len(),
        "collected commits for release"
    );
    if commits.is_empty() {
        if let Some(tag) = &latest.tag {
            notices.push(Notice::NoNewCommits {
                latest_tag: tag.clone(),
            });
        }
    }

    let analysis = VersionAnalyzer::new(cfg.release.default_bump).analyze(latest.version, &commits);
    if analysis.dropped > 0 {
        notices.push(Notice::UnclassifiedCommits {
            count: analysis.dropped,
        });
    }

    let next_version = version_override.unwrap_or(analysis.next_version);
    let date = changelog::release_date(&commits, today);
    let changelog = changelog::render(
        &next_version,
        prefix,
        &date,
        &analysis.groups,
        &cfg.release.changelog_sections,
    );

    Ok(ReleaseResult {
        base_version: latest.version,
        base_tag: latest.tag,
        next_version,
        commit_count: commits.len(),
        changelog,
        tag: format_tag(prefix, &next_version),
        date,
        notices,
    })
}

/// Compute the release and, unless dry-running, tag HEAD with the changelog as
/// the tag message.
pub fn create_release(
    repo: &dyn Repository,
    cfg: &Config,
    opts: &ReleaseOptions,
    today: &str,
) -> Result<ReleaseResult> {
    if !opts.dry_run && repo.is_dirty()? {
        return Err(GitflowError::precondition("working tree is dirty"));
    }

    let result = compute_release(repo, cfg, opts, today)?;
    if !opts.dry_run {
        repo.create_annotated_tag(&result.tag, &result.changelog)?;
        info!(tag = %result.tag, "created release tag");
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub provider: String,
    pub version: String,
    pub url: String,
    pub dry_run: bool,
}

/// Publish `release` to the provider configured in `cfg`.
pub fn publish(cfg: &Config, release: &ReleaseResult, dry_run: bool) -> Result<PublishResult> {
    publish_with(cfg, release, dry_run, provider::new)
}

/// Publish through the provider returned by `connect`.
///
/// An existing release for the tag is updated instead of failing. A dry run
/// only checks that a provider is configured and never calls `connect`.
pub fn publish_with<F>(
    cfg: &Config,
    release: &ReleaseResult,
    dry_run: bool,
    connect: F,
) -> Result<PublishResult>
where
    F: FnOnce(&Config) -> Result<Box<dyn Provider>>,
{
    if !cfg.provider.is_enabled() {
        return Err(GitflowError::config("provider is not configured"));
    }

    let mut result = PublishResult {
        provider: cfg.provider.kind.trim().to_string(),
        version: release.next_version.to_string(),
        url: String::new(),
        dry_run,
    };
    if dry_run {
        return Ok(result);
    }

    let client = connect(cfg)?;
    let published = match client.create_release(&release.tag, &release.tag, &release.changelog)? {
        ReleaseCreation::Created(created) => created,
        ReleaseCreation::AlreadyExists => {
            info!(tag = %release.tag, "release exists, updating");
            client.update_release(&release.tag, &release.tag, &release.changelog)?
        }
    };

    result.url = published.url;
    Ok(result)
}

/// Machine-readable output selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Env,
}

impl OutputFormat {
    pub fn from_flags(json: bool, env: bool) -> Result<Self> {
        match (json, env) {
            (true, true) => Err(GitflowError::config("choose only one of --json or --env")),
            (true, false) => Ok(OutputFormat::Json),
            (false, true) => Ok(OutputFormat::Env),
            (false, false) => Ok(OutputFormat::Text),
        }
    }
}

#[derive(Serialize)]
struct PreviewOutput<'a> {
    current_version: String,
    next_version: String,
    commit_count: usize,
    changelog: &'a str,
}

#[derive(Serialize)]
struct VersionOutput {
    version: String,
}

fn escape_env_value(value: &str) -> String {
    value.replace('\n', "\\n")
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| GitflowError::config(e.to_string()))
}

/// `release preview --json` document.
pub fn preview_json(result: &ReleaseResult) -> Result<String> {
    to_json(&PreviewOutput {
        current_version: result.base_version.to_string(),
        next_version: result.next_version.to_string(),
        commit_count: result.commit_count,
        changelog: &result.changelog,
    })
}

/// `release preview --env` lines.
pub fn preview_env(result: &ReleaseResult) -> Vec<String> {
    vec![
        format!("GITFLOW_RELEASE_CURRENT_VERSION={}", result.base_version),
        format!("GITFLOW_RELEASE_NEXT_VERSION={}", result.next_version),
        format!("GITFLOW_RELEASE_COMMIT_COUNT={}", result.commit_count),
        format!(
            "GITFLOW_RELEASE_CHANGELOG={}",
            escape_env_value(&result.changelog)
        ),
    ]
}

pub fn version_json(version: &SemanticVersion) -> Result<String> {
    to_json(&VersionOutput {
        version: version.to_string(),
    })
}

pub fn version_env(version: &SemanticVersion) -> String {
    format!("GITFLOW_RELEASE_VERSION={}", version)
}

pub fn publish_json(result: &PublishResult) -> Result<String> {
    to_json(result)
}

pub fn publish_env(result: &PublishResult) -> Vec<String> {
    vec![
        format!("GITFLOW_RELEASE_PROVIDER={}", result.provider),
        format!("GITFLOW_RELEASE_VERSION={}", result.version),
        format!("GITFLOW_RELEASE_URL={}", result.url),
        format!("GITFLOW_RELEASE_DRY_RUN={}", result.dry_run),
    ]
}

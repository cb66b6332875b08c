//! Repository and configuration health checks

use crate::config::{find_config, load_from_dir, read_config_file, validate_strict};
use crate::git::{Git2Repository, Repository};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckLevel {
    Ok,
    Warn,
    Error,
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckLevel::Ok => "OK",
            CheckLevel::Warn => "WARN",
            CheckLevel::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub level: CheckLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn push(&mut self, name: &'static str, level: CheckLevel, message: impl Into<String>) {
        self.checks.push(DoctorCheck {
            name,
            level,
            message: message.into(),
        });
    }

    /// Worst level among the checks.
    pub fn level(&self) -> CheckLevel {
        self.checks
            .iter()
            .map(|c| c.level)
            .max()
            .unwrap_or(CheckLevel::Ok)
    }

    pub fn has_errors(&self) -> bool {
        self.level() == CheckLevel::Error
    }
}

/// Inspect the repository containing `dir`, reading tokens from the process
/// environment.
pub fn doctor(dir: &Path) -> DoctorReport {
    doctor_with(dir, |name| std::env::var(name).ok())
}

/// Inspect the repository containing `dir` with `lookup` standing in for the
/// environment.
pub fn doctor_with<F>(dir: &Path, lookup: F) -> DoctorReport
where
    F: Fn(&str) -> Option<String>,
{
    let mut report = DoctorReport::default();

    let repo = match Git2Repository::open(dir) {
        Ok(repo) => {
            report.push("Git repository", CheckLevel::Ok, "Repository detected");
            repo
        }
        Err(err) => {
            report.push("Git repository", CheckLevel::Error, err.to_string());
            return report;
        }
    };

    match repo.is_dirty() {
        Ok(true) => report.push(
            "Working tree",
            CheckLevel::Warn,
            "Working tree has uncommitted changes",
        ),
        Ok(false) => report.push("Working tree", CheckLevel::Ok, "Working tree is clean"),
        Err(err) => report.push("Working tree", CheckLevel::Error, err.to_string()),
    }

    let root = repo.workdir();
    let config_path = find_config(root);
    match &config_path {
        Some(path) => report.push(
            "Config presence",
            CheckLevel::Ok,
            format!("Found {}", path.display()),
        ),
        None => report.push(
            "Config presence",
            CheckLevel::Warn,
            "Config file not found; run gitflow init",
        ),
    }

    let loaded = match load_from_dir(root) {
        Ok(loaded) => loaded,
        Err(err) => {
            report.push("Config validity", CheckLevel::Error, err.to_string());
            report.push(
                "Provider token",
                CheckLevel::Warn,
                "Skipping provider token check due to invalid config",
            );
            return report;
        }
    };

    match &config_path {
        Some(path) => match read_config_file(path).and_then(|raw| validate_strict(&raw)) {
            Ok(()) => report.push("Config validity", CheckLevel::Ok, "Config valid"),
            Err(err) => report.push("Config validity", CheckLevel::Error, err.to_string()),
        },
        None => report.push(
            "Config validity",
            CheckLevel::Warn,
            "Config missing; skipping validation",
        ),
    }

    let provider = &loaded.config.provider;
    if !provider.is_enabled() {
        report.push("Provider token", CheckLevel::Ok, "Provider not configured");
    } else if provider.token_env.is_empty() {
        report.push(
            "Provider token",
            CheckLevel::Warn,
            "provider.token_env is not set",
        );
    } else if lookup(&provider.token_env).map_or(true, |t| t.trim().is_empty()) {
        report.push(
            "Provider token",
            CheckLevel::Warn,
            format!("Missing {} environment variable", provider.token_env),
        );
    } else {
        report.push(
            "Provider token",
            CheckLevel::Ok,
            format!("{} is set", provider.token_env),
        );
    }

    report
}

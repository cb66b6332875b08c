use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use gitflow::config::{self, Config, SyncStrategy, UiOverrides};
use gitflow::domain::BranchKind;
use gitflow::error::EXIT_COMPUTATION;
use gitflow::git::Git2Repository;
use gitflow::provider::{self, PrState};
use gitflow::ui::{formatter, Ui};
use gitflow::workflow::release::{self, OutputFormat, ReleaseOptions, ReleaseResult};
use gitflow::workflow::{
    branch_list, cleanup, commit, doctor, init, pr, start, status, sync,
};
use gitflow::GitflowError;

#[derive(Parser)]
#[command(
    name = "gitflow",
    version,
    about = "Branch, sync, cleanup and release automation for git repositories"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    no_color: bool,

    #[arg(long, global = true, help = "Use emoji in output")]
    emoji: bool,

    #[arg(short, long, global = true, help = "Show debug logs")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn ui_overrides(&self) -> UiOverrides {
        UiOverrides {
            color: self.no_color.then_some(false),
            emoji: self.emoji.then_some(true),
            verbose: self.verbose.then_some(true),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create a work branch from the updated base branch
    Start {
        #[arg(value_enum)]
        kind: KindArg,
        /// Free text, turned into the branch name
        name: String,
        #[arg(long, default_value = "")]
        remote: String,
    },
    /// Bring the current branch up to date with the base branch
    Sync {
        #[arg(long, default_value = "")]
        remote: String,
        #[arg(long, help = "rebase or merge")]
        strategy: Option<SyncStrategy>,
        #[arg(long, help = "Do not push after integrating")]
        no_push: bool,
        #[arg(long, help = "Never force push, even after a rebase")]
        no_force: bool,
    },
    /// Delete merged or stale local branches
    Cleanup {
        #[arg(long, default_value = "")]
        remote: String,
        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
        #[arg(long, help = "Also consider unmerged branches")]
        all: bool,
        #[arg(long, value_name = "DAYS")]
        age_threshold: Option<i64>,
        #[arg(long, help = "Delete the remote branches too")]
        delete_remote: bool,
        #[arg(long, help = "Pick the branches to delete interactively")]
        select: bool,
    },
    /// Commit staged changes
    Commit {
        #[arg(short, long, help = "Stage all changes first")]
        all: bool,
        #[arg(short, long, default_value = "")]
        message: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(short = 't', long = "type", default_value = "")]
        commit_type: String,
        #[arg(short, long, default_value = "")]
        scope: String,
        #[arg(long)]
        breaking: bool,
    },
    /// Compute, tag and publish releases
    #[command(subcommand)]
    Release(ReleaseCommand),
    /// Show the current branch and working tree state
    Status,
    /// Inspect local branches
    #[command(subcommand)]
    Branch(BranchCommand),
    /// Check repository and configuration health
    Doctor,
    /// Write a default configuration file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Show or validate the configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Work with pull requests on the hosting provider
    #[command(subcommand)]
    Pr(PrCommand),
    /// Hosting provider utilities
    #[command(subcommand)]
    Provider(ProviderCommand),
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Feature,
    Bugfix,
    Hotfix,
}

impl From<KindArg> for BranchKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Feature => BranchKind::Feature,
            KindArg::Bugfix => BranchKind::Bugfix,
            KindArg::Hotfix => BranchKind::Hotfix,
        }
    }
}

#[derive(Args)]
struct VersionArg {
    #[arg(long = "version", value_name = "VERSION", help = "Release this version instead of the computed one")]
    version: Option<String>,
}

#[derive(Args)]
struct FormatArgs {
    #[arg(long, help = "Print JSON")]
    json: bool,
    #[arg(long, help = "Print GITFLOW_RELEASE_* lines")]
    env: bool,
}

#[derive(Subcommand)]
enum ReleaseCommand {
    /// Show the next version and its changelog
    Preview {
        #[command(flatten)]
        version: VersionArg,
        #[command(flatten)]
        format: FormatArgs,
    },
    /// Tag HEAD with the next version
    Create {
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        version: VersionArg,
    },
    /// Print the next version
    Version {
        #[command(flatten)]
        version: VersionArg,
        #[command(flatten)]
        format: FormatArgs,
    },
    /// Print the changelog of the next release
    Changelog {
        #[command(flatten)]
        version: VersionArg,
    },
    /// Publish the next release on the hosting provider
    Publish {
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        version: VersionArg,
        #[command(flatten)]
        format: FormatArgs,
    },
}

#[derive(Subcommand)]
enum BranchCommand {
    /// List local branches relative to the base branch
    List {
        #[arg(long)]
        base: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Report every problem in the configuration file
    Validate,
}

#[derive(Subcommand)]
enum PrCommand {
    /// Open a pull request for the current branch
    Create {
        #[arg(long, default_value = "")]
        remote: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        base: String,
        #[arg(long, conflicts_with = "ready")]
        draft: bool,
        #[arg(long)]
        ready: bool,
        #[arg(long = "reviewer", value_delimiter = ',')]
        reviewers: Vec<String>,
        #[arg(long = "label", value_delimiter = ',')]
        labels: Vec<String>,
    },
    /// Show one pull request
    View { number: u64 },
    /// List pull requests
    List {
        #[arg(long, default_value = "open", help = "open, closed or all")]
        state: PrState,
    },
}

#[derive(Subcommand)]
enum ProviderCommand {
    /// Check that the configured token can reach the project
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ui = Ui::new(&Config::default().with_ui_overrides(cli.ui_overrides()).ui);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            ui.display_error(&format!("{:#}", err));
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<GitflowError>()
        .map_or(EXIT_COMPUTATION, GitflowError::exit_code)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

fn open_repo() -> Result<Git2Repository> {
    let cwd = std::env::current_dir().context("cannot read the current directory")?;
    Ok(Git2Repository::open(cwd)?)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let overrides = cli.ui_overrides();

    // These two work without (or despite) a configuration file.
    match &cli.command {
        Command::Doctor => {
            init_logging(cli.verbose);
            let ui = Ui::new(&Config::default().with_ui_overrides(overrides).ui);
            return run_doctor(&ui);
        }
        Command::Init { force } => {
            init_logging(cli.verbose);
            let ui = Ui::new(&Config::default().with_ui_overrides(overrides).ui);
            run_init(&ui, *force)?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let loaded = config::load_config(cli.config.as_deref())?;
    let cfg = loaded.config.clone().with_ui_overrides(overrides);
    init_logging(cfg.ui.verbose);
    let ui = Ui::new(&cfg.ui);

    match cli.command {
        Command::Start { kind, name, remote } => {
            let repo = open_repo()?;
            let opts = start::StartOptions {
                kind: kind.into(),
                name,
                remote,
            };
            let result = start::start(&repo, &cfg, &opts)?;
            ui.display_success(&format!(
                "Created {} from {}",
                result.new_branch, result.base_branch
            ));
            if result.pushed {
                ui.display_status("Pushed and set upstream");
            }
        }
        Command::Sync {
            remote,
            strategy,
            no_push,
            no_force,
        } => {
            let repo = open_repo()?;
            let opts = sync::SyncOptions {
                remote,
                strategy,
                auto_push: no_push.then_some(false),
                force_push: no_force.then_some(false),
            };
            let plan = sync::sync(&repo, &cfg, &opts)?;
            ui.display_success(&format!(
                "Synced {} with {} ({})",
                plan.current_branch, plan.base_branch, plan.strategy
            ));
            if plan.force_pushed {
                ui.display_status("Pushed with --force-with-lease");
            } else if plan.pushed {
                ui.display_status("Pushed");
            }
        }
        Command::Cleanup {
            remote,
            yes,
            all,
            age_threshold,
            delete_remote,
            select,
        } => {
            let repo = open_repo()?;
            run_cleanup(
                &ui,
                &repo,
                &cfg,
                cleanup::CleanupOptions {
                    remote,
                    yes,
                    all,
                    age_threshold,
                    delete_remote,
                    merged_only: None,
                    selection: None,
                },
                select,
            )?;
        }
        Command::Commit {
            all,
            message,
            body,
            commit_type,
            scope,
            breaking,
        } => {
            let repo = open_repo()?;
            let opts = commit::CommitOptions {
                all,
                message,
                body,
                commit_type,
                scope,
                breaking,
            };
            let message = commit::commit(&repo, &cfg, &opts)?;
            let subject = message.lines().next().unwrap_or_default();
            ui.display_success(&format!("Committed: {}", subject));
        }
        Command::Release(command) => run_release(&ui, &cfg, command)?,
        Command::Status => {
            let repo = open_repo()?;
            let state = status::status(&repo)?;
            ui.display_pairs(&[
                ("branch", state.branch),
                (
                    "working tree",
                    if state.dirty { "dirty" } else { "clean" }.to_string(),
                ),
            ]);
        }
        Command::Branch(BranchCommand::List { base }) => {
            let repo = open_repo()?;
            let list = branch_list::list_branches(&repo, &cfg, base.as_deref())?;
            ui.display_header(&format!("Branches (base: {})", list.base));
            ui.display_lines(&formatter::branch_rows(&list.branches));
        }
        Command::Config(ConfigCommand::Show) => {
            println!("# source: {}", loaded.source());
            print!("{}", toml::to_string_pretty(&cfg)?);
        }
        Command::Config(ConfigCommand::Validate) => {
            match &loaded.path {
                Some(path) => config::validate_strict(&config::read_config_file(path)?)?,
                None => config::validate_strict(&cfg)?,
            }
            ui.display_success(&format!("Configuration valid ({})", loaded.source()));
        }
        Command::Pr(command) => run_pr(&ui, &cfg, command)?,
        Command::Provider(ProviderCommand::Check) => {
            let client = provider::new(&cfg)?;
            client.validate_auth()?;
            let default_branch = client.get_default_branch()?;
            ui.display_success(&format!(
                "Authenticated with {} for {}/{} (default branch {})",
                client.kind(),
                cfg.provider.owner,
                cfg.provider.repo,
                default_branch
            ));
        }
        Command::Doctor => return run_doctor(&ui),
        Command::Init { force } => run_init(&ui, force)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn run_init(ui: &Ui, force: bool) -> Result<()> {
    let mut defaults = Config::default();
    defaults.validate()?;
    let path = init::init(&std::env::current_dir()?, &defaults, force)?;
    ui.display_success(&format!("Wrote {}", path.display()));
    Ok(())
}

fn run_doctor(ui: &Ui) -> Result<ExitCode> {
    let report = doctor::doctor(&std::env::current_dir()?);
    ui.display_header("gitflow doctor");
    for check in &report.checks {
        let line = formatter::doctor_line(check);
        match check.level {
            doctor::CheckLevel::Ok => ui.display_success(&line),
            doctor::CheckLevel::Warn => ui.display_status(&line),
            doctor::CheckLevel::Error => ui.display_error(&line),
        }
    }
    Ok(if report.has_errors() {
        ExitCode::from(EXIT_COMPUTATION)
    } else {
        ExitCode::SUCCESS
    })
}

fn run_cleanup(
    ui: &Ui,
    repo: &Git2Repository,
    cfg: &Config,
    mut opts: cleanup::CleanupOptions,
    select: bool,
) -> Result<()> {
    if select && !opts.yes {
        let preview = cleanup::prepare(repo, cfg, &opts)?;
        let picked = ui.select_branches(&mut io::stdin().lock(), &mut io::stdout(), &preview)?;
        opts.selection = Some(picked);
    }

    let mut shown = false;
    let (report, outcome) = cleanup::cleanup(repo, cfg, &opts, |report| {
        shown = true;
        ui.display_header(&format!("Cleanup plan (base: {})", report.base_branch));
        ui.display_lines(&formatter::cleanup_rows(report));
        Ok(ui.confirm_cleanup(&mut io::stdin().lock(), &mut io::stdout(), report)?)
    })?;

    for notice in &report.notices {
        ui.display_notice(notice);
    }
    if !shown {
        ui.display_header(&format!("Cleanup plan (base: {})", report.base_branch));
        ui.display_lines(&formatter::cleanup_rows(&report));
    }

    match outcome {
        Some(outcome) => {
            ui.display_success(&format!("Deleted {} branch(es)", outcome.deleted.len()));
            if !outcome.remote_deleted.is_empty() {
                ui.display_success(&format!(
                    "Deleted {} remote branch(es) on {}",
                    outcome.remote_deleted.len(),
                    report.remote
                ));
            }
        }
        None if report.plan.deletable_count() == 0 => ui.display_status("No branches to delete"),
        None => ui.display_status("Cleanup cancelled"),
    }
    Ok(())
}

fn release_inputs(version: VersionArg, dry_run: bool) -> Result<(Git2Repository, ReleaseOptions)> {
    let repo = open_repo()?;
    let opts = ReleaseOptions {
        dry_run,
        version_override: version.version,
    };
    Ok((repo, opts))
}

fn show_notices(ui: &Ui, release: &ReleaseResult) {
    for notice in &release.notices {
        ui.display_notice(notice);
    }
}

fn print_lines(lines: &[String]) -> Result<()> {
    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn run_release(ui: &Ui, cfg: &Config, command: ReleaseCommand) -> Result<()> {
    let today = today();
    match command {
        ReleaseCommand::Preview { version, format } => {
            let format = OutputFormat::from_flags(format.json, format.env)?;
            let (repo, opts) = release_inputs(version, true)?;
            let result = release::compute_release(&repo, cfg, &opts, &today)?;
            show_notices(ui, &result);
            match format {
                OutputFormat::Json => println!("{}", release::preview_json(&result)?),
                OutputFormat::Env => print_lines(&release::preview_env(&result))?,
                OutputFormat::Text => {
                    ui.display_header("Release preview");
                    ui.display_lines(&formatter::release_summary(&result));
                }
            }
        }
        ReleaseCommand::Create { dry_run, version } => {
            let (repo, opts) = release_inputs(version, dry_run)?;
            let result = release::create_release(&repo, cfg, &opts, &today)?;
            show_notices(ui, &result);
            ui.display_lines(&formatter::release_summary(&result));
            if dry_run {
                ui.display_status(&format!("Dry run: would create tag {}", result.tag));
            } else {
                ui.display_success(&format!("Created tag {}", result.tag));
            }
        }
        ReleaseCommand::Version { version, format } => {
            let format = OutputFormat::from_flags(format.json, format.env)?;
            let (repo, opts) = release_inputs(version, true)?;
            let result = release::compute_release(&repo, cfg, &opts, &today)?;
            show_notices(ui, &result);
            match format {
                OutputFormat::Json => println!("{}", release::version_json(&result.next_version)?),
                OutputFormat::Env => println!("{}", release::version_env(&result.next_version)),
                OutputFormat::Text => println!("{}", result.next_version),
            }
        }
        ReleaseCommand::Changelog { version } => {
            let (repo, opts) = release_inputs(version, true)?;
            let result = release::compute_release(&repo, cfg, &opts, &today)?;
            show_notices(ui, &result);
            print!("{}", result.changelog);
        }
        ReleaseCommand::Publish {
            dry_run,
            version,
            format,
        } => {
            let format = OutputFormat::from_flags(format.json, format.env)?;
            let (repo, opts) = release_inputs(version, true)?;
            let result = release::compute_release(&repo, cfg, &opts, &today)?;
            show_notices(ui, &result);
            let published = release::publish(cfg, &result, dry_run)?;
            match format {
                OutputFormat::Json => println!("{}", release::publish_json(&published)?),
                OutputFormat::Env => print_lines(&release::publish_env(&published))?,
                OutputFormat::Text if published.dry_run => ui.display_status(&format!(
                    "Dry run: would publish {} to {}",
                    result.tag, published.provider
                )),
                OutputFormat::Text => ui.display_success(&format!(
                    "Published {} on {}: {}",
                    result.tag, published.provider, published.url
                )),
            }
        }
    }
    Ok(())
}

fn run_pr(ui: &Ui, cfg: &Config, command: PrCommand) -> Result<()> {
    let client = provider::new(cfg)?;
    match command {
        PrCommand::Create {
            remote,
            title,
            description,
            base,
            draft,
            ready,
            reviewers,
            labels,
        } => {
            let repo = open_repo()?;
            let opts = pr::PrCreateOptions {
                remote,
                title,
                description,
                base_branch: base,
                draft: match (draft, ready) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                reviewers: (!reviewers.is_empty()).then_some(reviewers),
                labels: (!labels.is_empty()).then_some(labels),
            };
            let created = pr::create_pr(&repo, cfg, client.as_ref(), &opts)?;
            ui.display_success(&format!("Opened {}", formatter::pull_request_line(&created)));
            ui.display_status(&created.url);
        }
        PrCommand::View { number } => {
            let found = pr::view_pr(client.as_ref(), number)?;
            ui.display_lines(&formatter::pull_request_details(&found));
        }
        PrCommand::List { state } => {
            let prs = pr::list_prs(client.as_ref(), state)?;
            if prs.is_empty() {
                ui.display_status(&format!("No {} pull requests", state.as_str()));
            }
            let lines: Vec<String> = prs.iter().map(formatter::pull_request_line).collect();
            ui.display_lines(&lines);
        }
    }
    Ok(())
}

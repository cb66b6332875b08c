//! User interface module - interaction (prompts) and styled output.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Colors, symbols and prompts
//!
//! Prompts read from any `BufRead` and write to any `Write` so they can be
//! driven from tests; the binary passes locked stdin and stdout.

use std::io::{self, BufRead, Write};

use console::style;

use crate::config::UiConfig;
use crate::notice::Notice;
use crate::workflow::cleanup::CleanupReport;

pub mod formatter;

/// Terminal output settings for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ui {
    pub color: bool,
    pub emoji: bool,
}

impl Default for Ui {
    fn default() -> Self {
        Ui {
            color: true,
            emoji: false,
        }
    }
}

impl Ui {
    pub fn new(config: &UiConfig) -> Self {
        Ui {
            color: config.color,
            emoji: config.emoji,
        }
    }

    fn symbol(&self, plain: &'static str, emoji: &'static str) -> &'static str {
        if self.emoji {
            emoji
        } else {
            plain
        }
    }

    /// Print a success message with a green checkmark.
    pub fn display_success(&self, message: &str) {
        let mark = style(self.symbol("✓", "✅")).green().force_styling(self.color);
        println!("{} {}", mark, message);
    }

    /// Print a status message with a yellow arrow.
    pub fn display_status(&self, message: &str) {
        let mark = style(self.symbol("→", "👉")).yellow().force_styling(self.color);
        println!("{} {}", mark, message);
    }

    /// Print an error message in red to stderr.
    pub fn display_error(&self, message: &str) {
        let label = style("ERROR:").red().bold().force_styling(self.color);
        eprintln!("{} {}", label, message);
    }

    /// Print a non-fatal notice to stderr.
    pub fn display_notice(&self, notice: &Notice) {
        self.display_warning(&notice.to_string());
    }

    pub fn display_warning(&self, message: &str) {
        let label = style(format!("{} WARNING:", self.symbol("⚠", "⚠️")))
            .yellow()
            .force_styling(self.color);
        eprintln!("{} {}", label, message);
    }

    pub fn display_header(&self, title: &str) {
        println!("\n{}", style(title).bold().force_styling(self.color));
    }

    /// Print preformatted lines as they are.
    pub fn display_lines<S: AsRef<str>>(&self, lines: &[S]) {
        for line in lines {
            println!("{}", line.as_ref());
        }
    }

    /// Aligned `key: value` pairs.
    pub fn display_pairs(&self, pairs: &[(&str, String)]) {
        let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in pairs {
            let key = style(format!("{:<width$}", key, width = width))
                .cyan()
                .force_styling(self.color);
            println!("  {}  {}", key, value);
        }
    }

    /// Prompt for a yes/no answer; only "y" or "yes" confirms.
    pub fn confirm_action<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
        prompt: &str,
    ) -> io::Result<bool> {
        write!(output, "\n{} (y/N): ", prompt)?;
        output.flush()?;

        let response = read_answer(input)?.to_lowercase();
        Ok(response == "y" || response == "yes")
    }

    /// Show the branches about to be deleted and require the word "yes".
    pub fn confirm_cleanup<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
        report: &CleanupReport,
    ) -> io::Result<bool> {
        writeln!(output, "\nBranches to delete:")?;
        for candidate in report.plan.deletable() {
            writeln!(
                output,
                "{}",
                formatter::candidate_line(candidate, report.delete_remote)
            )?;
        }
        write!(
            output,
            "\nType \"yes\" to delete {} branch(es): ",
            report.plan.deletable_count()
        )?;
        output.flush()?;

        Ok(read_answer(input)? == "yes")
    }

    /// Let the user pick which deletable branches to remove.
    ///
    /// Accepts comma or space separated numbers, `all`, or an empty line for
    /// all of them. `none` selects nothing. Out of range numbers are ignored.
    pub fn select_branches<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
        report: &CleanupReport,
    ) -> io::Result<Vec<String>> {
        let names: Vec<&str> = report.plan.deletable().map(|c| c.name.as_str()).collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        writeln!(output, "\nDeletable branches:")?;
        for (i, candidate) in report.plan.deletable().enumerate() {
            writeln!(
                output,
                "  {}. {}",
                i + 1,
                formatter::candidate_line(candidate, report.delete_remote).trim_start()
            )?;
        }
        write!(output, "\nSelect branches (1-{}, all, none) [all]: ", names.len())?;
        output.flush()?;

        let answer = read_answer(input)?.to_lowercase();
        let selected = match answer.as_str() {
            "" | "all" => names.iter().map(|n| n.to_string()).collect(),
            "none" => Vec::new(),
            list => {
                let mut picked: Vec<String> = Vec::new();
                for token in list.split(|c: char| c == ',' || c.is_whitespace()) {
                    let Ok(index) = token.parse::<usize>() else {
                        continue;
                    };
                    if let Some(name) = index.checked_sub(1).and_then(|i| names.get(i)) {
                        if !picked.iter().any(|p| p == name) {
                            picked.push(name.to_string());
                        }
                    }
                }
                picked
            }
        };
        Ok(selected)
    }
}

fn read_answer<R: BufRead>(input: &mut R) -> io::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

//! Interactive session on rustyline.
//!
//! A pasted or dragged file path counts as a drop; `/open <path>` is the
//! file picker.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use r2r_application::{DiagnosticEvent, SubmissionReport, WorkflowController, WorkflowEvent};
use r2r_core::intake::OfferSource;
use r2r_core::pipeline::StepKey;
use r2r_core::view::{COPIED_LABEL, PROCESSING_TEXT};
use r2r_core::workflow::SubmitRefusal;
use r2r_infrastructure::file_source;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc;

use super::drive_submission;
use crate::render;

const COMMANDS: [&str; 10] = [
    "/open",
    "/remove",
    "/process",
    "/toggle",
    "/copy",
    "/new",
    "/show",
    "/diagnostics",
    "/help",
    "/quit",
];

/// Warnings and errors kept for `/diagnostics`.
const DIAGNOSTICS_KEPT: usize = 50;

const STEP_USAGE: &str = "expected one of researcher, coder, execution, verifier or 1-4";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    /// `/open` with an optional path. No path is a cancelled picker.
    Open(Option<String>),
    /// A path pasted onto the prompt.
    Drop(PathBuf),
    Remove,
    Process,
    Toggle(StepKey),
    Copy(StepKey),
    New,
    Show,
    Diagnostics,
    Help,
    Quit,
    Usage(String),
    Unknown(String),
}

fn parse_step(arg: &str) -> Option<StepKey> {
    if let Ok(ordinal) = arg.parse::<u8>() {
        return StepKey::ordered().find(|key| key.ordinal() == ordinal);
    }
    arg.to_ascii_lowercase().parse().ok()
}

fn parse_command(line: &str) -> ReplCommand {
    let (head, arg) = match line.split_once(char::is_whitespace) {
        Some((head, arg)) => (head, arg.trim()),
        None => (line, ""),
    };

    match head {
        "quit" | "exit" | "/quit" => ReplCommand::Quit,
        "/open" if arg.is_empty() => ReplCommand::Open(None),
        "/open" => ReplCommand::Open(Some(arg.to_string())),
        "/remove" => ReplCommand::Remove,
        "/process" => ReplCommand::Process,
        "/new" => ReplCommand::New,
        "/show" => ReplCommand::Show,
        "/diagnostics" => ReplCommand::Diagnostics,
        "/help" => ReplCommand::Help,
        "/toggle" => match parse_step(arg) {
            Some(key) => ReplCommand::Toggle(key),
            None => ReplCommand::Usage(format!("/toggle <step>: {}", STEP_USAGE)),
        },
        "/copy" if arg.is_empty() => ReplCommand::Copy(StepKey::Coder),
        "/copy" => match parse_step(arg) {
            Some(key) => ReplCommand::Copy(key),
            None => ReplCommand::Usage(format!("/copy [step]: {}", STEP_USAGE)),
        },
        _ => match file_source::normalize_dropped_path(line) {
            Some(path) => ReplCommand::Drop(path),
            None => ReplCommand::Unknown(line.to_string()),
        },
    }
}

/// CLI helper for rustyline: slash-command completion, hints and highlighting.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
    steps: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
            steps: StepKey::ordered().map(|key| key.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        // Step names after /toggle and /copy
        for command in ["/toggle ", "/copy "] {
            if let Some(partial) = line.strip_prefix(command) {
                let candidates = self
                    .steps
                    .iter()
                    .filter(|step| step.starts_with(partial))
                    .map(|step| Pair {
                        display: step.clone(),
                        replacement: step.clone(),
                    })
                    .collect();
                return Ok((command.len(), candidates));
            }
        }

        if line.starts_with('/') && !line.contains(' ') {
            let candidates = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let head = line.split_whitespace().next().unwrap_or("");
        if self.commands.iter().any(|cmd| cmd == head) {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// The most recent log events forwarded by the diagnostics layer.
struct RecentDiagnostics {
    feed: mpsc::UnboundedReceiver<DiagnosticEvent>,
    kept: VecDeque<DiagnosticEvent>,
}

impl RecentDiagnostics {
    fn new(feed: mpsc::UnboundedReceiver<DiagnosticEvent>) -> Self {
        Self {
            feed,
            kept: VecDeque::with_capacity(DIAGNOSTICS_KEPT),
        }
    }

    /// Pulls everything queued since the last call, oldest dropped first.
    fn refresh(&mut self) -> &VecDeque<DiagnosticEvent> {
        while let Ok(event) = self.feed.try_recv() {
            if self.kept.len() == DIAGNOSTICS_KEPT {
                self.kept.pop_front();
            }
            self.kept.push_back(event);
        }
        &self.kept
    }
}

fn print_help() {
    let rows = [
        ("<path>", "Paste or drag a PDF onto the prompt to select it"),
        ("/open <path>", "Select a PDF through the picker"),
        ("/remove", "Remove the selected file"),
        ("/process", "Send the selected paper to the pipeline"),
        ("/toggle <step>", "Expand or collapse a result step"),
        ("/copy [step]", "Copy a step to the clipboard (default: coder)"),
        ("/new", "Start over with a new paper"),
        ("/show", "Show the current screen"),
        ("/diagnostics", "Recent warnings and errors, causes included"),
        ("quit", "Exit"),
    ];
    for (usage, text) in rows {
        println!("  {:<16} {}", usage.bright_cyan(), text.bright_black());
    }
}

/// Runs the interactive session until `quit` or end of input.
pub async fn run(
    controller: WorkflowController,
    mut events: mpsc::UnboundedReceiver<WorkflowEvent>,
    diagnostics: mpsc::UnboundedReceiver<DiagnosticEvent>,
    base_url: &str,
) -> Result<()> {
    let mut diagnostics = RecentDiagnostics::new(diagnostics);
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Research2Runtime ===".bright_magenta().bold());
    render::print_notice(&format!("Pipeline: {}", base_url));
    render::print_notice("Paste a PDF path or type /help. 'quit' exits.");
    println!();
    render::print_view(&controller.render().await);

    loop {
        let readline = rl.readline("r2r> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                let command = parse_command(trimmed);
                if command == ReplCommand::Quit {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                handle(&controller, &mut events, &mut diagnostics, command).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}

async fn handle(
    controller: &WorkflowController,
    events: &mut mpsc::UnboundedReceiver<WorkflowEvent>,
    diagnostics: &mut RecentDiagnostics,
    command: ReplCommand,
) {
    match command {
        ReplCommand::Open(None) => {
            // Picker dismissed without a choice
            let _ = controller.select_file(None, OfferSource::Browse).await;
            render::print_notice("No file chosen.");
        }
        ReplCommand::Open(Some(arg)) => {
            let path = file_source::normalize_dropped_path(&arg).unwrap_or_else(|| arg.into());
            offer(controller, path, OfferSource::Browse).await;
        }
        ReplCommand::Drop(path) => offer(controller, path, OfferSource::Drop).await,
        ReplCommand::Remove => {
            controller.clear_file().await;
            render::print_view(&controller.render().await);
        }
        ReplCommand::Process => {
            render::print_notice(PROCESSING_TEXT);
            match drive_submission(controller, events).await {
                SubmissionReport::Refused(SubmitRefusal::NoFile) => {
                    render::print_notice("Select a PDF first.");
                }
                SubmissionReport::Refused(SubmitRefusal::AlreadyActive) => {
                    render::print_notice("A paper is already being processed.");
                }
                SubmissionReport::Settled(_) => {
                    render::print_view(&controller.render().await);
                }
            }
        }
        ReplCommand::Toggle(key) => {
            controller.toggle_step(key).await;
            render::print_view(&controller.render().await);
        }
        ReplCommand::Copy(key) => match controller.step_content(key).await {
            Some(content) => {
                if controller.copy_step_content(&content).await {
                    println!("{}", COPIED_LABEL.green());
                } else {
                    render::print_warning("Could not copy to the clipboard.");
                }
            }
            None => render::print_notice(&format!("No {} step to copy.", key)),
        },
        ReplCommand::New => {
            controller.reset().await;
            render::print_view(&controller.render().await);
        }
        ReplCommand::Show => render::print_view(&controller.render().await),
        ReplCommand::Diagnostics => {
            let recent = diagnostics.refresh();
            if recent.is_empty() {
                render::print_notice("No warnings or errors so far.");
            }
            for event in recent {
                println!("{}", render::diagnostic_line(event));
            }
        }
        ReplCommand::Help => print_help(),
        ReplCommand::Usage(usage) => render::print_warning(&usage),
        ReplCommand::Unknown(_) => render::print_notice("Unknown command. Type /help."),
        ReplCommand::Quit => {}
    }
}

async fn offer(controller: &WorkflowController, path: PathBuf, source: OfferSource) {
    match file_source::offer_from_path(&path).await {
        Ok(offer) => {
            // A rejected offer is recorded in the state and shows up in the view
            let _ = controller.select_file(Some(offer), source).await;
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Cannot read offered file");
            render::print_warning(&format!("Cannot read {}", path.display()));
        }
    }
    render::print_view(&controller.render().await);
}

//! Terminal rendering of [`View`]s.
//!
//! Formatting builds plain lines with `colored` styling; printing is a thin
//! wrapper, so the layout can be checked with colours switched off.

use colored::Colorize;
use r2r_application::DiagnosticEvent;
use r2r_core::view::{MetadataView, ResultsView, Screen, StepBody, StepView, UploadView, View};

pub fn print_view(view: &View) {
    for line in view_lines(view) {
        println!("{}", line);
    }
}

pub fn print_stage(stage: &str) {
    println!("  {} {}", "›".bright_yellow(), stage.yellow());
}

pub fn print_notice(text: &str) {
    println!("{}", text.bright_black());
}

pub fn print_warning(text: &str) {
    println!("{}", text.yellow());
}

/// One log event as `HH:MM:SS LEVEL message key=value ...`, fields sorted.
pub fn diagnostic_line(event: &DiagnosticEvent) -> String {
    let time = event.timestamp.get(11..19).unwrap_or(&event.timestamp);
    let level = match event.level.as_str() {
        "ERROR" => event.level.red().bold(),
        "WARN" => event.level.yellow().bold(),
        _ => event.level.normal(),
    };

    let mut fields: Vec<_> = event
        .fields
        .iter()
        .filter(|(name, _)| name.as_str() != "message")
        .map(|(name, value)| match value.as_str() {
            Some(text) => format!("{}={}", name, text),
            None => format!("{}={}", name, value),
        })
        .collect();
    fields.sort();

    let mut line = format!("{} {:<5} {}", time.bright_black(), level, event.message);
    if !fields.is_empty() {
        line = format!("{} {}", line, fields.join(" ").bright_black());
    }
    line
}

pub fn view_lines(view: &View) -> Vec<String> {
    let mut lines = match &view.screen {
        Screen::Upload(upload) => upload_lines(upload),
        Screen::Results(results) => results_lines(results),
    };
    if let Some(overlay) = &view.overlay {
        lines.push(overlay.text.bright_yellow().to_string());
        if let Some(stage) = overlay.stage {
            lines.push(format!("  {} {}", "›".bright_yellow(), stage.yellow()));
        }
    }
    lines
}

fn upload_lines(upload: &UploadView) -> Vec<String> {
    let mut lines = Vec::new();
    match &upload.selected_file {
        Some(name) => lines.push(format!("{} {}", "Selected:".bold(), name.bright_white())),
        None => lines.push(
            "No file selected. Paste a PDF path or use /open <path>."
                .bright_black()
                .to_string(),
        ),
    }
    if let Some(error) = &upload.error {
        lines.push(error.red().to_string());
    }
    let button = format!("[{}]", upload.process_label);
    if upload.process_enabled {
        lines.push(format!("{} {}", button.bright_green().bold(), "/process".bright_black()));
    } else {
        lines.push(button.bright_black().to_string());
    }
    lines
}

fn results_lines(results: &ResultsView) -> Vec<String> {
    let mut header = results.title.bright_green().bold().to_string();
    if let Some(badge) = results.authentic_badge {
        header = format!("{}  {}", header, format!("✔ {}", badge).green());
    }

    let mut lines = vec![header];
    if let Some(metadata) = &results.metadata {
        lines.extend(metadata_lines(metadata));
    }
    for step in &results.steps {
        lines.push(String::new());
        lines.extend(step_lines(step));
    }
    lines
}

fn metadata_lines(metadata: &MetadataView) -> Vec<String> {
    let verdict = if metadata.authentic {
        metadata.verdict.green().bold()
    } else {
        metadata.verdict.yellow().bold()
    };
    vec![
        format!("  {} {}", "Session ID:".bright_black(), metadata.session_id),
        format!("  {} {}", "Filename:".bright_black(), metadata.filename),
        format!("  {} {}", "Verdict:".bright_black(), verdict),
    ]
}

fn step_lines(step: &StepView) -> Vec<String> {
    let marker = if step.expanded { "▾" } else { "▸" };
    let heading = format!("{} {}. {}", marker, step.ordinal, step.title);
    let mut lines = vec![heading.bright_cyan().bold().to_string()];
    if !step.expanded {
        return lines;
    }

    match &step.body {
        StepBody::Paragraphs(paragraphs) => {
            lines.extend(paragraphs.iter().map(|p| format!("    {}", p)));
        }
        StepBody::Code(code) => {
            let label = if code.copied {
                code.copy_label.green().to_string()
            } else {
                format!("{} {}", code.copy_label, "(/copy)".bright_black())
            };
            lines.push(format!("    {}  {}", code.language.bright_magenta(), label));
            let width = code.lines.len().to_string().len();
            lines.extend(code.lines.iter().map(|line| {
                format!(
                    "    {} {} {}",
                    format!("{:>width$}", line.number).bright_black(),
                    "│".bright_black(),
                    line.text
                )
            }));
        }
        StepBody::Logs(logs) => {
            lines.extend(logs.split('\n').map(|l| format!("    {}", l.bright_black())));
        }
        StepBody::Verdict(verdict) => {
            lines.push(format!("    {}", verdict.bold()));
        }
    }
    lines
}

//! Terminal rendering
//!
//! Colored notices, the assistant's replies, and task tables.

use colored::Colorize;
use jiff::tz::TimeZone;
use navi::{ConversationEntry, Notification, NotificationLevel, Task, TaskStatus, datetime};

/// Output handler for terminal display
#[derive(Default)]
pub struct OutputHandler;

impl OutputHandler {
    pub fn new() -> Self {
        Self
    }

    /// Print the welcome banner
    pub fn print_banner(&self, server_url: &str, time_zone: &str) {
        println!();
        println!("{}", "Navi - your task assistant".bright_cyan().bold());
        println!("{}", "─".repeat(60).dimmed());
        println!("  Server:    {}", server_url.bright_white());
        println!("  Time zone: {}", time_zone.bright_white());
        println!(
            "  {}",
            "Describe what you need to do, or use /help for commands".dimmed()
        );
        println!();
    }

    /// Print a section header
    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", format!("▶ {}", text).bright_yellow().bold());
        println!("{}", "─".repeat(60).dimmed());
    }

    pub fn print_success(&self, text: &str) {
        println!("{} {}", "✓".bright_green(), text.bright_white());
    }

    pub fn print_error(&self, text: &str) {
        println!("{} {}", "✗".bright_red(), text.bright_red());
    }

    pub fn print_warning(&self, text: &str) {
        println!("{} {}", "⚠".bright_yellow(), text.yellow());
    }

    pub fn print_info(&self, text: &str) {
        println!("{} {}", "ℹ".bright_blue(), text);
    }

    /// Toast-style notice raised by the session
    pub fn print_notification(&self, notification: &Notification) {
        let title = format!("[{}]", notification.title);
        let title = match notification.level {
            NotificationLevel::Default => title.bright_green().bold(),
            NotificationLevel::Destructive => title.bright_red().bold(),
        };
        println!("{} {}", title, notification.description.dimmed());
    }

    /// Print the assistant's reply
    pub fn print_reply(&self, text: &str) {
        println!();
        for line in text.lines() {
            println!("  {}", line.bright_white());
        }
    }

    pub fn print_history(&self, entries: &[ConversationEntry], tz: &TimeZone) {
        if entries.is_empty() {
            self.print_info("No conversation yet.");
            return;
        }
        for entry in entries {
            let when = entry.timestamp.to_zoned(tz.clone()).strftime("%H:%M");
            let speaker = if entry.is_ai {
                "navi".bright_cyan()
            } else {
                "you".bright_green()
            };
            let mut lines = entry.text.lines();
            println!(
                "{} {:>4}: {}",
                when.to_string().dimmed(),
                speaker,
                lines.next().unwrap_or_default()
            );
            for line in lines {
                println!("             {}", line);
            }
        }
    }

    /// Print tasks table
    pub fn print_tasks_table(&self, tasks: &[&Task], tz: &TimeZone) {
        if tasks.is_empty() {
            self.print_info("No tasks.");
            return;
        }

        println!();
        println!(
            "{}",
            format!(
                "{:<15} {:<32} {:>8} {:>12} {:>7}  {}",
                "ID", "Title", "Priority", "Status", "Steps", "Due"
            )
            .bright_white()
            .bold()
        );
        println!("{}", "─".repeat(100).dimmed());

        for task in tasks {
            let status = task.status.as_str();
            let status_colored = match task.status {
                TaskStatus::Todo => status.bright_yellow(),
                TaskStatus::InProgress => status.bright_blue(),
                TaskStatus::Done => status.bright_green(),
            };

            println!(
                "{:<15} {:<32} {:>8} {:>12} {:>7}  {}",
                task.id.to_string().dimmed(),
                truncate(&task.title, 30).bright_white(),
                task.priority.as_str(),
                status_colored,
                format!("{}/{}", task.completed_steps(), task.steps.len()),
                datetime::format_human(task.due_date, tz).dimmed()
            );
        }
        println!();
    }

    /// Full view of one task including its step checklist
    pub fn print_task_detail(&self, task: &Task, tz: &TimeZone) {
        self.print_header(&task.title);
        println!("  ID:       {}", task.id);
        println!("  Due:      {}", datetime::format_human(task.due_date, tz));
        println!("  Priority: {}", task.priority);
        println!("  Status:   {}", task.status);
        if !task.description.trim().is_empty() {
            println!();
            for line in task.description.lines() {
                println!("  {}", line);
            }
        }
        if !task.steps.is_empty() {
            println!();
            for step in &task.steps {
                let mark = if step.completed {
                    "[x]".bright_green()
                } else {
                    "[ ]".normal()
                };
                println!("  {} {}. {}", mark, step.id, step.content);
                for resource in step.resources.iter().flatten() {
                    println!("        {}", resource.dimmed());
                }
            }
        }
        println!();
    }
}

/// Shorten to `max` characters, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

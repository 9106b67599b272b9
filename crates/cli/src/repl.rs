//! Interactive REPL for Navi CLI
//!
//! Owns the client-side [`AssistantSession`]: the task store and the
//! conversation live here, and every free-text line is one round-trip to the
//! server whose answer is applied back onto the session.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use navi::{AssistantSession, Outcome, TITLE_REPLY, datetime};
use rustyline::{DefaultEditor, error::ReadlineError};

use crate::{api::ApiClient, output::OutputHandler};

/// Slash commands understood by the REPL
#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    Help,
    Exit,
    Tasks,
    Today,
    Week,
    Search(String),
    Show(i64),
    ToggleStep { task_id: i64, step_id: u32 },
    Delete(i64),
    History,
    Transcribe(PathBuf),
    Health,
}

impl SlashCommand {
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut parts = input.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        let id_arg = |name: &str| -> Result<i64, String> {
            rest.first()
                .and_then(|raw| raw.parse().ok())
                .ok_or_else(|| format!("Usage: {} <task id>", name))
        };

        match command {
            "/help" | "/h" | "/?" => Ok(Self::Help),
            "/exit" | "/quit" | "/q" => Ok(Self::Exit),
            "/tasks" => Ok(Self::Tasks),
            "/today" | "/day" => Ok(Self::Today),
            "/week" => Ok(Self::Week),
            "/search" if !rest.is_empty() => Ok(Self::Search(rest.join(" "))),
            "/search" => Err("Usage: /search <text>".to_string()),
            "/show" => id_arg("/show").map(Self::Show),
            "/delete" => id_arg("/delete").map(Self::Delete),
            "/done" => match (
                rest.first().and_then(|raw| raw.parse().ok()),
                rest.get(1).and_then(|raw| raw.parse().ok()),
            ) {
                (Some(task_id), Some(step_id)) => Ok(Self::ToggleStep { task_id, step_id }),
                _ => Err("Usage: /done <task id> <step number>".to_string()),
            },
            "/history" => Ok(Self::History),
            "/transcribe" if !rest.is_empty() => Ok(Self::Transcribe(PathBuf::from(rest.join(" ")))),
            "/transcribe" => Err("Usage: /transcribe <audio file>".to_string()),
            "/health" => Ok(Self::Health),
            other => Err(format!("Unknown command: {}. Type /help for commands.", other)),
        }
    }
}

/// Interactive REPL for Navi CLI
pub struct NaviRepl {
    api: ApiClient,
    session: AssistantSession,
    output: OutputHandler,
    editor: DefaultEditor,
}

impl NaviRepl {
    pub fn new(api: ApiClient, session: AssistantSession) -> Result<Self> {
        Ok(Self {
            api,
            session,
            output: OutputHandler::new(),
            editor: DefaultEditor::new()?,
        })
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> Result<()> {
        self.output
            .print_banner(self.api.base_url(), self.session.time_zone_name());

        loop {
            let prompt = self.build_prompt();

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(input);

                    if input.starts_with('/') {
                        match SlashCommand::parse(input) {
                            Ok(SlashCommand::Exit) => break,
                            Ok(command) => {
                                if let Err(e) = self.handle_command(command).await {
                                    self.output.print_error(&format!("Command error: {}", e));
                                }
                            }
                            Err(usage) => self.output.print_warning(&usage),
                        }
                    } else {
                        self.process_input(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!();
                    self.output.print_info("Use /exit to quit.");
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(e) => {
                    self.output.print_error(&format!("Input error: {}", e));
                    break;
                }
            }
        }

        Ok(())
    }

    /// One natural-language command: send it, then apply the answer
    pub async fn process_input(&mut self, input: &str) {
        let Some(ticket) = self.session.begin_command(input) else {
            self.output
                .print_warning("Still working on the previous command.");
            return;
        };

        let result = self
            .api
            .send_command(ticket.request())
            .await
            .map_err(|e| {
                tracing::warn!("command request failed: {e:#}");
                format!("{:#}", e)
            });

        let outcome = self.session.apply_response(ticket, result);
        tracing::debug!(?outcome, "command applied");

        if let Some(reply) = self.session.conversation().last() {
            self.output.print_reply(&reply.text);
        }
        // the reply toast repeats the text just printed
        for notification in self
            .session
            .take_notifications()
            .into_iter()
            .filter(|n| n.title != TITLE_REPLY)
        {
            self.output.print_notification(&notification);
        }
        if let Outcome::Created(task) | Outcome::Updated(task) = &outcome {
            let tz = self.session.time_zone().clone();
            self.output.print_task_detail(task, &tz);
        }
    }

    async fn handle_command(&mut self, command: SlashCommand) -> Result<()> {
        let tz = self.session.time_zone().clone();

        match command {
            SlashCommand::Help => self.print_help(),
            SlashCommand::Exit => {}
            SlashCommand::Tasks => {
                let store = self.session.store();
                self.output.print_header(&format!(
                    "Tasks ({}/{})",
                    store.len(),
                    store.capacity()
                ));
                let tasks: Vec<_> = store.tasks().iter().collect();
                self.output.print_tasks_table(&tasks, &tz);
            }
            SlashCommand::Today => {
                let today = datetime::today(&tz);
                self.output.print_header(&format!("Due today ({})", today));
                self.output
                    .print_tasks_table(&self.session.store().due_on(today, &tz), &tz);
            }
            SlashCommand::Week => {
                let today = datetime::today(&tz);
                self.output.print_header("Due this week");
                self.output
                    .print_tasks_table(&self.session.store().due_in_week(today, &tz), &tz);
            }
            SlashCommand::Search(term) => {
                self.output.print_header(&format!("Matching \"{}\"", term));
                self.output
                    .print_tasks_table(&self.session.store().search(&term), &tz);
            }
            SlashCommand::Show(id) => match self.session.store().find(id) {
                Some(task) => self.output.print_task_detail(task, &tz),
                None => self.output.print_warning(&format!("No task with ID {}", id)),
            },
            SlashCommand::ToggleStep { task_id, step_id } => {
                let task = self.session.toggle_step(task_id, step_id)?;
                self.output.print_success(&format!(
                    "{} is now {} ({}/{} steps done)",
                    task.title,
                    task.status,
                    task.completed_steps(),
                    task.steps.len()
                ));
            }
            SlashCommand::Delete(id) => match self.session.delete_task(id) {
                Some(task) => self
                    .output
                    .print_success(&format!("Deleted \"{}\"", task.title)),
                None => self.output.print_warning(&format!("No task with ID {}", id)),
            },
            SlashCommand::History => {
                self.output.print_header("Conversation");
                self.output
                    .print_history(self.session.conversation().entries(), &tz);
            }
            SlashCommand::Transcribe(path) => {
                self.output
                    .print_info(&format!("Transcribing {}...", path.display()));
                let text = self.api.transcribe(&path).await?;
                if text.trim().is_empty() {
                    self.output.print_warning("Nothing was heard in that recording.");
                } else {
                    self.output.print_info(&format!("Heard: {}", text.trim()));
                    self.process_input(&text).await;
                }
            }
            SlashCommand::Health => {
                let health = self.api.health().await?;
                self.output.print_success(&format!("Server {}", health.status));
                let llm = if health.llm_configured {
                    "configured".green()
                } else {
                    "missing API key".red()
                };
                let stt = if health.stt_ready {
                    "ready".green()
                } else {
                    "missing API key".red()
                };
                println!("  LLM ({}): {}", health.llm_provider, llm);
                println!("  Speech-to-text: {}", stt);
            }
        }

        Ok(())
    }

    fn build_prompt(&self) -> String {
        let store = self.session.store();
        format!(
            "\n{} [{}] {} ",
            "navi".bright_green().bold(),
            format!("{}/{} tasks", store.len(), store.capacity()).dimmed(),
            ">".bright_green()
        )
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Navi CLI Commands".bright_white().bold());
        println!("{}", "─".repeat(50).dimmed());
        println!();

        println!("{}", "Tasks:".bright_cyan());
        println!("  {}                 List all tasks", "/tasks".bright_yellow());
        println!("  {}                 Tasks due today", "/today".bright_yellow());
        println!("  {}                  Tasks due this week", "/week".bright_yellow());
        println!("  {}        Search titles and descriptions", "/search <text>".bright_yellow());
        println!("  {}            Show a task with its steps", "/show <id>".bright_yellow());
        println!("  {}    Toggle a step", "/done <id> <step>".bright_yellow());
        println!("  {}          Delete a task", "/delete <id>".bright_yellow());
        println!();

        println!("{}", "Other:".bright_cyan());
        println!("  {} Send a recording as a command", "/transcribe <file>".bright_yellow());
        println!("  {}               Show the conversation", "/history".bright_yellow());
        println!("  {}                Check the server", "/health".bright_yellow());
        println!("  {}                  Exit the CLI", "/exit".bright_yellow());
        println!();
        println!(
            "{}",
            "Anything else is sent to the assistant, e.g. \"dentist next monday at 3pm\".".dimmed()
        );
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing_commands() {
        assert_eq!(SlashCommand::parse("/tasks"), Ok(SlashCommand::Tasks));
        assert_eq!(SlashCommand::parse("/day"), Ok(SlashCommand::Today));
        assert_eq!(SlashCommand::parse("/q"), Ok(SlashCommand::Exit));
        assert_eq!(
            SlashCommand::parse("/search  weekly report "),
            Ok(SlashCommand::Search("weekly report".to_string()))
        );
    }

    #[test]
    fn parses_task_arguments() {
        assert_eq!(
            SlashCommand::parse("/done 1714590000000 2"),
            Ok(SlashCommand::ToggleStep {
                task_id: 1714590000000,
                step_id: 2
            })
        );
        assert_eq!(SlashCommand::parse("/delete 7"), Ok(SlashCommand::Delete(7)));
        assert_eq!(
            SlashCommand::parse("/transcribe memo.wav"),
            Ok(SlashCommand::Transcribe(PathBuf::from("memo.wav")))
        );
    }

    #[test]
    fn bad_arguments_return_usage() {
        assert_eq!(
            SlashCommand::parse("/delete abc"),
            Err("Usage: /delete <task id>".to_string())
        );
        assert!(SlashCommand::parse("/done 3").is_err());
        assert!(SlashCommand::parse("/search").is_err());
        assert!(SlashCommand::parse("/frobnicate").unwrap_err().starts_with("Unknown command"));
    }
}

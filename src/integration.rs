//! Line-oriented command shell.
//!
//! Parsing is pure ([`parse_command`]); [`run_session`] reads commands,
//! drives the [`Workflow`] and prints what changed. Ctrl-C cancels the call
//! in flight and ends the session when nothing is running.

use crate::gateway::{AnalysisGateway, MealStore};
use crate::model::{AppError, IngredientDraft, IngredientId, IngredientPatch, InvalidIngredientId};
use crate::state::Status;
use crate::view;
use crate::workflow::{CancelHandle, Workflow};
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

const ADD_USAGE: &str = "add NAME [CAL [P [C [F]]]]";
const RM_USAGE: &str = "rm ID";
const SET_USAGE: &str = "set ID field=value...";

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Initial analysis, optionally replacing the pre-analysis comment.
    Analyze(Option<String>),
    /// Re-analysis, optionally replacing the post-analysis comment.
    Reanalyze(Option<String>),
    /// Add a user ingredient.
    Add(IngredientDraft),
    /// Remove an ingredient.
    Remove(IngredientId),
    /// Patch an ingredient.
    Set(IngredientId, IngredientPatch),
    /// Set the post-analysis comment. Empty text clears it.
    Note(String),
    /// Print the session.
    Show,
    /// Persist the meal.
    Submit,
    /// Drop the session.
    Discard,
    /// Print the command reference.
    Help,
    /// Leave the shell.
    Quit,
}

/// A line that is not a valid command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Unbalanced quotes or a dangling escape.
    #[error("Could not split command line: {0}")]
    Syntax(#[from] shell_words::ParseError),

    /// First word is not a command.
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),

    /// A required argument is absent.
    #[error("Usage: {0}")]
    MissingArgument(&'static str),

    /// More arguments than the command accepts.
    #[error("Too many arguments. Usage: {0}")]
    TooManyArguments(&'static str),

    /// Malformed ingredient id.
    #[error("Invalid ingredient id: {0}")]
    InvalidId(#[from] InvalidIngredientId),

    /// A `set` argument without `=`.
    #[error("Expected field=value, got '{0}'")]
    InvalidAssignment(String),

    /// A `set` field that does not exist.
    #[error("Unknown field '{0}' (name, calories, protein, carbs, fat, fiber, sugar, sodium)")]
    UnknownField(String),
}

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns `CommandError` describing what is wrong with the line.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let words = shell_words::split(line)?;
    let Some((head, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match head.to_lowercase().as_str() {
        "analyze" | "analyse" => Command::Analyze(joined(args)),
        "reanalyze" | "reanalyse" => Command::Reanalyze(joined(args)),
        "add" => Command::Add(parse_add(args)?),
        "rm" | "remove" => match args {
            [id] => Command::Remove(IngredientId::new(id.as_str())?),
            [] => return Err(CommandError::MissingArgument(RM_USAGE)),
            _ => return Err(CommandError::TooManyArguments(RM_USAGE)),
        },
        "set" => parse_set(args)?,
        "note" => Command::Note(args.join(" ")),
        "show" | "ls" => Command::Show,
        "submit" => Command::Submit,
        "discard" => Command::Discard,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return Err(CommandError::Unknown(head.clone())),
    };
    Ok(Some(command))
}

fn joined(args: &[String]) -> Option<String> {
    let text = args.join(" ");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn parse_add(args: &[String]) -> Result<IngredientDraft, CommandError> {
    let Some((name, numbers)) = args.split_first() else {
        return Err(CommandError::MissingArgument(ADD_USAGE));
    };
    if numbers.len() > 4 {
        return Err(CommandError::TooManyArguments(ADD_USAGE));
    }
    let field = |i: usize| numbers.get(i).cloned().unwrap_or_default();
    Ok(IngredientDraft::named(name.as_str()).macros(field(0), field(1), field(2), field(3)))
}

fn parse_set(args: &[String]) -> Result<Command, CommandError> {
    let [id, assignments @ ..] = args else {
        return Err(CommandError::MissingArgument(SET_USAGE));
    };
    if assignments.is_empty() {
        return Err(CommandError::MissingArgument(SET_USAGE));
    }

    let mut patch = IngredientPatch::default();
    for assignment in assignments {
        let (field, value) = assignment
            .split_once('=')
            .ok_or_else(|| CommandError::InvalidAssignment(assignment.clone()))?;
        if !patch.set_field(&field.to_lowercase(), value) {
            return Err(CommandError::UnknownField(field.to_string()));
        }
    }
    Ok(Command::Set(IngredientId::new(id.as_str())?, patch))
}

/// Whether the shell keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command.
    Continue,
    /// The session is over.
    Stop,
}

/// Run one command against `workflow`, writing feedback to `out`.
///
/// Workflow failures are reported to the user, not returned.
///
/// # Errors
///
/// Only when writing to `out` fails.
pub async fn execute<G, S, W>(
    workflow: &mut Workflow<G, S>,
    command: Command,
    out: &mut W,
) -> Result<Flow, AppError>
where
    G: AnalysisGateway,
    S: MealStore,
    W: Write,
{
    debug!(?command, "Executing command");
    let outcome = match command {
        Command::Analyze(hint) => {
            // The comment is kept only when the analysis may start.
            let result = match hint {
                Some(text) if workflow.coordinator().status() == Status::AwaitingAnalysis => {
                    workflow.coordinator_mut().set_pre_comment(text)
                }
                _ => Ok(()),
            };
            match result {
                Ok(()) => workflow.analyze().await,
                Err(e) => Err(e),
            }
        }
        Command::Reanalyze(hint) => {
            let result = match hint {
                Some(text) if workflow.coordinator().status() == Status::Editing => {
                    workflow.coordinator_mut().set_post_comment(text)
                }
                _ => Ok(()),
            };
            match result {
                Ok(()) => workflow.reanalyze().await,
                Err(e) => Err(e),
            }
        }
        Command::Add(draft) => match workflow.coordinator_mut().add_ingredient(draft) {
            Ok(id) => {
                writeln!(out, "Added {id}")?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        Command::Remove(id) => match workflow.coordinator_mut().remove_ingredient(&id) {
            Ok(Some(removed)) => {
                writeln!(out, "Removed {} ({})", removed.id, removed.name)?;
                Ok(())
            }
            Ok(None) => {
                writeln!(out, "No ingredient {id}")?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        Command::Set(id, patch) => workflow.coordinator_mut().update_ingredient(&id, patch),
        Command::Note(text) => workflow.coordinator_mut().set_post_comment(text),
        Command::Show => {
            write!(out, "{}", view::render(workflow.coordinator()))?;
            return Ok(Flow::Continue);
        }
        Command::Submit => match workflow.submit().await {
            Ok(id) => {
                info!(%id, "Meal saved");
                writeln!(out, "Saved meal {id}")?;
                return Ok(Flow::Stop);
            }
            Err(e) => Err(e),
        },
        Command::Discard => match workflow.coordinator_mut().discard() {
            Ok(()) => {
                writeln!(out, "Meal discarded")?;
                return Ok(Flow::Stop);
            }
            Err(e) => Err(e),
        },
        Command::Help => {
            write!(out, "{}", view::render_help())?;
            return Ok(Flow::Continue);
        }
        Command::Quit => return Ok(Flow::Stop),
    };

    match outcome {
        Ok(()) => write!(out, "{}", view::render(workflow.coordinator()))?,
        Err(e) => writeln!(out, "Error: {e}")?,
    }
    Ok(Flow::Continue)
}

/// Read commands from `input` until end of input, `quit`, a finished
/// session, or a notification on `quit`.
///
/// # Errors
///
/// Returns `AppError::Terminal` when reading input or writing output fails.
pub async fn run_session<G, S, R, W>(
    workflow: &mut Workflow<G, S>,
    input: R,
    out: &mut W,
    quit: &Notify,
) -> Result<(), AppError>
where
    G: AnalysisGateway,
    S: MealStore,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    write!(out, "{}", view::render(workflow.coordinator()))?;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let line = tokio::select! {
            biased;
            _ = quit.notified() => {
                writeln!(out)?;
                info!("Interrupted with nothing in flight");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            writeln!(out)?;
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        if execute(workflow, command, out).await? == Flow::Stop {
            break;
        }
    }

    out.flush()?;
    Ok(())
}

/// Route Ctrl-C: cancel the call in flight, or ask the shell to quit.
///
/// The returned `Notify` is signalled for the quit case.
pub fn spawn_interrupt_handler(cancel: CancelHandle) -> Arc<Notify> {
    let quit = Arc::new(Notify::new());
    let notify = Arc::clone(&quit);
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Cannot listen for Ctrl-C");
                return;
            }
            if cancel.cancel() {
                info!("Ctrl-C: cancelling call in flight");
            } else {
                notify.notify_one();
            }
        }
    });
    quit
}

#[cfg(test)]
#[path = "integration_tests.rs"]
mod tests;

//! Conversation controller: Telegram commands, roll-number queries, and the
//! PDF confirmation flow.

mod session;

pub use session::{MemorySessionStore, Session, SessionStore};

use crate::extractor::{FetchOrchestrator, HttpTransport, RollNumber};
use crate::pdf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use teloxide::utils::command::BotCommands;
use tracing::error;

const WELCOME: &str =
    "👋 Send your roll number to get your CGPA. Example: 21A91A0501";
const USAGE: &str = "Send a roll number (8-15 letters and digits) and I will look up \
your CGPA and semester marks. After a successful lookup, reply 'yes' to get the full \
marksheet as a PDF, or 'no' to skip it.";

/// Shared handler state, injected into every update.
pub struct AppState {
    pub orchestrator: FetchOrchestrator<HttpTransport>,
    pub sessions: Arc<dyn SessionStore>,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "welcome message with a usage example.")]
    Start,
    #[command(description = "how to use this bot.")]
    Help,
}

/// Runs the dispatcher until shutdown.
pub async fn run(bot: Bot, state: Arc<AppState>) {
    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_text));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    let reply = match cmd {
        Command::Start => WELCOME.to_string(),
        Command::Help => format!("{USAGE}\n\n{}", Command::descriptions()),
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Error boundary for free-text handling: nothing below may take the
/// dispatcher down, so failures become a logged apology.
async fn handle_text(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    if let Err(err) = process_text(&bot, &msg, &state).await {
        error!(error = %err, chat = %chat_id, "message handler failed");
        bot.send_message(chat_id, "😔 Something went wrong on our side. Please try again.")
            .await?;
    }
    Ok(())
}

async fn process_text(bot: &Bot, msg: &Message, state: &AppState) -> anyhow::Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let text = text.trim();
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0;

    // Pending PDF decision takes precedence; anything that is not a yes/no
    // falls through and is treated as a fresh roll-number query.
    if let Some(session) = state.sessions.get(user_id) {
        if session.awaiting_pdf {
            match parse_confirmation(text) {
                Some(true) => return send_marksheet(bot, msg, state, user_id, session).await,
                Some(false) => {
                    state.sessions.clear(user_id);
                    bot.send_message(
                        msg.chat.id,
                        "Okay, no PDF. Send another roll number anytime.",
                    )
                    .await?;
                    return Ok(());
                }
                None => {}
            }
        }
    }

    let outcome = state.orchestrator.get_cgpa(text).await;
    if !outcome.success {
        bot.send_message(msg.chat.id, outcome.message).await?;
        return Ok(());
    }

    // success implies the input validated and a CGPA is present
    if let (Ok(roll), Some(cgpa)) = (RollNumber::parse(text), outcome.cgpa.clone()) {
        let reply = success_reply(&roll, &cgpa);
        state.sessions.set(
            user_id,
            Session {
                roll,
                outcome,
                awaiting_pdf: true,
            },
        );
        bot.send_message(msg.chat.id, reply).await?;
    }
    Ok(())
}

async fn send_marksheet(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    user_id: u64,
    session: Session,
) -> anyhow::Result<()> {
    let cgpa = session.outcome.cgpa.as_deref().unwrap_or("-");
    match pdf::render_marksheet(&session.roll, &session.outcome.semesters, cgpa) {
        Ok(bytes) => {
            let document = InputFile::memory(bytes).file_name(marksheet_filename(&session.roll));
            bot.send_document(msg.chat.id, document).await?;
            state.sessions.clear(user_id);
        }
        Err(err) => {
            // Session is kept so the user can reply 'yes' again
            error!(error = %err, roll = %session.roll, "marksheet rendering failed");
            bot.send_message(msg.chat.id, err.user_message()).await?;
        }
    }
    Ok(())
}

/// Interprets a pending PDF decision. `None` means the text is neither, and
/// should be handled as a new query.
fn parse_confirmation(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "yes" | "y" | "pdf" => Some(true),
        "no" | "n" => Some(false),
        _ => None,
    }
}

fn success_reply(roll: &RollNumber, cgpa: &str) -> String {
    format!(
        "✅ Roll: {roll}\n📊 CGPA: {cgpa}\n\nWant the full marksheet as a PDF? Reply yes or no."
    )
}

fn marksheet_filename(roll: &RollNumber) -> String {
    format!("{roll}_marksheet.pdf")
}

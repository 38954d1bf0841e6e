//! Interactive text chat.
//!
//! Reads one message per line from stdin. Lines starting with `/` are
//! local commands and never reach the model.

use std::io::Write as _;

use shopdesk_agent::{AgentConfig, AppContext, ChatChannel, TurnStatus};
use shopdesk_core::{CustomerId, Language};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CommandError, render_cart};

/// Local REPL commands.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Cart,
    Reset,
    Quit,
    Help,
    Unknown(&'a str),
    Message(&'a str),
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Blank,
        "/cart" => Input::Cart,
        "/reset" => Input::Reset,
        "/quit" | "/exit" => Input::Quit,
        "/help" => Input::Help,
        cmd if cmd.starts_with('/') => Input::Unknown(cmd),
        message => Input::Message(message),
    }
}

const HELP: &str = "Commands: /cart shows your cart, /reset starts over, /quit exits.";

/// Run the chat REPL until `/quit` or end of input.
///
/// # Errors
///
/// Returns `CommandError` if configuration is invalid, text chat is not
/// configured, or the terminal cannot be read.
#[allow(clippy::print_stdout)]
pub async fn run(
    customer: Option<CustomerId>,
    language: Option<Language>,
) -> Result<(), CommandError> {
    let mut config = AgentConfig::from_env()?;
    if customer.is_some() {
        config.customer_id = customer;
    }
    if let Some(language) = language {
        config.language = language;
    }

    let context = AppContext::from_config(&config)?;
    let mut channel = ChatChannel::from_config(context.clone(), &config)?;
    if !channel.is_configured() {
        return Err(CommandError::ChatDisabled);
    }

    let name = context
        .active_customer()
        .map_or_else(|| "guest".to_string(), |c| c.first_name().to_string());
    println!("Chatting as {name} in {}. {HELP}", context.language().name());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Blank => {}
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Cart => print!("{}", render_cart(&context.shop().cart())),
            Input::Reset => {
                channel.reset();
                println!("Conversation cleared.");
            }
            Input::Unknown(cmd) => println!("Unknown command {cmd}. {HELP}"),
            Input::Message(message) => match channel.send(message).await {
                Ok(reply) => {
                    println!("{}", reply.text);
                    match reply.status {
                        TurnStatus::Completed => {}
                        TurnStatus::Exhausted => {
                            tracing::warn!(rounds = reply.rounds, "tool round budget exhausted");
                        }
                        TurnStatus::Discarded => println!("(conversation was reset)"),
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "chat turn failed");
                    println!("{}", e.user_message());
                }
            },
        }
    }

    Ok(())
}

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serenity::{
    all::CommandInteraction,
    builder::{CreateCommand, CreateInteractionResponse, CreateInteractionResponseMessage},
    http::Http,
    prelude::Context,
};
use tracing::{event, Level};

use crate::{codenames::session::GameServices, component::ComponentMap, config, wiki::Wiki, Error, Result};

mod base64;
mod codenames;
pub mod common;
mod wiki;

pub use common::CommandResponse;

type DynCommand = Box<dyn DiscordCommand + Sync + Send>;

macro_rules! discord_command {
    ($cmd:expr) => {
        Box::new($cmd) as DynCommand
    };
}

/// All callable commands, by name.
pub static COMMANDS: Lazy<HashMap<&'static str, DynCommand>> = Lazy::new(|| {
    [
        discord_command!(codenames::COMMAND),
        discord_command!(base64::COMMAND),
        discord_command!(base64::MESSAGE_COMMAND),
        discord_command!(wiki::SEARCH_COMMAND),
        discord_command!(wiki::LIST_COMMAND),
    ]
    .into_iter()
    .map(|command| (command.name(), command))
    .collect()
});

#[derive(Clone)]
pub struct CommandArguments {
    pub context:        Arc<Context>,
    pub config:         Arc<config::Configuration>,
    pub error_messages: Arc<config::ErrorMessages>,
    pub component_map:  ComponentMap,
    /// Present when Codenames is configured.
    pub games:          Option<GameServices>,
    pub wiki:           Arc<Wiki>,
}

#[async_trait]
pub trait DiscordCommand {
    /// Register the discord command.
    fn register(&self) -> CreateCommand;

    /// Run the discord command
    async fn run(&self, command: Arc<CommandInteraction>, args: CommandArguments) -> Result<CommandResponse>;

    /// The name of the command
    fn name(&self) -> &'static str;
}

/// Every command's registration, for `Command::set_global_commands`.
pub fn registrations() -> Vec<CreateCommand> { COMMANDS.values().map(|command| command.register()).collect() }

/// Run a command specified by its name.
pub async fn run_command(command: CommandInteraction, args: CommandArguments) {
    let command_name = command.data.name.clone();
    let http = args.context.http.clone();
    let error_messages = args.error_messages.clone();

    let Some(cmd) = COMMANDS.get(command_name.as_str())
    else {
        // Respond with an ephemeral error message, this means that only the user who
        // started the interaction can see the error.
        CommandResponse::EphemeralString(format!("Command \"{command_name}\" doesn't exist."))
            .send(&command, &http)
            .await;
        return;
    };

    let command = Arc::new(command);
    match cmd.run(command.clone(), args).await {
        Ok(response) => response.send(&command, &http).await,
        Err(e) => {
            e.report();
            notify_user_of_error(e, &http, &command, &error_messages).await;
        }
    }
}

/// The ephemeral message shown to the user when something they did failed.
pub fn error_response(e: &Error, error_messages: &config::ErrorMessages) -> CreateInteractionResponse {
    let (prefix, suffix) = pick_error_message(error_messages);
    let msg = format!("{prefix}: *[{}] {e}.*\n{suffix}", e.code());
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(msg)
            .ephemeral(true),
    )
}

pub async fn notify_user_of_error(
    e: Error,
    http: &Http,
    command: &CommandInteraction,
    error_messages: &config::ErrorMessages,
) {
    let response = error_response(&e, error_messages);
    if let Err(why) = command.create_response(http, response).await {
        event!(
            Level::ERROR,
            "Couldn't respond to command ({}): {why}",
            command.data.name.as_str()
        );
    }
}

/// Randomly select an error message pre/postfix
fn pick_error_message(error_messages: &config::ErrorMessages) -> (String, String) {
    use rand::seq::SliceRandom;
    error_messages
        .messages
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| ("There was an error".to_string(), "Please try again.".to_string()))
}

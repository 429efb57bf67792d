use serenity::{
    all::{CommandDataOption, CommandDataOptionValue, CommandInteraction, UserId},
    builder::{CreateActionRow, CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage},
    http::Http,
};
use tracing::{event, Level};

use crate::{Error, Result};

/// Gets the suboptions of a subcommand or subcommandgroup.
///
/// # Errors
///
/// [`Error::ExpectedSuboption`] if `option.value` isn't a
/// [`CommandDataOptionValue::SubCommand`] or [`CommandDataOptionValue::SubCommandGroup`]
pub fn suboptions(option: &CommandDataOption) -> Result<&Vec<CommandDataOption>> {
    match &option.value {
        CommandDataOptionValue::SubCommand(options) | CommandDataOptionValue::SubCommandGroup(options) => {
            Ok(options)
        }
        _ => Err(Error::ExpectedSuboption),
    }
}

pub fn string_option<'a>(options: &'a [CommandDataOption], name: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_str())
}

pub fn integer_option(options: &[CommandDataOption], name: &str) -> Option<i64> {
    options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_i64())
}

pub fn user_option(options: &[CommandDataOption], name: &str) -> Option<UserId> {
    options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_user_id())
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum CommandResponse {
    String(String),
    EphemeralString(String),
    Embed(Box<CreateEmbed>),
    EphemeralEmbed(Box<CreateEmbed>),
    EmbedWithComponents(Box<CreateEmbed>, Vec<CreateActionRow>),
    Message(CreateInteractionResponseMessage),
    None,
}

impl CommandResponse {
    pub fn new_string(s: impl Into<String>) -> Self { Self::from(s.into()) }

    pub async fn send(self, command: &CommandInteraction, http: &Http) {
        let message = CreateInteractionResponseMessage::new();
        let response_message = match self {
            CommandResponse::String(s) => message.content(s),
            CommandResponse::EphemeralString(s) => message.content(s).ephemeral(true),
            CommandResponse::Embed(embed) => message.embed(*embed),
            CommandResponse::EphemeralEmbed(embed) => message.embed(*embed).ephemeral(true),
            CommandResponse::EmbedWithComponents(embed, components) => {
                message.embed(*embed).components(components)
            }
            CommandResponse::Message(message) => message,
            CommandResponse::None => return,
        };
        let response = CreateInteractionResponse::Message(response_message);
        if let Err(e) = command.create_response(http, response).await {
            event!(
                Level::ERROR,
                "Couldn't respond to command ({}): {e}",
                command.data.name.as_str()
            );
        }
    }
}

impl From<String> for CommandResponse {
    fn from(value: String) -> Self { Self::String(value) }
}

impl From<CreateEmbed> for CommandResponse {
    fn from(value: CreateEmbed) -> Self { Self::Embed(Box::new(value)) }
}

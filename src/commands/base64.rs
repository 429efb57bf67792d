use std::sync::Arc;

use async_trait::async_trait;
use base64::{
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine,
};
use serenity::{
    all::{CommandInteraction, CommandOptionType, CommandType, ResolvedTarget},
    builder::{CreateCommand, CreateCommandOption, CreateEmbed, CreateEmbedFooter},
    model::Colour,
};

use super::{common, CommandArguments, CommandResponse, DiscordCommand};
use crate::{Error, Result};

pub const COMMAND: Base64 = Base64;
pub const MESSAGE_COMMAND: DecodeMessage = DecodeMessage;

/// Decoded words no longer than this are taken for accidental matches.
const MIN_DECODED_LEN: usize = 8;

pub struct Base64;

#[async_trait]
impl DiscordCommand for Base64 {
    fn register(&self) -> CreateCommand {
        let options = vec![
            CreateCommandOption::new(CommandOptionType::SubCommand, "encode", "Encode to base64").add_sub_option(
                CreateCommandOption::new(CommandOptionType::String, "text", "The text to encode").required(true),
            ),
            CreateCommandOption::new(CommandOptionType::SubCommand, "decode", "Decode from base64").add_sub_option(
                CreateCommandOption::new(CommandOptionType::String, "text", "The base64 to decode").required(true),
            ),
        ];

        CreateCommand::new(self.name())
            .description("Encode and decode base64")
            .set_options(options)
    }

    async fn run(&self, command: Arc<CommandInteraction>, _args: CommandArguments) -> Result<CommandResponse> {
        let option = command.data.options.first().ok_or(Error::InternalLogic)?;
        let options = common::suboptions(option)?;
        let text = common::string_option(options, "text").ok_or(Error::ExpectedSuboption)?;

        match option.name.as_str() {
            "encode" => {
                let embed = CreateEmbed::new()
                    .title("Encode to base64")
                    .description(encode(text))
                    .colour(Colour::DARK_GREEN)
                    .footer(CreateEmbedFooter::new(format!("Encoded by {}", command.user.name)));
                Ok(CommandResponse::EphemeralEmbed(Box::new(embed)))
            }
            "decode" => {
                let decoded =
                    decode(text).ok_or_else(|| Error::Base64Decode(format!("\"{text}\" isn't base64 text")))?;
                Ok(CommandResponse::EphemeralString(decoded))
            }
            _ => Err(Error::InternalLogic),
        }
    }

    fn name(&self) -> &'static str { "base64" }
}

/// The "Decode base64" entry in a message's context menu.
pub struct DecodeMessage;

#[async_trait]
impl DiscordCommand for DecodeMessage {
    fn register(&self) -> CreateCommand { CreateCommand::new(self.name()).kind(CommandType::Message) }

    async fn run(&self, command: Arc<CommandInteraction>, _args: CommandArguments) -> Result<CommandResponse> {
        let Some(ResolvedTarget::Message(message)) = command.data.target()
        else {
            return Err(Error::InternalLogic);
        };

        let decoded = decode_all(&message.content);
        if decoded.is_empty() {
            return Ok(CommandResponse::EphemeralString("No Base64 Found.".to_string()));
        }

        let embed = CreateEmbed::new()
            .title("Decoded Links")
            .description(format!("> {}", decoded.join("\n\n> ")))
            .colour(Colour::DARK_GREEN);
        Ok(CommandResponse::EphemeralEmbed(Box::new(embed)))
    }

    fn name(&self) -> &'static str { "Decode base64" }
}

pub fn encode(text: &str) -> String { STANDARD.encode(text) }

/// Decodes standard or URL-safe base64, padded or not. `None` unless the result is
/// UTF-8 text.
pub fn decode(text: &str) -> Option<String> {
    let trimmed = text.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Every word of `content` that decodes to more than a few characters, in order.
pub fn decode_all(content: &str) -> Vec<String> {
    words(content)
        .filter_map(decode)
        .filter(|decoded| decoded.chars().count() > MIN_DECODED_LEN)
        .collect()
}

/// Whitespace separated words with inline code ticks removed.
fn words(content: &str) -> impl Iterator<Item = &str> {
    content
        .split_whitespace()
        .flat_map(|word| {
            match word.strip_prefix('`').and_then(|w| w.strip_suffix('`')) {
                Some(inner) => vec![inner.trim()],
                None if word.contains('`') => word.split('`').collect(),
                None => vec![word],
            }
        })
        .filter(|word| !word.is_empty())
}

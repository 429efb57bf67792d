use std::sync::Arc;

use async_trait::async_trait;
use serenity::{
    all::{CommandInteraction, CommandOptionType},
    builder::{CreateCommand, CreateCommandOption, CreateEmbed, CreateEmbedFooter},
    model::Colour,
};

use super::{common, CommandArguments, CommandResponse, DiscordCommand};
use crate::{wiki, Error, Result};

pub const SEARCH_COMMAND: Search = Search;
pub const LIST_COMMAND: List = List;

const EMBED_COLOUR: Colour = Colour::new(0x2B2D31);

/// Discord caps embed titles at 256 characters.
const MAX_QUERY_IN_TITLE: usize = 200;

pub struct Search;

#[async_trait]
impl DiscordCommand for Search {
    fn register(&self) -> CreateCommand {
        let options = vec![
            CreateCommandOption::new(CommandOptionType::String, "query", "What to look for").required(true),
        ];

        CreateCommand::new(self.name())
            .description("Search for query in the wiki")
            .set_options(options)
    }

    async fn run(&self, command: Arc<CommandInteraction>, args: CommandArguments) -> Result<CommandResponse> {
        let query = common::string_option(&command.data.options, "query").ok_or(Error::ExpectedSuboption)?;

        let index = args.wiki.index().await?;
        let results = wiki::search(&index.entries, query);
        let description = if results.is_empty() {
            "No results found.".to_string()
        } else {
            wiki::format_results(&results)
        };

        let embed = CreateEmbed::new()
            .title(format!(
                "Search Results for {}",
                wiki::shorten(query, MAX_QUERY_IN_TITLE)
            ))
            .description(description)
            .colour(EMBED_COLOUR);
        Ok(CommandResponse::EphemeralEmbed(Box::new(embed)))
    }

    fn name(&self) -> &'static str { "search" }
}

pub struct List;

#[async_trait]
impl DiscordCommand for List {
    fn register(&self) -> CreateCommand {
        let options = vec![CreateCommandOption::new(
            CommandOptionType::Integer,
            "url_num",
            "Number of URLs to display",
        )
        .min_int_value(1)
        .max_int_value(wiki::MAX_LIST_LINKS as u64)
        .required(true)];

        CreateCommand::new(self.name())
            .description("Displays random URL(s) from the list of lists.")
            .set_options(options)
    }

    async fn run(&self, command: Arc<CommandInteraction>, args: CommandArguments) -> Result<CommandResponse> {
        let requested = common::integer_option(&command.data.options, "url_num").ok_or(Error::ExpectedSuboption)?;

        let links = args.wiki.list_of_lists().await?;
        if links.is_empty() {
            return Err(Error::CommandMisuse("The list of lists is empty right now".to_string()));
        }
        let picked = wiki::sample(&links, wiki::list_count(requested), &mut rand::thread_rng());

        let embed = CreateEmbed::new()
            .title(list_title(picked.len()))
            .description(
                picked
                    .iter()
                    .map(|link| link.to_string())
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
            .colour(EMBED_COLOUR)
            .footer(CreateEmbedFooter::new(format!("Source: {}", args.wiki.list_source())));
        Ok(CommandResponse::EphemeralEmbed(Box::new(embed)))
    }

    fn name(&self) -> &'static str { "list" }
}

fn list_title(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("Here are {count} random URL{plural} from the list of lists:")
}

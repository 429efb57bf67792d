use std::sync::Arc;

use async_trait::async_trait;
use serenity::{
    all::{CommandInteraction, CommandOptionType, UserId},
    builder::{
        CreateCommand, CreateCommandOption, CreateEmbed, CreateInteractionResponse,
        CreateInteractionResponseMessage,
    },
    prelude::Context,
};
use uuid::Uuid;

use super::{common, CommandArguments, CommandResponse, DiscordCommand};
use crate::{
    codenames::{
        self,
        io::Tone,
        lobby::Lobby,
        messages,
        session::GameServices,
        stats::{PlayerStats, Ranking, Record, MAX_LEADERBOARD_SIZE},
        PlayerId,
    },
    config, Error, Result,
};

mod channel;
mod lobby;
mod roles;

pub const COMMAND: Codenames = Codenames;

const DEFAULT_LEADERBOARD_SIZE: i64 = 10;
const EMPTY: &str = "\u{200b}";
const STATS_NOTE: &str =
    "Codenames is a **team game**, so the win-rate statistics **do not** exactly reflect player's skill.";

pub struct Codenames;

#[async_trait]
impl DiscordCommand for Codenames {
    fn register(&self) -> CreateCommand {
        let options = vec![
            CreateCommandOption::new(CommandOptionType::SubCommand, "start", "Start a new game of codenames."),
            CreateCommandOption::new(CommandOptionType::SubCommand, "guide", "Guide to the game."),
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "leaderboard",
                "Show the Codenames leaderboard.",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::String, "category", "Category to show leaderboard for")
                    .add_string_choice("Overall", Ranking::Overall.name())
                    .add_string_choice("Captain", Ranking::Captain.name())
                    .add_string_choice("Team Player", Ranking::Team.name())
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "limit",
                    "Number of players to show (default 10, max 20)",
                )
                .min_int_value(1)
                .max_int_value(u64::from(MAX_LEADERBOARD_SIZE)),
            ),
            CreateCommandOption::new(CommandOptionType::SubCommand, "stats", "Show player's statistics.")
                .add_sub_option(CreateCommandOption::new(
                    CommandOptionType::User,
                    "member",
                    "Server member whose statistics will be displayed",
                )),
        ];

        CreateCommand::new(self.name())
            .description("Play Codenames")
            .dm_permission(false)
            .set_options(options)
    }

    async fn run(&self, command: Arc<CommandInteraction>, args: CommandArguments) -> Result<CommandResponse> {
        let option = command.data.options.first().ok_or(Error::InternalLogic)?;
        let options = common::suboptions(option)?;

        match option.name.as_str() {
            "guide" => {
                let embed = CreateEmbed::new()
                    .title("Codenames Guide")
                    .description(messages::GUIDE)
                    .colour(channel::colour(Tone::Neutral));
                Ok(embed.into())
            }
            "start" => start(&command, &args).await,
            "leaderboard" => {
                let ranking = common::string_option(options, "category")
                    .unwrap_or(Ranking::Overall.name())
                    .parse::<Ranking>()
                    .map_err(Error::CommandMisuse)?;
                let limit = common::integer_option(options, "limit")
                    .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
                    .clamp(1, i64::from(MAX_LEADERBOARD_SIZE));
                leaderboard(&args, ranking, limit as u32).await
            }
            "stats" => {
                let member = common::user_option(options, "member").unwrap_or(command.user.id);
                stats(&args, member).await
            }
            _ => Err(Error::InternalLogic),
        }
    }

    fn name(&self) -> &'static str { "codenames" }
}

fn services(args: &CommandArguments) -> Result<(&GameServices, &config::codenames::Codenames)> {
    match (args.games.as_ref(), args.config.codenames.as_ref()) {
        (Some(games), Some(settings)) => Ok((games, settings)),
        _ => Err(Error::FeatureDisabled("Codenames isn't configured".to_string())),
    }
}

/// Posts the sign-up message and starts listening to its buttons.
async fn start(command: &CommandInteraction, args: &CommandArguments) -> Result<CommandResponse> {
    let (_, settings) = services(args)?;

    if let Some(channel) = settings.channel {
        if command.channel_id.get() != channel {
            return Err(Error::CommandMisuse(format!(
                "Codenames can only be started in <#{channel}>"
            )));
        }
    }
    if settings.host_role.is_some() && !lobby::holds_host_role(command.member.as_deref(), settings.host_role) {
        return Err(codenames::Error::NotHost.into());
    }

    let id = format!("codenames-{}", Uuid::new_v4().simple());
    let state = Lobby::new(PlayerId(command.user.id.get()), settings.default_dictionary.clone());
    let response = CreateInteractionResponseMessage::new()
        .embed(lobby::embed(&state, settings))
        .components(lobby::components(&id, &state, settings));
    command
        .create_response(&args.context.http, CreateInteractionResponse::Message(response))
        .await?;
    let message = command.get_response(&args.context.http).await?;

    let component = lobby::LobbyComponent::new(
        id.clone(),
        state,
        command.channel_id,
        message.id,
        command.guild_id,
        settings.clone(),
    );
    args.component_map
        .insert(id, Arc::new(component), Some(settings.lobby_timeout()))
        .await;

    Ok(CommandResponse::None)
}

async fn leaderboard(args: &CommandArguments, ranking: Ranking, limit: u32) -> Result<CommandResponse> {
    let (games, _) = services(args)?;
    let standings = games.stats.leaderboard(ranking, limit).await?;
    if standings.is_empty() {
        return Ok(CommandResponse::new_string("No data available for the leaderboard."));
    }

    let mut embed = CreateEmbed::new()
        .title(format!("Leaderboard • {}", title_case(ranking.name())))
        .colour(channel::colour(Tone::Neutral));
    for (rank, standing) in standings.iter().enumerate() {
        let name = display_name(&args.context, standing.player()).await;
        embed = embed.field(
            format!("{}. {name}", rank + 1),
            standing_line(standing.games, standing.wins, standing.winrate),
            false,
        );
    }

    Ok(embed.into())
}

async fn stats(args: &CommandArguments, member: UserId) -> Result<CommandResponse> {
    let (games, _) = services(args)?;
    let user = member.to_user(&*args.context).await?;
    let name = format!("**{}**", user.global_name.clone().unwrap_or_else(|| user.name.clone()));
    let title = format!("{name}'s statistics");

    if member == args.context.cache.current_user().id {
        let embed = CreateEmbed::new()
            .title(title)
            .description("Best game master: **100%**")
            .colour(channel::colour(Tone::Neutral));
        return Ok(embed.into());
    }

    let stats = games
        .stats
        .stats(PlayerId(member.get()))
        .await?
        .ok_or(Error::NeverPlayed(name))?;

    Ok(stats_embed(title, &stats).thumbnail(user.face()).into())
}

fn stats_embed(title: String, stats: &PlayerStats) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(format!(
            "Playing Codenames since **{}**",
            stats.first_played.format("%d/%m/%Y")
        ))
        .colour(channel::colour(Tone::Neutral))
        .field("Total", record_field(stats.overall()), true)
        .field("In the team", record_field(stats.in_team()), true)
        .field("As spymaster", record_field(stats.as_captain()), true)
        .field(EMPTY, STATS_NOTE, false)
}

fn record_field(record: Record) -> String {
    format!(
        "Games played: **{}**\nGames won: **{}**\nWinrate: **{}**",
        record.games,
        record.wins,
        record.winrate()
    )
}

fn standing_line(games: i64, wins: i64, winrate: f64) -> String {
    format!("Games: {games} • Wins: {wins} • Winrate: {:.2}%", winrate * 100.0)
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

async fn display_name(context: &Context, player: PlayerId) -> String {
    match UserId::new(player.get()).to_user(context).await {
        Ok(user) => user.global_name.unwrap_or(user.name),
        Err(_) => player.mention(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_show_a_dash_without_games() {
        assert_eq!(
            record_field(Record { games: 0, wins: 0 }),
            "Games played: **0**\nGames won: **0**\nWinrate: **-**"
        );
        assert_eq!(
            record_field(Record { games: 3, wins: 2 }),
            "Games played: **3**\nGames won: **2**\nWinrate: **67%**"
        );
    }

    #[test]
    fn leaderboard_lines_use_two_decimals() {
        assert_eq!(standing_line(3, 2, 2.0 / 3.0), "Games: 3 • Wins: 2 • Winrate: 66.67%");
        assert_eq!(title_case("captain"), "Captain");
    }
}

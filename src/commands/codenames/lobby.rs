//! The sign-up message of a game and what its buttons do.

use std::sync::Arc;

use async_trait::async_trait;
use rand::{rngs::StdRng, SeedableRng};
use serenity::{
    all::{
        ButtonStyle, ChannelId, ComponentInteraction, ComponentInteractionDataKind, GuildId, Member, MessageId,
        ReactionType,
    },
    builder::{
        CreateActionRow, CreateButton, CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage,
        CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, EditMessage,
    },
    client::Cache,
    http::Http,
    prelude::Context,
};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::{channel::DiscordChannel, roles};
use crate::{
    codenames::{
        self,
        lobby::{Lobby, LobbyState, Slot, Teams},
        session::{self, GameServices},
        words::Dictionary,
        PlayerId, Team,
    },
    commands::{error_response, CommandArguments},
    component::{split_custom_id, Component},
    config,
    Error, Result,
};

const EMPTY: &str = "\u{200b}";

const SETUP: &str = "Setup";
const SETUP_INSTRUCTIONS: &str = "Register by clicking one of the buttons in the first row.";
const SETUP_OVER: &str = "Registration is over";
const SETUP_CANCELLED: &str = "The game has been cancelled.";
const RANDOM_SLOT: &str = "Random (randomly spread across teams)";
const NOBODY: &str = "Nobody is ready to play :(";

mod action {
    pub const RED: &str = "red";
    pub const BLUE: &str = "blue";
    pub const RANDOM: &str = "random";
    pub const LEAVE: &str = "leave";
    pub const CANCEL: &str = "cancel";
    pub const START: &str = "start";
    pub const DICTIONARY: &str = "dictionary";
}

/// Whether `member` holds the configured host role. Without one, nobody does.
pub fn holds_host_role(member: Option<&Member>, host_role: Option<u64>) -> bool {
    match (member, host_role) {
        (Some(member), Some(role)) => member.roles.iter().any(|r| r.get() == role),
        _ => false,
    }
}

fn mentions(players: &[PlayerId]) -> String {
    if players.is_empty() {
        return EMPTY.to_string();
    }
    players.iter().map(|p| p.mention()).collect::<Vec<_>>().join("\n")
}

pub fn embed(lobby: &Lobby, settings: &config::codenames::Codenames) -> CreateEmbed {
    let open = lobby.state() == LobbyState::Open;
    let title = match lobby.state() {
        LobbyState::Open => SETUP,
        LobbyState::Cancelled => SETUP_CANCELLED,
        _ => SETUP_OVER,
    };
    let mut embed = CreateEmbed::new()
        .title(title)
        .colour(super::channel::colour(codenames::io::Tone::Neutral));

    let nobody = [Slot::Team(Team::Red), Slot::Undecided, Slot::Team(Team::Blue)]
        .iter()
        .all(|slot| lobby.members(*slot).is_empty());
    if nobody {
        embed = embed.description(NOBODY);
    } else {
        embed = embed.field(Team::Red.name(), mentions(lobby.members(Slot::Team(Team::Red))), true);
        if open {
            embed = embed.field(RANDOM_SLOT, mentions(lobby.members(Slot::Undecided)), true);
        }
        embed = embed.field(Team::Blue.name(), mentions(lobby.members(Slot::Team(Team::Blue))), true);
    }

    if open {
        embed = embed.field(EMPTY, format!("-# {SETUP_INSTRUCTIONS}"), false);
    }
    embed.field("Dictionary", settings.dictionary_label(lobby.dictionary()), false)
}

pub fn components(id: &str, lobby: &Lobby, settings: &config::codenames::Codenames) -> Vec<CreateActionRow> {
    if lobby.state() != LobbyState::Open {
        return Vec::new();
    }

    let custom_id = |action: &str| format!("{id}{}{action}", crate::component::ID_SEPARATOR);
    let emoji = |e: &str| ReactionType::Unicode(e.to_string());

    let enrollment = vec![
        CreateButton::new(custom_id(action::RED))
            .emoji(emoji("🟥"))
            .style(ButtonStyle::Secondary),
        CreateButton::new(custom_id(action::RANDOM))
            .emoji(emoji("❔"))
            .style(ButtonStyle::Secondary),
        CreateButton::new(custom_id(action::BLUE))
            .emoji(emoji("🟦"))
            .style(ButtonStyle::Secondary),
    ];
    let management = vec![
        CreateButton::new(custom_id(action::LEAVE))
            .label("Leave")
            .emoji(emoji("❌"))
            .style(ButtonStyle::Secondary),
        CreateButton::new(custom_id(action::CANCEL))
            .label("Cancel")
            .emoji(emoji("⛔"))
            .style(ButtonStyle::Danger),
        CreateButton::new(custom_id(action::START))
            .label("Start")
            .emoji(emoji("▶️"))
            .style(ButtonStyle::Success),
    ];
    let options = settings
        .dictionaries
        .iter()
        .map(|entry| CreateSelectMenuOption::new(&entry.label, &entry.name))
        .collect();
    let dictionaries = CreateSelectMenu::new(custom_id(action::DICTIONARY), CreateSelectMenuKind::String {
        options,
    })
    .placeholder(format!("Current: {}", settings.dictionary_label(lobby.dictionary())))
    .min_values(1)
    .max_values(1);

    vec![
        CreateActionRow::Buttons(enrollment),
        CreateActionRow::Buttons(management),
        CreateActionRow::SelectMenu(dictionaries),
    ]
}

/// A lobby waiting for players, registered in the [`crate::component::ComponentMap`]
/// under its id.
pub struct LobbyComponent {
    id:       String,
    lobby:    Arc<Mutex<Lobby>>,
    room:     ChannelId,
    message:  MessageId,
    guild:    Option<GuildId>,
    settings: config::codenames::Codenames,
}

impl LobbyComponent {
    pub fn new(
        id: String,
        lobby: Lobby,
        room: ChannelId,
        message: MessageId,
        guild: Option<GuildId>,
        settings: config::codenames::Codenames,
    ) -> Self {
        Self {
            id,
            lobby: Arc::new(Mutex::new(lobby)),
            room,
            message,
            guild,
            settings,
        }
    }

    fn update(&self, lobby: &Lobby) -> CreateInteractionResponse {
        CreateInteractionResponse::UpdateMessage(
            CreateInteractionResponseMessage::new()
                .embed(embed(lobby, &self.settings))
                .components(components(&self.id, lobby, &self.settings)),
        )
    }

    async fn handle(
        &self,
        action: &str,
        interaction: &ComponentInteraction,
        args: &CommandArguments,
    ) -> Result<CreateInteractionResponse> {
        let actor = PlayerId(interaction.user.id.get());
        let host = holds_host_role(interaction.member.as_ref(), self.settings.host_role);
        let mut lobby = self.lobby.lock().await;

        match action {
            action::RED => lobby.enroll(actor, Slot::Team(Team::Red))?,
            action::BLUE => lobby.enroll(actor, Slot::Team(Team::Blue))?,
            action::RANDOM => lobby.enroll(actor, Slot::Undecided)?,
            action::LEAVE => {
                lobby.leave(actor)?;
            }
            action::DICTIONARY => {
                lobby.ensure_host(actor, host)?;
                let ComponentInteractionDataKind::StringSelect { values } = &interaction.data.kind
                else {
                    return Err(Error::InternalLogic);
                };
                let name = values.first().ok_or(Error::InternalLogic)?;
                lobby.set_dictionary(name.as_str())?;
            }
            action::CANCEL => {
                lobby.ensure_host(actor, host)?;
                lobby.cancel()?;
                self.retire(args).await;
                info!("Codenames lobby {} cancelled by {actor}", self.id);
            }
            action::START => {
                lobby.ensure_host(actor, host)?;
                let services = args
                    .games
                    .clone()
                    .ok_or_else(|| Error::FeatureDisabled("Codenames isn't configured".to_string()))?;
                let dictionary = services.words.load(lobby.dictionary()).await?;
                let teams = lobby.lock(&mut StdRng::from_entropy())?;
                self.retire(args).await;
                info!(
                    "Codenames lobby {} starting with {} players and dictionary \"{}\"",
                    self.id,
                    teams.all().count(),
                    dictionary.name()
                );

                tokio::spawn(run_game(Game {
                    lobby: self.lobby.clone(),
                    teams,
                    dictionary,
                    context: args.context.clone(),
                    room: self.room,
                    guild: self.guild,
                    roles: self.settings.roles,
                    services,
                }));
            }
            _ => return Err(Error::InternalLogic),
        }

        Ok(self.update(&lobby))
    }

    /// Stops routing button presses here.
    async fn retire(&self, args: &CommandArguments) {
        if let Err(e) = args.component_map.timeout(&self.id).await {
            warn!("{e}");
        }
    }
}

#[async_trait]
impl Component for LobbyComponent {
    async fn run(&self, interaction: ComponentInteraction, args: CommandArguments) -> anyhow::Result<()> {
        let (_, action) = split_custom_id(&interaction.data.custom_id);
        let response = match self.handle(action, &interaction, &args).await {
            Ok(response) => response,
            Err(e) => {
                if !matches!(&e, Error::Codenames(inner) if inner.is_recoverable()) {
                    e.report();
                }
                error_response(&e, &args.error_messages)
            }
        };

        interaction.create_response(&args.context.http, response).await?;
        Ok(())
    }

    /// Lobbies that were never started or cancelled close on expiry.
    async fn cleanup(&self, id: String, http: Arc<Http>, _cache: Arc<Cache>) -> anyhow::Result<()> {
        let mut lobby = self.lobby.lock().await;
        if lobby.cancel().is_err() {
            return Ok(());
        }

        info!("Codenames lobby {id} expired");
        let edit = EditMessage::new()
            .embed(embed(&lobby, &self.settings))
            .components(Vec::new());
        self.room.edit_message(&*http, self.message, edit).await?;
        Ok(())
    }
}

struct Game {
    lobby:      Arc<Mutex<Lobby>>,
    teams:      Teams,
    dictionary: Dictionary,
    context:    Arc<Context>,
    room:       ChannelId,
    guild:      Option<GuildId>,
    roles:      Option<config::codenames::TeamRoles>,
    services:   GameServices,
}

async fn run_game(game: Game) {
    let Game {
        lobby,
        teams,
        dictionary,
        context,
        room,
        guild,
        roles,
        services,
    } = game;

    let channel = Arc::new(DiscordChannel::new(context.clone(), room));
    let mut rng = StdRng::from_entropy();

    let (red, blue) = match session::form_teams(channel.as_ref(), &services, &teams, &mut rng).await {
        Ok(rosters) => rosters,
        Err(e) => {
            error!("Couldn't form the Codenames teams: {e}");
            return;
        }
    };
    if let Err(e) = lobby.lock().await.mark_ready() {
        warn!("Codenames lobby wasn't selecting captains: {e}");
    }

    let grants = match (roles, guild) {
        (Some(roles), Some(guild)) => {
            let grants = roles::grants(&roles, &red, &blue);
            roles::assign(&context.http, guild, &grants).await;
            Some((guild, grants))
        }
        _ => None,
    };

    match session::play(channel, &services, red, blue, &dictionary, &mut rng).await {
        Ok(outcome) => info!("Codenames game in {room} finished: {outcome:?}"),
        Err(e) => error!("Codenames game in {room} failed: {e}"),
    }

    if let Some((guild, grants)) = grants {
        roles::clear(&context.http, guild, &grants).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_buttons_once_registration_is_over() {
        let settings = config::codenames::Codenames::default();
        let mut lobby = Lobby::new(PlayerId(1), "std");
        assert_eq!(components("lobby", &lobby, &settings).len(), 3);

        lobby.cancel().unwrap();
        assert!(components("lobby", &lobby, &settings).is_empty());
    }

    #[test]
    fn host_role_needs_a_member_and_a_configured_role() {
        assert!(!holds_host_role(None, Some(42)));
        assert!(!holds_host_role(None, None));
    }

    #[test]
    fn empty_slots_show_a_placeholder() {
        assert_eq!(mentions(&[]), EMPTY);
        assert_eq!(mentions(&[PlayerId(1), PlayerId(2)]), "<@1>\n<@2>");
    }
}

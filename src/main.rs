use std::{path::PathBuf, str::FromStr, sync::Arc};

use fmhy_bot::{
    codenames::{
        artifacts::ArtifactStore,
        render::BoardRenderer,
        session::GameServices,
        stats::StatsStore,
        words::WordBank,
    },
    commands,
    component::ComponentMap,
    config,
    links::LinkChecker,
    paths,
    wiki::Wiki,
    Error,
};
use serenity::{
    all::*,
    async_trait,
    builder::{CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage},
    client,
    gateway::ActivityData,
    prelude::Context,
    Client,
};
use structopt::{
    clap::AppSettings::{ColorAuto, ColoredHelp, VersionlessSubcommands},
    StructOpt,
};
use tokio::task;
use tracing::{debug, error, info, metadata::LevelFilter, warn};
use tracing_subscriber::{prelude::*, util::SubscriberInitExt, EnvFilter, Layer};

const NAME: &str = "fmhy-bot";

/// Discord gateway intents
const INTENTS: GatewayIntents = GatewayIntents::GUILD_MESSAGES
    .union(GatewayIntents::non_privileged())
    .union(GatewayIntents::DIRECT_MESSAGES)
    .union(GatewayIntents::GUILD_MESSAGE_REACTIONS)
    .union(GatewayIntents::MESSAGE_CONTENT)
    .union(GatewayIntents::GUILDS);

#[derive(StructOpt, Debug, Clone)]
#[structopt(name = NAME, about, author)]
#[structopt(
    global_setting(ColorAuto),
    global_setting(ColoredHelp),
    global_setting(VersionlessSubcommands)
)]
struct Options {
    #[structopt(long)]
    /// Specify a configuration file to use instead of the default.
    config: Option<PathBuf>,

    #[structopt(short, long, name = "LOGLEVEL")]
    /// One of error, warn, info, debug, trace or off.
    log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, Default)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
    Off,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match &*s.to_lowercase() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            "off" => Ok(Self::Off),
            _ => {
                Err(format!(
                    "\"{s}\" isn't a LogLevel variant. They are as follows: Error, Warn, Info, Debug, \
                     Trace, Off"
                ))
            }
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
            LogLevel::Off => Self::OFF,
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let Options { config, log_level } = Options::from_args();

    // Setup logging
    let log_level: LevelFilter = log_level.unwrap_or_default().into();
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(filter))
        .init();
    if let Ok(path) = dotenv {
        debug!("Loaded environment from \"{}\"", path.display());
    }

    // Get the configuration file path and read the configuration from it.
    let config_path = match config {
        Some(x) => x,
        None => {
            paths::CONFIGURATION_FILE
                .clone()
                .ok_or(Error::MissingConfigurationFile)?
        }
    };
    let config = Arc::new(config::Configuration::parse(&config_path).await?);
    debug!("Loaded configuration from \"{}\"", config_path.display());

    let games = match &config.codenames {
        Some(settings) => Some(game_services(&config, settings).await?),
        None => {
            info!("Codenames is disabled");
            None
        }
    };
    let wiki = Arc::new(Wiki::new(&config.wiki));
    let preload = wiki.clone();
    task::spawn(async move {
        if let Err(e) = preload.index().await {
            e.report();
        }
    });
    let links = config
        .links
        .clone()
        .map(|settings| Arc::new(LinkChecker::new(settings, wiki.clone())));
    if links.is_none() {
        info!("The duplicate link check is disabled");
    }

    let mut client = build_client(
        config.secrets.token.clone(),
        EventHandler {
            config: config.clone(),
            error_messages: load_error_messages(&config).await,
            component_map: ComponentMap::new(),
            games,
            links,
            wiki,
        },
    )
    .await?;

    if let Err(why) = client.start().await {
        error!("Client error: {why:?}");
    }

    Ok(())
}

/// Opens the statistics database and prepares everything a game needs.
async fn game_services(
    config: &config::Configuration,
    settings: &config::codenames::Codenames,
) -> anyhow::Result<GameServices> {
    if config.secrets.database.is_none() {
        tokio::fs::create_dir_all(paths::DATA_DIRECTORY.as_path())
            .await
            .map_err(Error::Io)?;
    }
    let stats = StatsStore::open(&config.database_url()).await.map_err(Error::from)?;
    info!("Opened the Codenames statistics database");

    let mut renderer = BoardRenderer::default();
    match &settings.font {
        Some(path) => {
            match BoardRenderer::load_font(path).await {
                Ok(font) => renderer = renderer.with_font(font),
                Err(e) => warn!("Boards will be drawn without words: {e}"),
            }
        }
        None => warn!("No card font is configured, boards will be drawn without words"),
    }

    Ok(GameServices {
        words:       WordBank::new(settings.dictionaries_dir.clone()),
        renderer:    Arc::new(renderer),
        artifacts:   ArtifactStore::new(settings.images_dir.clone()),
        stats,
        vote_window: settings.vote_window(),
    })
}

async fn build_client(
    token: impl AsRef<str>,
    event_handler: EventHandler,
) -> std::result::Result<Client, anyhow::Error> {
    let client = Client::builder(token, INTENTS)
        .event_handler(event_handler)
        .await
        .map_err(|e| Error::ClientInitialization(Box::new(e)))?;

    Ok(client)
}

struct EventHandler {
    config:         Arc<config::Configuration>,
    error_messages: Arc<config::ErrorMessages>,
    component_map:  ComponentMap,
    games:          Option<GameServices>,
    links:          Option<Arc<LinkChecker>>,
    wiki:           Arc<Wiki>,
}

impl EventHandler {
    fn arguments(&self, context: Context) -> commands::CommandArguments {
        commands::CommandArguments {
            context:        Arc::new(context),
            config:         self.config.clone(),
            error_messages: self.error_messages.clone(),
            component_map:  self.component_map.clone(),
            games:          self.games.clone(),
            wiki:           self.wiki.clone(),
        }
    }
}

#[async_trait]
impl client::EventHandler for EventHandler {
    async fn interaction_create(&self, context: Context, interaction: Interaction) {
        match interaction {
            Interaction::Component(component) => {
                let http = context.http.clone();
                let id = component.data.custom_id.clone();
                match self
                    .component_map
                    .run(&id, component.clone(), self.arguments(context))
                    .await
                {
                    Some(Ok(())) => (),
                    Some(Err(e)) => error!("Error running component handler: {e}"),
                    None => {
                        debug!("No listener for component \"{id}\"");
                        let response = CreateInteractionResponse::Message(
                            CreateInteractionResponseMessage::new()
                                .content("This menu has expired.")
                                .ephemeral(true),
                        );
                        if let Err(e) = component.create_response(&http, response).await {
                            error!("Couldn't respond to component: {e}");
                        }
                    }
                }
            }
            Interaction::Command(command) => {
                commands::run_command(command, self.arguments(context)).await;
            }
            _ => (),
        }
    }

    async fn message(&self, context: Context, message: Message) {
        let Some(links) = self.links.as_ref() else { return };
        if message.author.bot || !links.watches(message.channel_id.get()) {
            return;
        }

        let report = match links.check(&message.content).await {
            Ok(Some(report)) => report,
            Ok(None) => return,
            Err(e) => {
                e.report();
                return;
            }
        };

        if let Some(embed) = report.warning() {
            let reply = CreateMessage::new().embed(embed).reference_message(&message);
            if let Err(e) = message.channel_id.send_message(&context, reply).await {
                error!("Couldn't warn about duplicate links: {e}");
            }
        }
    }

    async fn ready(&self, context: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        context.set_activity(Some(ActivityData::playing("Codenames")));

        info!("Registering commands...");
        match Command::set_global_commands(&context.http, commands::registrations()).await {
            Ok(registered) => info!("{} commands registered.", registered.len()),
            Err(e) => error!("Unable to register commands: {e}"),
        }

        // `ready` fires again after every gateway reconnect.
        if self.component_map.spawn_timeout_watcher(context.http.clone(), context.cache.clone()) {
            debug!("Started the component timeout watcher");
        }
    }
}

/// Returns a structure of error message responses from and `error_message` file
/// possibly specified in `config`.
async fn load_error_messages(config: &config::Configuration) -> Arc<config::ErrorMessages> {
    Arc::new(match &config.random_error_message {
        config::ConfigurationRandomErrorMessages::Boolean(true) => {
            // Load from the default location, if not possible fall back to the default
            // messages.
            match paths::ERROR_MESSAGES_FILE.as_ref() {
                Some(file) => config::ErrorMessages::from_json(file).await.unwrap_or_default(),
                None => config::ErrorMessages::default(),
            }
        }
        config::ConfigurationRandomErrorMessages::Boolean(false) => config::ErrorMessages::default(),
        config::ConfigurationRandomErrorMessages::Path(path) => {
            config::ErrorMessages::from_json(path).await.unwrap_or_else(|e| {
                e.report();
                config::ErrorMessages::default()
            })
        }
    })
}

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serenity::{
    all::{ChannelId, Message, MessageId, ReactionType, UserId},
    builder::{CreateAttachment, CreateEmbed, CreateMessage},
    collector::MessageCollector,
    http::HttpError,
    model::Colour,
    prelude::Context,
};
use tracing::{debug, warn};

use crate::codenames::{
    io::{Ballot, DeliveryError, Filter, GameChannel, Incoming, Outgoing, Place, Poll, Tone},
    PlayerId,
};

/// Discord refuses more reactions than this on one message.
pub const MAX_REACTIONS: usize = 20;

/// JSON error code for "Cannot send messages to this user".
const CANNOT_MESSAGE_USER: isize = 50007;

const ACKNOWLEDGED: &str = "🆗";

pub fn colour(tone: Tone) -> Colour {
    match tone {
        Tone::Neutral => Colour::from_rgb(26, 188, 156),
        Tone::Red => Colour::from_rgb(255, 100, 80),
        Tone::Blue => Colour::from_rgb(80, 187, 255),
        Tone::White => Colour::from_rgb(220, 220, 220),
        Tone::Black => Colour::from_rgb(34, 34, 34),
    }
}

/// A game room on Discord plus the direct messages of its players.
pub struct DiscordChannel {
    context: Arc<Context>,
    room:    ChannelId,
}

impl DiscordChannel {
    pub fn new(context: Arc<Context>, room: ChannelId) -> Self { Self { context, room } }
}

#[async_trait]
impl GameChannel for DiscordChannel {
    async fn next_message(&self, filters: &[Filter]) -> Option<Incoming> {
        let room = self.room;
        let filters = filters.to_vec();
        let message = MessageCollector::new(&self.context.shard)
            .filter(move |message| {
                incoming(room, message).is_some_and(|incoming| filters.iter().any(|f| f.accepts(&incoming)))
            })
            .next()
            .await?;

        incoming(room, &message)
    }

    async fn poll(&self, poll: &Poll, window: Duration) -> Result<Vec<Ballot>, DeliveryError> {
        let options = &poll.options[..poll.options.len().min(MAX_REACTIONS)];
        if options.len() < poll.options.len() {
            warn!(
                "Poll \"{}\" has {} options, only the first {MAX_REACTIONS} can be voted for",
                poll.title,
                poll.options.len()
            );
        }

        let listing = options
            .iter()
            .map(|option| format!("{} - {}", option.emoji, option.label))
            .collect::<Vec<_>>()
            .join("\n");
        let embed = CreateEmbed::new()
            .title(&poll.title)
            .description(format!("{}\n\n{listing}", poll.description))
            .colour(colour(poll.tone));
        let message = self
            .room
            .send_message(&*self.context, CreateMessage::new().embed(embed))
            .await
            .map_err(|e| DeliveryError::Failed(e.to_string()))?;

        for option in options {
            message
                .react(&*self.context, ReactionType::Unicode(option.emoji.clone()))
                .await
                .map_err(|e| DeliveryError::Failed(e.to_string()))?;
        }

        tokio::time::sleep(window).await;

        let mut ballots = Vec::new();
        for (index, option) in options.iter().enumerate() {
            let users = message
                .reaction_users(
                    &*self.context,
                    ReactionType::Unicode(option.emoji.clone()),
                    Some(100),
                    None::<UserId>,
                )
                .await
                .map_err(|e| DeliveryError::Failed(e.to_string()))?;
            ballots.extend(users.into_iter().filter(|user| !user.bot).map(|user| {
                Ballot {
                    voter:  PlayerId(user.id.get()),
                    option: index,
                }
            }));
        }
        debug!("Poll \"{}\" closed with {} reactions", poll.title, ballots.len());

        Ok(ballots)
    }

    async fn send(&self, to: Place, message: Outgoing) -> Result<(), DeliveryError> {
        let builder = create_message(message);
        match to {
            Place::Room => {
                self.room
                    .send_message(&*self.context, builder)
                    .await
                    .map_err(|e| DeliveryError::Failed(e.to_string()))?;
            }
            Place::Direct(player) => {
                UserId::new(player.get())
                    .direct_message(&*self.context, builder)
                    .await
                    .map_err(|e| direct_message_error(player, e))?;
            }
        }
        Ok(())
    }

    async fn acknowledge(&self, incoming: &Incoming) {
        let (Place::Room, Some(reference)) = (incoming.place, incoming.reference)
        else {
            return;
        };

        let reaction = ReactionType::Unicode(ACKNOWLEDGED.to_string());
        if let Err(e) = self
            .room
            .create_reaction(&self.context.http, MessageId::new(reference), reaction)
            .await
        {
            warn!("Couldn't acknowledge message {reference}: {e}");
        }
    }
}

/// Where `message` was posted from the game's point of view. Bots and unrelated
/// channels are ignored.
fn incoming(room: ChannelId, message: &Message) -> Option<Incoming> {
    if message.author.bot {
        return None;
    }

    let author = PlayerId(message.author.id.get());
    let place = if message.channel_id == room {
        Place::Room
    } else if message.guild_id.is_none() {
        Place::Direct(author)
    } else {
        return None;
    };

    Some(Incoming {
        place,
        author,
        content: message.content.clone(),
        reference: Some(message.id.get()),
    })
}

fn create_message(message: Outgoing) -> CreateMessage {
    let Outgoing {
        title,
        description,
        tone,
        attachment,
    } = message;

    let mut embed = None;
    if title.is_some() || description.is_some() {
        let mut e = CreateEmbed::new().colour(colour(tone));
        if let Some(title) = title {
            e = e.title(title);
        }
        if let Some(description) = description {
            e = e.description(description);
        }
        embed = Some(e);
    }

    let mut builder = CreateMessage::new();
    if let Some(attachment) = attachment {
        embed = embed.map(|e| e.image(format!("attachment://{}", attachment.filename)));
        builder = builder.add_file(CreateAttachment::bytes(attachment.bytes, attachment.filename));
    }
    if let Some(embed) = embed {
        builder = builder.embed(embed);
    }

    builder
}

fn direct_message_error(player: PlayerId, error: serenity::Error) -> DeliveryError {
    match &error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.error.code == CANNOT_MESSAGE_USER =>
        {
            DeliveryError::DirectMessagesClosed(player)
        }
        _ => DeliveryError::Failed(error.to_string()),
    }
}

//! Texts players see during a game.

use std::time::Duration;

use indoc::indoc;

use super::{PlayerId, Team};

pub const GUIDE: &str = indoc! {"
    Codenames is a word guessing game that can be played with 2 teams of 2+ players.
    * Every team has a spymaster and operatives.
    * Each team has 8/9 cards that belong to them, and the spymaster's job is to give one word clues that point their operatives to the correct cards.
    * The operatives can guess the card by simply typing the name of it.
    * **The clues must be one word only and must not contain the names of cards.**
    * There is also a black card (Assassin) which, if guessed, ends the game and results in a win for the other team.
    * Guessing white cards results in your team's turn being over.
"};

pub const START_ANNOUNCEMENT: &str = "GAME STARTED!";
pub const START_ANNOUNCEMENT_DESCRIPTION: &str = "The game has started!";

pub fn team_roster_title(team: Team) -> String { format!("Players of **{team}** team") }

pub fn team_roster(captain: PlayerId, operatives: &[PlayerId]) -> String {
    let operatives = operatives
        .iter()
        .map(|p| p.mention())
        .collect::<Vec<_>>()
        .join("\n");
    format!("**Spymaster**: {}\n\nOperatives:\n{operatives}", captain.mention())
}

pub fn waiting_title(team: Team) -> String { format!("Waiting for move of **{team}** team") }

pub fn waiting_for_captain(captain: PlayerId) -> String {
    format!("Spymaster {} will make a move", captain.mention())
}

pub fn waiting_for_operatives(team: Team) -> String {
    format!("Operatives of **{team}** team\n{OPERATIVE_INSTRUCTIONS}")
}

pub const OPERATIVE_INSTRUCTIONS: &str = indoc! {"
    -# Type words you want to open in response messages.
    -# To **FINISH THE MOVE** type **`0`**
    -# To **STOP THE GAME** type **`000`**"};

pub const CLUE_REQUEST_TITLE: &str = "Your turn";
pub const CLUE_REQUEST: &str = "Type a word and a number in response message, for example: **`meow 3`**";
pub const CLUE_ACCEPTED: &str = "Move accepted";

pub fn clue_given_title(team: Team) -> String { format!("Spymaster of **{team}** team has made a move") }

pub fn clue_given(captain: PlayerId, clue: &str) -> String {
    format!("{} says:\n**`{clue}`**", captain.mention())
}

pub const SUCCESS_TITLE: &str = "Success!";
pub const SUCCESS_ROOM: &str = "You guessed!";
pub const OPPONENT_SUCCESS_TITLE: &str = "Opponent's success";
pub const MISS_TITLE: &str = "Miss";
pub const MISS_OPPONENT_ROOM: &str = "Unfortunately, this word **belongs to the opponent team**";
pub const MISS_NEUTRAL_ROOM: &str = "Unfortunately, this word **doesn't belong to any team**";
pub const MISS_ENDGAME_ROOM: &str = "Unfortunately, this word **is an endgame one**";
pub const OPPONENT_MISS_TITLE: &str = "Opponent's miss";
pub const LUCKY_TITLE: &str = "Lucky!";

pub fn own_word_opened(word: &str) -> String {
    format!("Your team opened the word **`{word}`** that **belongs to them**!")
}

pub fn opponents_opened_their_word(word: &str) -> String {
    format!("The opponent team opened the word **`{word}`** that **belongs to them**")
}

pub fn opened_opponent_word(word: &str) -> String {
    format!("Your team opened the word **`{word}`** that **belongs to the opponent team**")
}

pub fn opened_neutral_word(word: &str) -> String {
    format!("Your team opened the word **`{word}`** that **doesn't belong to any team**")
}

pub fn opened_endgame_word(word: &str) -> String {
    format!("Your team opened the word **`{word}`** that **is an endgame one**")
}

pub fn opponents_opened_neutral_word(word: &str) -> String {
    format!("The opponent team opened the word **`{word}`** that **doesn't belong to any team**")
}

pub fn opponents_opened_your_word(word: &str) -> String {
    format!("The opponent team opened the word **`{word}`** that **belongs to your team**")
}

pub fn opponents_opened_endgame_word(word: &str) -> String {
    format!("The opponent team opened the word **`{word}`** that **is an endgame one**")
}

pub const GAME_OVER_TITLE: &str = "Game over!";

pub fn won_by_all_words(winner: Team) -> String {
    format!("**{winner} team won!**\nThey opened all their words")
}

pub fn won_by_endgame(winner: Team) -> String {
    format!("**{winner} team won!**\n{} team opened an endgame word", winner.other())
}

pub const TEAM_WON_TITLE: &str = "Your team won!";
pub const TEAM_WON: &str = "Keep it up!";
pub const TEAM_LOST_TITLE: &str = "Your team lost!";
pub const TEAM_LOST: &str = "Good luck in the next game!";

pub const STOP_VOTE_TITLE: &str = "Stopping the game";

pub fn stop_vote(window: Duration) -> String {
    format!(
        "**Do you really want to stop playing?**\n\nAll players have {} seconds to vote.",
        window.as_secs()
    )
}

pub const YES: &str = "Yes";
pub const NO: &str = "No";
pub const GAME_STOPPED: &str = "Majority of players voted for game stopping.";
pub const GAME_CONTINUED: &str = "Majority of players voted against game stopping.";

pub const RANDOM_CAPTAIN: &str = "Random spymaster";
pub const CAPTAIN_ELECTION_DESCRIPTION: &str = "React to choose your spymaster.";

pub fn captain_election_title(team: Team) -> String { format!("**{team}** team: Voting for the spymaster") }

pub fn captain_elected_title(team: Team) -> String { format!("**{team}** team: Spymaster selected") }

pub fn captain_elected(captain: PlayerId) -> String { format!("Your spymaster is {}", captain.mention()) }

pub const DIRECT_MESSAGES_CLOSED_TITLE: &str = "Can't reach a player";

pub fn direct_messages_closed(player: PlayerId) -> String {
    format!(
        "{} please allow direct messages from server members, the game sends you private updates.",
        player.mention()
    )
}

pub const INITIAL_BOARD: &str = "The board as it was at the start of the game";

pub const PLAYER_BOARD_FILE: &str = "player_field.png";
pub const CAPTAIN_BOARD_FILE: &str = "captain_field.png";
pub const INITIAL_BOARD_FILE: &str = "initial_captain_field.png";

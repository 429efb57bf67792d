use serenity::{
    all::{GuildId, RoleId, UserId},
    http::Http,
};
use tracing::{debug, warn};

use crate::{
    codenames::{election::Roster, PlayerId, Team},
    config::codenames::TeamRoles,
};

const ASSIGN_REASON: &str = "Codenames game started";
const CLEAR_REASON: &str = "Codenames game ended";

/// Which role each player holds during a game: spymaster roles for captains, team
/// roles for operatives.
pub fn grants(roles: &TeamRoles, red: &Roster, blue: &Roster) -> Vec<(PlayerId, u64)> {
    let mut grants = Vec::new();
    for roster in [red, blue] {
        let (team_role, spymaster_role) = match roster.team {
            Team::Red => (roles.red_team, roles.red_spymaster),
            Team::Blue => (roles.blue_team, roles.blue_spymaster),
        };
        grants.push((roster.captain, spymaster_role));
        grants.extend(roster.operatives.iter().map(|player| (*player, team_role)));
    }
    grants
}

pub async fn assign(http: &Http, guild: GuildId, grants: &[(PlayerId, u64)]) {
    for (player, role) in grants {
        if let Err(e) = http
            .add_member_role(guild, UserId::new(player.get()), RoleId::new(*role), Some(ASSIGN_REASON))
            .await
        {
            warn!("Couldn't give role {role} to {player}: {e}");
        }
    }
    debug!("Assigned {} Codenames roles", grants.len());
}

pub async fn clear(http: &Http, guild: GuildId, grants: &[(PlayerId, u64)]) {
    for (player, role) in grants {
        if let Err(e) = http
            .remove_member_role(guild, UserId::new(player.get()), RoleId::new(*role), Some(CLEAR_REASON))
            .await
        {
            warn!("Couldn't take role {role} from {player}: {e}");
        }
    }
    debug!("Cleared {} Codenames roles", grants.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captains_get_spymaster_roles_and_operatives_team_roles() {
        let roles = TeamRoles {
            red_team:       10,
            blue_team:      20,
            red_spymaster:  11,
            blue_spymaster: 21,
        };
        let red = Roster::new(Team::Red, &[PlayerId(1), PlayerId(2), PlayerId(3)], PlayerId(2));
        let blue = Roster::new(Team::Blue, &[PlayerId(4), PlayerId(5)], PlayerId(4));

        assert_eq!(
            grants(&roles, &red, &blue),
            [
                (PlayerId(2), 11),
                (PlayerId(1), 10),
                (PlayerId(3), 10),
                (PlayerId(4), 21),
                (PlayerId(5), 20),
            ]
        );
    }
}

pub const RENAME_TEAM_PREFIX: &str = "__internal_rename_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub usernames: Vec<String>,
}

/// Teams as last reported by the server, in the order the reports arrived.
///
/// A team reported twice between two listings gets two entries. Lookups
/// treat them as one team with the union of both member lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamMapping {
    pub teams: Vec<Team>,
}

pub fn rename_team_name(chat_name: &str) -> String {
    format!("{RENAME_TEAM_PREFIX}{chat_name}")
}

impl TeamMapping {
    pub fn new() -> TeamMapping {
        TeamMapping { teams: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.teams.clear();
    }

    pub fn push(&mut self, name: String, usernames: Vec<String>) {
        self.teams.push(Team { name, usernames });
    }

    pub fn player_teams(&self, username: &str) -> Vec<String> {
        self.teams
            .iter()
            .filter(|team| team.usernames.iter().any(|u| u == username))
            .map(|team| team.name.clone())
            .collect()
    }

    pub fn team_players(&self, team_name: &str) -> Vec<String> {
        let mut players = self
            .teams
            .iter()
            .filter(|team| team.name == team_name)
            .flat_map(|team| team.usernames.iter().cloned())
            .collect::<Vec<_>>();
        players.sort();
        players.dedup();
        players
    }

    /// Chat identity that owns `display_name`, if it is bound.
    pub fn rename_owner(&self, display_name: &str) -> Option<String> {
        self.player_teams(display_name)
            .into_iter()
            .find_map(|team| team.strip_prefix(RENAME_TEAM_PREFIX).map(str::to_owned))
    }

    /// In-game name to show for a chat identity.
    pub fn display_name(&self, chat_name: &str) -> String {
        self.team_players(&rename_team_name(chat_name))
            .into_iter()
            .next()
            .unwrap_or_else(|| chat_name.to_owned())
    }

    pub fn reverse_rename(&self, username: &str) -> String {
        self.rename_owner(username).unwrap_or_else(|| username.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn team_players_is_sorted_and_unique_across_duplicate_reports() {
        let mut teams = TeamMapping::new();
        teams.push("red".into(), names(&["zed", "amy"]));
        teams.push("blue".into(), names(&["bob"]));
        teams.push("red".into(), names(&["amy", "carl"]));

        assert_eq!(teams.team_players("red"), names(&["amy", "carl", "zed"]));
        assert_eq!(teams.team_players("blue"), names(&["bob"]));
        assert!(teams.team_players("green").is_empty());
    }

    #[test]
    fn player_teams_follows_report_order() {
        let mut teams = TeamMapping::new();
        teams.push("zeta".into(), names(&["amy"]));
        teams.push("alpha".into(), names(&["amy", "bob"]));
        teams.push("mid".into(), names(&["bob"]));

        assert_eq!(teams.player_teams("amy"), names(&["zeta", "alpha"]));
        assert_eq!(teams.player_teams("bob"), names(&["alpha", "mid"]));
        assert!(teams.player_teams("nobody").is_empty());
    }

    #[test]
    fn rename_lookups_go_both_ways() {
        let mut teams = TeamMapping::new();
        teams.push("builders".into(), names(&["Al_99"]));
        teams.push(rename_team_name("alice"), names(&["Al_99"]));

        assert!(teams.player_teams("Al_99").contains(&"__internal_rename_alice".to_string()));
        assert_eq!(teams.reverse_rename("Al_99"), "alice");
        assert_eq!(teams.display_name("alice"), "Al_99");
        assert_eq!(teams.rename_owner("Al_99").as_deref(), Some("alice"));
    }

    #[test]
    fn unbound_names_map_to_themselves() {
        let teams = TeamMapping::new();
        assert_eq!(teams.reverse_rename("Steve"), "Steve");
        assert_eq!(teams.display_name("bob"), "bob");
        assert_eq!(teams.rename_owner("Steve"), None);
    }

    #[test]
    fn clear_drops_everything() {
        let mut teams = TeamMapping::new();
        teams.push("red".into(), names(&["amy"]));
        teams.clear();
        assert!(teams.player_teams("amy").is_empty());
    }
}

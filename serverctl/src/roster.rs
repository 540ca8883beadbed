/// Online players in the order they joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    players: Vec<String>,
}

impl Roster {
    pub fn new() -> Roster {
        Roster { players: Vec::new() }
    }

    pub fn insert(&mut self, username: &str) {
        if !self.contains(username) {
            self.players.push(username.to_owned());
        }
    }

    pub fn remove(&mut self, username: &str) {
        self.players.retain(|player| player != username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.players.iter().any(|player| player == username)
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }
}

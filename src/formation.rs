use crate::model::{Coordinate, Formation, Player};
use crate::sync::{SyncCoordinator, Synced};

/// A favorite that currently has a spot on the pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement<'p> {
    pub player: &'p Player,
    pub at: Coordinate,
}

/// Player id to pitch coordinate. Placements outlive favorites: removing a
/// favorite keeps its spot so re-adding the player puts them back.
#[derive(Debug, Clone, Default)]
pub struct FormationTracker {
    formation: Formation,
}

impl FormationTracker {
    pub fn new(formation: Formation) -> Self {
        Self { formation }
    }

    pub fn formation(&self) -> &Formation {
        &self.formation
    }

    pub fn replace(&mut self, formation: Formation) {
        self.formation = formation;
    }

    /// Drop event from the UI. The last drop of a given player wins.
    pub fn place_player(&mut self, player_id: &str, at: Coordinate) {
        self.formation.players.insert(player_id.to_string(), at);
    }

    pub fn remove_placement(&mut self, player_id: &str) -> Option<Coordinate> {
        self.formation.players.remove(player_id)
    }

    pub fn position_of(&self, player_id: &str) -> Option<Coordinate> {
        self.formation.players.get(player_id).copied()
    }

    /// Placements for players still among `favorites`, in favorites order.
    /// Stale entries are skipped, not deleted.
    pub fn renderable_entries<'p>(&self, favorites: &'p [Player]) -> Vec<Placement<'p>> {
        favorites
            .iter()
            .filter_map(|player| {
                self.formation
                    .players
                    .get(&player.id)
                    .map(|at| Placement { player, at: *at })
            })
            .collect()
    }

    pub fn load(&mut self, sync: &SyncCoordinator<'_>, user_id: &str) -> Synced<()> {
        match sync.formation(user_id) {
            Synced::Remote(formation) => {
                self.formation = formation;
                Synced::Remote(())
            }
            Synced::Local { value, error } => {
                self.formation = value;
                Synced::Local { value: (), error }
            }
        }
    }

    pub fn save(&self, sync: &SyncCoordinator<'_>, user_id: &str) -> Synced<Formation> {
        sync.save_formation(user_id, &self.formation)
    }
}

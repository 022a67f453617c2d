// Per-song authorization rules
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Principal, Song};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Access,
    Edit,
    Delete,
}

/// A song the principal may not act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub song_id: Uuid,
    pub action: Action,
}

pub struct SongPolicy;

impl SongPolicy {
    pub fn allows(action: Action, song: &Song, principal: &Principal) -> bool {
        let Some(user) = principal.user() else {
            return action == Action::Access && song.is_public;
        };
        let owns = song.owner_id == user.id;

        match action {
            Action::Access => song.is_public || owns || user.is_admin,
            Action::Edit | Action::Delete => owns || user.is_admin,
        }
    }

    pub fn authorize(action: Action, song: &Song, principal: &Principal) -> Result<()> {
        if Self::allows(action, song, principal) {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }

    /// Checks every song on its own and reports each one that fails.
    pub fn violations(action: Action, songs: &[Song], principal: &Principal) -> Vec<Violation> {
        songs
            .iter()
            .filter(|song| !Self::allows(action, song, principal))
            .map(|song| Violation {
                song_id: song.id,
                action,
            })
            .collect()
    }
}

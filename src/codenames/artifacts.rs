use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::Result;

/// Where board images of running games are kept.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    directory: PathBuf,
}

impl ArtifactStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path { &self.directory }

    /// Reserves file names for a new game, creating the directory if needed.
    pub async fn session(&self, id: Uuid) -> Result<SessionArtifacts> {
        fs::create_dir_all(&self.directory).await?;
        Ok(SessionArtifacts {
            id,
            directory: self.directory.clone(),
        })
    }
}

/// The board images belonging to one game.
#[derive(Debug, Clone)]
pub struct SessionArtifacts {
    id:        Uuid,
    directory: PathBuf,
}

impl SessionArtifacts {
    pub fn id(&self) -> Uuid { self.id }

    pub fn captain_path(&self) -> PathBuf { self.directory.join(format!("{}-captain.png", self.id)) }

    pub fn player_path(&self) -> PathBuf { self.directory.join(format!("{}-player.png", self.id)) }

    pub fn initial_path(&self) -> PathBuf {
        self.directory.join(format!("{}-captain-initial.png", self.id))
    }

    /// Replaces the current images.
    pub async fn store(&self, captain: &[u8], player: &[u8]) -> Result<()> {
        fs::write(self.captain_path(), captain).await?;
        fs::write(self.player_path(), player).await?;
        Ok(())
    }

    pub async fn captain(&self) -> Result<Vec<u8>> { Ok(fs::read(self.captain_path()).await?) }

    pub async fn player(&self) -> Result<Vec<u8>> { Ok(fs::read(self.player_path()).await?) }

    /// Keeps a copy of the current captain image to show once the game is over.
    pub async fn freeze_initial(&self) -> Result<()> {
        fs::copy(self.captain_path(), self.initial_path()).await?;
        Ok(())
    }

    pub async fn initial(&self) -> Result<Vec<u8>> { Ok(fs::read(self.initial_path()).await?) }

    /// Deletes every image of this game. Missing files are fine.
    pub async fn discard(&self) -> Result<()> {
        for path in [self.captain_path(), self.player_path(), self.initial_path()] {
            match fs::remove_file(&path).await {
                Ok(()) => debug!("Removed \"{}\"", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

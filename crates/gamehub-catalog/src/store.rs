//! The catalog store: in-memory state plus its JSON snapshot on disk.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use gamehub_protocol::{GameId, GameListEntry, GameMeta, GameRecord, Review, Role};

use crate::CatalogError;

/// File name of the catalog snapshot inside the data directory.
const DB_FILE: &str = "db.json";

/// File name of a game's artifact inside its per-id directory.
const ARTIFACT_FILE: &str = "game.bin";

/// Record that a user took part in a started session for a game.
///
/// Gates review eligibility. At most one entry per (user, game) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub user: String,
    pub game_id: GameId,
}

/// The snapshot shape. Every field defaults so a snapshot written by an
/// older build (or a hand-edited one missing a section) still loads.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    #[serde(default)]
    developers: BTreeMap<String, String>,
    #[serde(default)]
    players: BTreeMap<String, String>,
    #[serde(default)]
    games: Vec<GameRecord>,
    #[serde(default)]
    reviews: Vec<Review>,
    #[serde(default)]
    play_history: Vec<PlayRecord>,
}

/// The durable catalog: accounts, games, reviews, play history.
///
/// Mutating operations persist the snapshot before they return, so the
/// on-disk state is never behind a success reply built from their result.
/// Persistence is best-effort: a failed write is logged, not surfaced —
/// the in-memory state remains authoritative for the process lifetime.
///
/// Lookups scan `Vec`s; catalog sizes are small by design and need no
/// index structures.
pub struct CatalogStore {
    data_dir: PathBuf,
    db: Database,
}

impl CatalogStore {
    /// Opens the catalog rooted at `data_dir`, loading the snapshot if one
    /// exists. A missing or unreadable snapshot starts an empty catalog.
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        if let Err(e) = std::fs::create_dir_all(data_dir.join("games")) {
            tracing::error!(error = %e, dir = %data_dir.display(), "failed to create data dir");
        }

        let db_path = data_dir.join(DB_FILE);
        let db = match std::fs::read(&db_path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(db) => db,
                Err(e) => {
                    tracing::error!(error = %e, "snapshot unreadable, starting empty");
                    Database::default()
                }
            },
            Err(_) => Database::default(),
        };

        let store = Self { data_dir, db };
        tracing::info!(
            games = store.db.games.len(),
            developers = store.db.developers.len(),
            players = store.db.players.len(),
            "catalog loaded"
        );
        store
    }

    /// Path of the artifact file for a game id. The file exists only after
    /// a completed upload.
    pub fn artifact_path(&self, id: GameId) -> PathBuf {
        self.game_dir(id).join(ARTIFACT_FILE)
    }

    fn game_dir(&self, id: GameId) -> PathBuf {
        self.data_dir.join("games").join(id.0.to_string())
    }

    /// Writes the full snapshot. Best-effort: failures are logged only.
    fn persist(&self) {
        let result = serde_json::to_string_pretty(&self.db)
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(self.data_dir.join(DB_FILE), json));
        if let Err(e) = result {
            tracing::error!(error = %e, "snapshot write failed");
        }
    }

    fn accounts(&self, role: Role) -> &BTreeMap<String, String> {
        match role {
            Role::Developer => &self.db.developers,
            Role::Player => &self.db.players,
        }
    }

    fn accounts_mut(&mut self, role: Role) -> &mut BTreeMap<String, String> {
        match role {
            Role::Developer => &mut self.db.developers,
            Role::Player => &mut self.db.players,
        }
    }

    // -----------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------

    /// Creates an account.
    ///
    /// # Errors
    /// [`CatalogError::UsernameTaken`] if the (role, username) pair exists.
    pub fn register(
        &mut self,
        role: Role,
        username: &str,
        password: &str,
    ) -> Result<(), CatalogError> {
        let accounts = self.accounts_mut(role);
        if accounts.contains_key(username) {
            return Err(CatalogError::UsernameTaken);
        }
        accounts.insert(username.to_string(), password.to_string());
        self.persist();
        tracing::info!(%role, %username, "account registered");
        Ok(())
    }

    /// Checks a login against the credential store.
    ///
    /// Developers are auto-provisioned: the first (username, password) pair
    /// seen for an unknown developer name is persisted as a new account.
    /// Players must register explicitly.
    ///
    /// # Errors
    /// [`CatalogError::InvalidCredentials`] on mismatch or unknown account.
    pub fn verify_login(
        &mut self,
        role: Role,
        username: &str,
        password: &str,
    ) -> Result<(), CatalogError> {
        if role == Role::Developer && !self.db.developers.contains_key(username) {
            self.db
                .developers
                .insert(username.to_string(), password.to_string());
            self.persist();
            tracing::info!(%username, "developer auto-provisioned");
        }

        match self.accounts(role).get(username) {
            Some(stored) if stored == password => Ok(()),
            _ => Err(CatalogError::InvalidCredentials),
        }
    }

    // -----------------------------------------------------------------
    // Games
    // -----------------------------------------------------------------

    /// Creates a game record, or bumps the version of the author's existing
    /// record with the same name. Returns the id whose artifact the caller
    /// should (re)receive.
    ///
    /// New records take the smallest unused positive id, so ids freed by
    /// removal get reused.
    ///
    /// # Errors
    /// [`CatalogError::PermissionDenied`] if the name belongs to another
    /// author.
    pub fn upsert_game(&mut self, author: &str, meta: &GameMeta) -> Result<GameId, CatalogError> {
        if let Some(existing) = self.db.games.iter_mut().find(|g| g.name == meta.name) {
            if existing.author != author {
                return Err(CatalogError::PermissionDenied);
            }
            existing.version += 1;
            existing.description = meta.description.clone();
            existing.kind = meta.kind;
            let id = existing.id;
            let version = existing.version;
            self.persist();
            tracing::info!(%id, %author, version, name = %meta.name, "game re-uploaded");
            return Ok(id);
        }

        let id = self.smallest_unused_id();
        self.db.games.push(GameRecord {
            id,
            name: meta.name.clone(),
            version: 1,
            author: author.to_string(),
            description: meta.description.clone(),
            kind: meta.kind,
        });
        self.persist();
        tracing::info!(%id, %author, name = %meta.name, "game published");
        Ok(id)
    }

    fn smallest_unused_id(&self) -> GameId {
        let mut candidate = 1u32;
        while self.db.games.iter().any(|g| g.id.0 == candidate) {
            candidate += 1;
        }
        GameId(candidate)
    }

    /// Removes a game record and its artifact directory.
    ///
    /// # Errors
    /// [`CatalogError::GameNotFound`] | [`CatalogError::PermissionDenied`].
    pub fn remove_game(&mut self, author: &str, id: GameId) -> Result<(), CatalogError> {
        let game = self
            .db
            .games
            .iter()
            .find(|g| g.id == id)
            .ok_or(CatalogError::GameNotFound(id))?;
        if game.author != author {
            return Err(CatalogError::PermissionDenied);
        }

        self.db.games.retain(|g| g.id != id);
        self.persist();
        let _ = std::fs::remove_dir_all(self.game_dir(id));
        tracing::info!(%id, %author, "game removed");
        Ok(())
    }

    /// Looks up a game record by id.
    pub fn game(&self, id: GameId) -> Option<&GameRecord> {
        self.db.games.iter().find(|g| g.id == id)
    }

    /// All records owned by one author.
    pub fn games_by_author(&self, author: &str) -> Vec<GameRecord> {
        self.db
            .games
            .iter()
            .filter(|g| g.author == author)
            .cloned()
            .collect()
    }

    /// Every record paired with its mean rating, rounded to one decimal
    /// (`0.0` for unreviewed games).
    pub fn games_with_ratings(&self) -> Vec<GameListEntry> {
        self.db
            .games
            .iter()
            .map(|game| GameListEntry {
                game: game.clone(),
                rating: self.mean_rating(game.id),
            })
            .collect()
    }

    fn mean_rating(&self, id: GameId) -> f64 {
        let ratings: Vec<u32> = self
            .db
            .reviews
            .iter()
            .filter(|r| r.game_id == id)
            .map(|r| u32::from(r.rating))
            .collect();
        if ratings.is_empty() {
            return 0.0;
        }
        let sum: u32 = ratings.iter().sum();
        (sum as f64 / ratings.len() as f64 * 10.0).round() / 10.0
    }

    // -----------------------------------------------------------------
    // Reviews and play history
    // -----------------------------------------------------------------

    /// All reviews for one game.
    pub fn reviews_for(&self, id: GameId) -> Vec<Review> {
        self.db
            .reviews
            .iter()
            .filter(|r| r.game_id == id)
            .cloned()
            .collect()
    }

    /// Submits a review.
    ///
    /// # Errors
    /// [`CatalogError::InvalidRating`], then [`CatalogError::MustPlayBeforeReview`]
    /// (no play-history pair), then [`CatalogError::AlreadyReviewed`].
    pub fn add_review(
        &mut self,
        user: &str,
        game_id: GameId,
        rating: u8,
        comment: &str,
    ) -> Result<(), CatalogError> {
        if !(1..=5).contains(&rating) {
            return Err(CatalogError::InvalidRating(rating));
        }
        if !self.has_played(user, game_id) {
            return Err(CatalogError::MustPlayBeforeReview);
        }
        if self
            .db
            .reviews
            .iter()
            .any(|r| r.user == user && r.game_id == game_id)
        {
            return Err(CatalogError::AlreadyReviewed);
        }

        self.db.reviews.push(Review {
            game_id,
            user: user.to_string(),
            rating,
            comment: comment.to_string(),
        });
        self.persist();
        tracing::info!(%game_id, %user, rating, "review recorded");
        Ok(())
    }

    /// Returns `true` if the user has a play-history entry for the game.
    pub fn has_played(&self, user: &str, game_id: GameId) -> bool {
        self.db
            .play_history
            .iter()
            .any(|h| h.user == user && h.game_id == game_id)
    }

    /// Records a play-history entry for each member, skipping pairs already
    /// present. One snapshot write for the whole batch.
    pub fn record_plays<'a>(&mut self, game_id: GameId, users: impl IntoIterator<Item = &'a str>) {
        for user in users {
            if !self.has_played(user, game_id) {
                self.db.play_history.push(PlayRecord {
                    user: user.to_string(),
                    game_id,
                });
            }
        }
        self.persist();
    }

    /// The full play history, oldest first.
    pub fn play_history(&self) -> &[PlayRecord] {
        &self.db.play_history
    }
}

// =========================================================================
// Tests
// =========================================================================

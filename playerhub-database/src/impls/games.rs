use anyhow::Context as _;
use chrono::NaiveDate;
use playerhub_core::ProgressionError;
use playerhub_utils::parse::parse_iso_date;
use tracing::info;

use crate::cache::{CATALOG_CACHE_TTL, genres_key, invalidate_catalog};
use crate::database::Database;
use crate::impls::{achievements, now_i64, player_games, reviews};
use crate::model::game::{Game, GameDetail, NewGame};

const GAME_COLUMNS: &str = "id, name, description, genre, release_date, rating, created_at";

/// Built-in catalog loaded by `seed_catalog`.
pub const SEED_GAMES: &[NewGame<'static>] = &[
    NewGame {
        name: "The Witcher 3",
        description: "Open-world RPG following the monster hunter Geralt of Rivia.",
        genre: "RPG",
        release_date: "2015-05-19",
        rating: 9.3,
    },
    NewGame {
        name: "Cyberpunk 2077",
        description: "Action RPG set in the sprawling megacity of Night City.",
        genre: "RPG",
        release_date: "2020-12-10",
        rating: 8.5,
    },
    NewGame {
        name: "Elden Ring",
        description: "Demanding open-world action RPG from the makers of Dark Souls.",
        genre: "Action RPG",
        release_date: "2022-02-25",
        rating: 9.1,
    },
    NewGame {
        name: "Valorant",
        description: "Tactical team shooter built around agents with unique abilities.",
        genre: "Shooter",
        release_date: "2020-06-02",
        rating: 8.7,
    },
    NewGame {
        name: "League of Legends",
        description: "Team MOBA where two sides battle for control of the arena.",
        genre: "MOBA",
        release_date: "2009-10-27",
        rating: 8.4,
    },
    NewGame {
        name: "Dota 2",
        description: "Deep MOBA with a high skill ceiling and a large esports scene.",
        genre: "MOBA",
        release_date: "2013-07-09",
        rating: 8.6,
    },
    NewGame {
        name: "Counter-Strike 2",
        description: "Free-to-play tactical shooter that rewards precision and teamwork.",
        genre: "Shooter",
        release_date: "2023-09-01",
        rating: 8.8,
    },
    NewGame {
        name: "Starfield",
        description: "Space exploration RPG spanning hundreds of planets.",
        genre: "Space RPG",
        release_date: "2023-09-06",
        rating: 7.9,
    },
    NewGame {
        name: "Baldurs Gate 3",
        description: "Party-based RPG with turn-based combat and branching choices.",
        genre: "RPG",
        release_date: "2023-08-03",
        rating: 9.4,
    },
    NewGame {
        name: "Final Fantasy XVI",
        description: "Action RPG of warring nations and summoned Eikons.",
        genre: "Action RPG",
        release_date: "2023-06-22",
        rating: 8.9,
    },
    NewGame {
        name: "Palworld",
        description: "Survival adventure about catching and working alongside creatures.",
        genre: "Adventure",
        release_date: "2024-01-18",
        rating: 8.3,
    },
    NewGame {
        name: "Helldivers 2",
        description: "Co-op shooter where squads fight for Super Earth.",
        genre: "Co-op Shooter",
        release_date: "2024-02-08",
        rating: 8.5,
    },
];

#[derive(sqlx::FromRow)]
struct GameRow {
    id: i64,
    name: String,
    description: String,
    genre: String,
    release_date: NaiveDate,
    rating: f64,
    created_at: i64,
}

impl GameRow {
    fn into_game(self) -> anyhow::Result<Game> {
        Ok(Game {
            id: self.id,
            name: self.name,
            description: self.description,
            genre: self.genre,
            release_date: self.release_date,
            rating: self.rating,
            created_at: u64::try_from(self.created_at).context("game created_at row out of u64 range")?,
        })
    }
}

/// Check a new game and return its parsed release date.
fn validate_new_game(new_game: &NewGame<'_>) -> Result<NaiveDate, ProgressionError> {
    if new_game.name.trim().is_empty() {
        return Err(ProgressionError::InvalidInput("game name is required".to_owned()));
    }
    if new_game.genre.trim().is_empty() {
        return Err(ProgressionError::InvalidInput("game genre is required".to_owned()));
    }
    let Some(release_date) = parse_iso_date(new_game.release_date) else {
        return Err(ProgressionError::InvalidInput(format!(
            "release date `{}` is not YYYY-MM-DD",
            new_game.release_date
        )));
    };
    if !(0.0..=10.0).contains(&new_game.rating) {
        return Err(ProgressionError::InvalidInput(
            "rating must be between 0 and 10".to_owned(),
        ));
    }
    Ok(release_date)
}

/// Insert a game unless one with the same name exists. Returns the game and
/// whether it was created.
pub async fn get_or_create_game(
    db: &Database,
    new_game: &NewGame<'_>,
) -> anyhow::Result<(Game, bool)> {
    let release_date = validate_new_game(new_game)?;

    let inserted: Option<GameRow> = sqlx::query_as(&format!(
        "INSERT INTO games (name, description, genre, release_date, rating, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (name) DO NOTHING
         RETURNING {GAME_COLUMNS}"
    ))
    .bind(new_game.name.trim())
    .bind(new_game.description)
    .bind(new_game.genre.trim())
    .bind(release_date)
    .bind(new_game.rating)
    .bind(now_i64()?)
    .fetch_optional(db.pool())
    .await?;

    if let Some(row) = inserted {
        invalidate_catalog(db.cache()).await;
        return Ok((row.into_game()?, true));
    }

    let existing: GameRow = sqlx::query_as(&format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE name = $1"
    ))
    .bind(new_game.name.trim())
    .fetch_one(db.pool())
    .await?;

    Ok((existing.into_game()?, false))
}

/// Load the built-in catalog. Returns `(created, already_present)`.
pub async fn seed_catalog(db: &Database) -> anyhow::Result<(usize, usize)> {
    let mut created = 0;
    let mut existing = 0;

    for new_game in SEED_GAMES {
        let (game, was_created) = get_or_create_game(db, new_game).await?;
        if was_created {
            info!(game_id = game.id, name = %game.name, "added game");
            created += 1;
        } else {
            info!(game_id = game.id, name = %game.name, "game already present");
            existing += 1;
        }
    }

    Ok((created, existing))
}

pub async fn get_game(db: &Database, game_id: i64) -> anyhow::Result<Option<Game>> {
    let row: Option<GameRow> = sqlx::query_as(&format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE id = $1"
    ))
    .bind(game_id)
    .fetch_optional(db.pool())
    .await?;

    row.map(GameRow::into_game).transpose()
}

/// Newest games first, optionally restricted to one genre.
pub async fn list_games(
    db: &Database,
    genre: Option<&str>,
    limit: Option<u32>,
) -> anyhow::Result<Vec<Game>> {
    let limit_i64 = limit.map(i64::from);

    let rows: Vec<GameRow> = sqlx::query_as(&format!(
        "SELECT {GAME_COLUMNS}
         FROM games
         WHERE ($1::TEXT IS NULL OR genre = $1)
         ORDER BY created_at DESC, id DESC
         LIMIT $2"
    ))
    .bind(genre)
    .bind(limit_i64)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(GameRow::into_game).collect()
}

pub async fn list_genres(db: &Database) -> anyhow::Result<Vec<String>> {
    let key = genres_key(db.cache());
    db.cache()
        .get_or_load_json(&key, CATALOG_CACHE_TTL, || async {
            let genres: Vec<String> =
                sqlx::query_scalar("SELECT DISTINCT genre FROM games ORDER BY genre ASC")
                    .fetch_all(db.pool())
                    .await?;
            Ok(genres)
        })
        .await
}

/// Game page: achievements, player count, reviews and the viewer's progress.
pub async fn game_detail(
    db: &Database,
    game_id: i64,
    viewer: Option<i64>,
) -> anyhow::Result<Option<GameDetail>> {
    let Some(game) = get_game(db, game_id).await? else {
        return Ok(None);
    };

    let achievements = achievements::list_game_achievements(db, game_id).await?;

    let players_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM player_games WHERE game_id = $1")
            .bind(game_id)
            .fetch_one(db.pool())
            .await?;

    let reviews = reviews::list_game_reviews(db, game_id).await?;

    let player_game = match viewer {
        Some(player_id) => player_games::get_player_game(db, player_id, game_id).await?,
        None => None,
    };

    Ok(Some(GameDetail {
        game,
        achievements,
        players_count,
        reviews,
        player_game,
    }))
}

#[cfg(test)]
mod tests {
    use super::{SEED_GAMES, validate_new_game};
    use crate::model::game::NewGame;

    #[test]
    fn seed_catalog_is_valid_and_unique() {
        let mut names = std::collections::HashSet::new();
        for game in SEED_GAMES {
            assert!(validate_new_game(game).is_ok(), "{} failed validation", game.name);
            assert!(names.insert(game.name), "duplicate seed game {}", game.name);
        }
        assert_eq!(SEED_GAMES.len(), 12);
    }

    #[test]
    fn rejects_bad_release_dates() {
        let game = NewGame {
            name: "Broken",
            description: "",
            genre: "RPG",
            release_date: "2023-02-30",
            rating: 5.0,
        };
        assert!(validate_new_game(&game).is_err());
    }

    #[test]
    fn release_date_is_parsed_for_storage() {
        let game = NewGame {
            name: "Ok",
            description: "",
            genre: "RPG",
            release_date: " 2015-05-19",
            rating: 9.0,
        };
        assert_eq!(
            validate_new_game(&game).ok(),
            chrono::NaiveDate::from_ymd_opt(2015, 5, 19)
        );
    }
}

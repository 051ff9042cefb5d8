//! Command-line surface for the playerhub admin tool.

use clap::{Parser, Subcommand};
use playerhub_core::model::achievement::Difficulty;
use playerhub_core::model::friend::FriendDecision;
use playerhub_core::model::tournament::TournamentStatus;

#[derive(Parser)]
#[command(name = "playerhub")]
#[command(about = "Player progression admin tool: levels, achievements, quests, tournaments")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Load the built-in game catalog (safe to re-run)
    SeedGames,

    /// Create an account and its player profile
    Register { username: String, email: String },

    /// Add experience to a player, resolving level-ups
    AddExperience {
        player_id: i64,
        /// Negative amounts are passed through and rejected by the service
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },

    /// Add points to a player
    AddPoints {
        player_id: i64,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },

    /// Credit an achievement (no-op if already credited)
    GrantAchievement { player_id: i64, achievement_id: i64 },

    /// Show a player's daily quests, creating missing progress records
    Quests { player_id: i64 },

    /// Complete a daily quest (no-op if already completed)
    CompleteQuest { player_id: i64, quest_id: i64 },

    /// Join a tournament
    JoinTournament { tournament_id: i64, player_id: i64 },

    /// Leave a tournament
    LeaveTournament { tournament_id: i64, player_id: i64 },

    /// Record a placement; the reward is granted the first time only
    RecordResult {
        tournament_id: i64,
        player_id: i64,
        #[arg(long)]
        position: i64,
        #[arg(long, default_value_t = 0)]
        prize: i64,
        #[arg(long, default_value_t = 0)]
        score: i64,
    },

    /// Top players by level and experience
    Leaderboard {
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: u32,
    },

    /// Show a player's profile by username
    Profile {
        username: String,
        /// Only show this many recent games and achievements
        #[arg(long)]
        recent: Option<u32>,
    },

    /// Search players by username
    Search {
        query: Option<String>,
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: u32,
    },

    /// Catalog and player totals
    Stats,

    /// Friend requests
    Friend {
        #[command(subcommand)]
        command: FriendCommands,
    },

    /// Game catalog, play sessions and reviews
    Game {
        #[command(subcommand)]
        command: GameCommands,
    },

    /// Tournament administration
    Tournament {
        #[command(subcommand)]
        command: TournamentCommands,
    },

    /// Badge administration
    Badge {
        #[command(subcommand)]
        command: BadgeCommands,
    },
}

#[derive(Subcommand)]
pub enum FriendCommands {
    /// Send a request (returns the existing one if already sent)
    Send { from_player: i64, to_player: i64 },
    /// Accept or decline a request addressed to `player_id`
    Resolve {
        player_id: i64,
        request_id: i64,
        /// accept or decline
        decision: FriendDecision,
    },
    /// Pending requests addressed to a player
    Pending { player_id: i64 },
    /// Accepted friends of a player
    List { player_id: i64 },
}

#[derive(Subcommand)]
pub enum GameCommands {
    /// List games, newest first
    List {
        #[arg(long, short = 'g')]
        genre: Option<String>,
        #[arg(long, short = 'n')]
        limit: Option<u32>,
    },
    /// List known genres
    Genres,
    /// Show a game's details
    Show {
        game_id: i64,
        /// Include this player's progress in the game
        #[arg(long)]
        player: Option<i64>,
    },
    /// Add a game to the catalog
    Add {
        name: String,
        #[arg(long)]
        genre: String,
        /// Release date as YYYY-MM-DD
        #[arg(long)]
        released: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0.0)]
        rating: f64,
    },
    /// Add an achievement to a game
    AddAchievement {
        game_id: i64,
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// easy, medium or hard
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        #[arg(long, default_value_t = 10)]
        points: i64,
        #[arg(long, default_value_t = 50)]
        experience: i64,
    },
    /// Add a daily quest for a game
    AddQuest {
        game_id: i64,
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 50)]
        points: i64,
        #[arg(long, default_value_t = 100)]
        experience: i64,
    },
    /// Enable or disable a daily quest
    SetQuestActive {
        quest_id: i64,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Start tracking a game for a player
    Play { player_id: i64, game_id: i64 },
    /// Log a play session
    LogSession {
        player_id: i64,
        game_id: i64,
        /// Hours played, one decimal (e.g. 2.5)
        #[arg(long)]
        hours: String,
        #[arg(long, default_value_t = 0)]
        points: i64,
    },
    /// Write or replace a player's review of a game
    Review {
        game_id: i64,
        player_id: i64,
        /// Whole stars, 1-5
        #[arg(long)]
        rating: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
}

#[derive(Subcommand)]
pub enum TournamentCommands {
    /// List tournaments with participant counts
    List,
    /// Show a tournament's details and results
    Show {
        tournament_id: i64,
        #[arg(long)]
        player: Option<i64>,
    },
    /// Create a tournament
    Create {
        game_id: i64,
        name: String,
        /// Start date as YYYY-MM-DD
        #[arg(long)]
        starts: String,
        /// End date as YYYY-MM-DD
        #[arg(long)]
        ends: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        prize_pool: i64,
        #[arg(long, default_value_t = 100)]
        max_participants: i64,
    },
    /// Change a tournament's status
    SetStatus {
        tournament_id: i64,
        /// upcoming, active or finished
        status: TournamentStatus,
    },
}

#[derive(Subcommand)]
pub enum BadgeCommands {
    /// Create a badge (returns the existing one with the same name)
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        requirement: String,
    },
    /// Award a badge to a player
    Award { player_id: i64, badge_id: i64 },
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, FriendCommands};
    use playerhub_core::model::friend::FriendDecision;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_record_result_flags() {
        let cli = Cli::try_parse_from([
            "playerhub",
            "record-result",
            "3",
            "7",
            "--position",
            "1",
            "--prize",
            "500",
        ])
        .expect("valid arguments");

        match cli.command {
            Commands::RecordResult {
                tournament_id,
                player_id,
                position,
                prize,
                score,
            } => {
                assert_eq!((tournament_id, player_id, position, prize, score), (3, 7, 1, 500, 0));
            }
            _ => panic!("expected record-result"),
        }
    }

    #[test]
    fn parses_friend_decisions() {
        let cli = Cli::try_parse_from(["playerhub", "friend", "resolve", "2", "9", "decline"])
            .expect("valid arguments");

        assert!(matches!(
            cli.command,
            Commands::Friend {
                command: FriendCommands::Resolve {
                    player_id: 2,
                    request_id: 9,
                    decision: FriendDecision::Decline,
                }
            }
        ));
    }

    #[test]
    fn negative_amounts_reach_the_service() {
        let cli = Cli::try_parse_from(["playerhub", "add-experience", "1", "-5"])
            .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Commands::AddExperience {
                player_id: 1,
                amount: -5
            }
        ));

        let cli = Cli::try_parse_from(["playerhub", "add-points", "1", "-3"])
            .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Commands::AddPoints {
                player_id: 1,
                amount: -3
            }
        ));
    }

    #[test]
    fn rejects_unknown_decisions() {
        assert!(Cli::try_parse_from(["playerhub", "friend", "resolve", "2", "9", "maybe"]).is_err());
    }
}

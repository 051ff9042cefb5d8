use playerhub_core::Player;
use playerhub_utils::formatting::{level_summary, progress_bar};

const BAR_WIDTH: usize = 20;

pub fn player_line(player: &Player) -> String {
    format!(
        "{} {}",
        level_summary(
            player.level,
            player.experience,
            player.exp_to_next_level(),
            player.total_points
        ),
        progress_bar(player.exp_progress_percent(), BAR_WIDTH)
    )
}

pub fn levels_note(levels_gained: i64) -> String {
    match levels_gained {
        0 => String::new(),
        1 => " (level up!)".to_owned(),
        n => format!(" ({n} level ups!)"),
    }
}

#[cfg(test)]
mod tests {
    use super::{levels_note, player_line};
    use playerhub_core::Player;

    #[test]
    fn player_line_shows_level_and_bar() {
        let mut player = Player::new(1, 1, 0);
        player.level = 2;
        player.experience = 100;
        player.total_points = 40;

        assert_eq!(
            player_line(&player),
            "Lv. 2 | 100/200 XP | 40 pts [##########----------] 50%"
        );
    }

    #[test]
    fn level_notes_pluralize() {
        assert_eq!(levels_note(0), "");
        assert_eq!(levels_note(1), " (level up!)");
        assert_eq!(levels_note(3), " (3 level ups!)");
    }
}

use snooker_score::RedBallCount;

/// Keyboard shortcuts understood by the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Reset,
}

/// Map a key press to a shortcut. Both need Ctrl (or Cmd on macOS).
pub fn shortcut_for(key: &str, ctrl: bool, meta: bool) -> Option<Shortcut> {
    if !(ctrl || meta) {
        return None;
    }
    match key {
        "z" | "Z" => Some(Shortcut::Undo),
        "r" | "R" => Some(Shortcut::Reset),
        _ => None,
    }
}

/// Button label for a point change: `+7`, `-4`.
pub fn format_delta(delta: i32) -> String {
    format!("{:+}", delta)
}

/// Parse the value of the reds `<select>`, keeping `current` on nonsense.
pub fn parse_reds(value: &str, current: RedBallCount) -> RedBallCount {
    match value.parse() {
        Ok(reds) => reds,
        Err(e) => {
            log::debug!("{}", e);
            current
        }
    }
}

/// Extra class for a score that has dropped below zero.
pub fn score_class(score: i32) -> &'static str {
    if score < 0 {
        "score negative"
    } else {
        "score"
    }
}

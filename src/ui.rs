//! HUD and modal markup

use crate::display_name;

/// Id of the button that starts (or restarts) a session
pub const START_BUTTON_ID: &str = "start-button";

/// What the start modal shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalContent {
    /// First visit
    Welcome,
    /// After a finished session
    Retry { score: i32 },
}

impl ModalContent {
    pub fn for_final_score(score: Option<i32>) -> Self {
        match score {
            Some(score) => ModalContent::Retry { score },
            None => ModalContent::Welcome,
        }
    }

    pub fn html(&self) -> String {
        let (heading, heading_class, text, button) = match self {
            ModalContent::Welcome => (
                "Welcome".to_string(),
                "welcome",
                "Please hit start to begin!".to_string(),
                "start",
            ),
            ModalContent::Retry { score } => (
                "Well Done!".to_string(),
                "",
                format!("You gained {} scores.", score),
                "Retry",
            ),
        };
        format!(
            r#"<div class="modal"><div class="modal-container"><div class="form-wrapper"><h1 class="{}">{}</h1><h2 class="decription">{}</h2><button id='{}' class="button-start">{}</button></div></div></div>"#,
            heading_class, heading, text, START_BUTTON_ID, button
        )
    }
}

/// Set counter and score
pub fn scoreboard_html(sets_played: u32, total_sets: u32, score: i32) -> String {
    format!(
        r#"<div class="score-board"><div class="played-sets">set ( {} / {} )</div><div class="score">Score: {}</div></div>"#,
        sets_played, total_sets, score
    )
}

/// Flag and name inside a corner target
pub fn target_html(flag_url: &str, nationality: &str) -> String {
    let name = escape(&display_name(nationality));
    format!(
        r#"<img src="{}" class="flag" alt="{}"/><h3 class="name">{}</h3>"#,
        escape(flag_url),
        name,
        name
    )
}

/// Escape text for HTML content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_variants() {
        let welcome = ModalContent::for_final_score(None).html();
        assert!(welcome.contains("Welcome"));
        assert!(welcome.contains(START_BUTTON_ID));

        let retry = ModalContent::for_final_score(Some(85)).html();
        assert!(retry.contains("You gained 85 scores."));
        assert!(retry.contains(">Retry<"));
    }

    #[test]
    fn test_scoreboard() {
        let html = scoreboard_html(3, 10, -5);
        assert!(html.contains("set ( 3 / 10 )"));
        assert!(html.contains("Score: -5"));
    }

    #[test]
    fn test_target_markup_escapes() {
        let html = target_html("flags/a\"b.png", "thai");
        assert!(html.contains("flags/a&quot;b.png"));
        assert!(html.contains(">Thai<"));
    }
}

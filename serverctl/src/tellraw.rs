use serde::Serialize;

use crate::{events::Origin, text_image::ColoredGlyph};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub text: String,
    pub color: String,
}

impl Fragment {
    pub fn new(text: impl Into<String>, color: impl Into<String>) -> Fragment {
        Fragment { text: text.into(), color: color.into() }
    }
}

pub fn encode(fragments: &[Fragment]) -> serde_json::Result<String> {
    Ok(format!("/tellraw @a {}", serde_json::to_string(fragments)?))
}

/// `@name: text`, with `@` colored by where the message came from.
pub fn chat_line(origin: Origin, display_name: &str, text: &str, edited: bool) -> Vec<Fragment> {
    let at_color = match origin {
        Origin::Chat => "blue",
        Origin::Server => "gold",
    };
    let mut fragments = vec![
        Fragment::new("@", at_color),
        Fragment::new(display_name, "yellow"),
    ];
    if edited {
        fragments.push(Fragment::new(" corrects", "dark_gray"));
    }
    fragments.push(Fragment::new(": ", "white"));
    fragments.push(Fragment::new(text, "white"));
    fragments
}

pub fn glyph_row(row: &[ColoredGlyph]) -> Vec<Fragment> {
    row.iter()
        .map(|glyph| Fragment::new(glyph.symbol.to_string(), glyph.color.clone()))
        .collect()
}

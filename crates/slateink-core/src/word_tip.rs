//! Interface boundary to the word-suggestion tooltip collaborator.
//!
//! The collaborator itself (text capture, network call, tooltip widget)
//! lives outside this crate; what is specified here is exactly the data that
//! crosses the boundary: the request built from the active stencil and the
//! formatting of a suggestion response into a tooltip string.

use serde::{Deserialize, Serialize};

use crate::stencil::{Stencil, StencilKind, StencilTrait};

/// Maximum number of suggestions rendered into a tooltip.
pub const MAX_TIP_WORDS: usize = 7;

/// Marker shown when the final word of a suggestion chain was reached.
const DONE_MARKER: &str = "<done>";

/// Shape categories the suggestion protocol understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipCategory {
    Line,
    Rectangle,
    Ellipse,
    Vector,
    Axes,
    Equation,
    Graphics,
    Statement,
}

impl TipCategory {
    /// Protocol name of this category.
    pub fn name(&self) -> &'static str {
        match self {
            TipCategory::Line => "line",
            TipCategory::Rectangle => "rectangle",
            TipCategory::Ellipse => "ellipse",
            TipCategory::Vector => "vector",
            TipCategory::Axes => "axes",
            TipCategory::Equation => "equation",
            TipCategory::Graphics => "graphics",
            TipCategory::Statement => "statement",
        }
    }

    /// Map an external discriminator string to a category.
    ///
    /// Unknown discriminators are logged and degrade to `Statement`.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "line" => TipCategory::Line,
            "rectangle" => TipCategory::Rectangle,
            "ellipse" => TipCategory::Ellipse,
            "vector" => TipCategory::Vector,
            "axes" => TipCategory::Axes,
            "equation" => TipCategory::Equation,
            "graphics" | "image" => TipCategory::Graphics,
            "statement" | "text" | "label" => TipCategory::Statement,
            other => {
                log::warn!("unrecognized stencil type {other:?}; treating as statement");
                TipCategory::Statement
            }
        }
    }
}

impl From<StencilKind> for TipCategory {
    fn from(kind: StencilKind) -> Self {
        match kind {
            StencilKind::Rectangle => TipCategory::Rectangle,
            StencilKind::Image => TipCategory::Graphics,
            StencilKind::Text | StencilKind::Label => TipCategory::Statement,
        }
    }
}

/// Request sent to the suggestion collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipRequest {
    #[serde(rename = "type")]
    pub category: TipCategory,
    pub text: String,
    pub symbol: Option<String>,
}

/// Build a suggestion request from the active stencil.
pub fn tip_request(stencil: &Stencil, symbol: Option<String>) -> TipRequest {
    TipRequest {
        category: stencil.kind().into(),
        text: clean_text(stencil.text_content().unwrap_or_default()),
        symbol,
    }
}

/// Normalize captured text: line breaks become spaces, edges are trimmed.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.to_ascii_lowercase().find("<br") {
        out.push_str(&rest[..pos]);
        out.push(' ');
        let after = &rest[pos..];
        rest = match after.find('>') {
            Some(end) => &after[end + 1..],
            None => "",
        };
    }
    out.push_str(rest);
    out.replace(['\n', '\r'], " ").trim().to_string()
}

/// Suggestion response from the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionList {
    pub words: Vec<String>,
    /// True when the final word of the chain was reached.
    #[serde(rename = "last-word", default)]
    pub last_word: bool,
}

impl SuggestionList {
    /// Render the tooltip string: at most [`MAX_TIP_WORDS`] words joined by
    /// commas, a done marker when the final word was reached, and an
    /// ellipsis when more suggestions exist than shown. `None` when there is
    /// nothing to show.
    pub fn format_tip(&self) -> Option<String> {
        if self.words.is_empty() && !self.last_word {
            return None;
        }
        let shown = self.words.len().min(MAX_TIP_WORDS);
        let mut out = String::new();
        if self.last_word {
            out.push_str(DONE_MARKER);
        }
        for word in &self.words[..shown] {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(word);
        }
        if shown < self.words.len() {
            out.push_str(", …");
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stencil::{RectData, Rectangle, Text, TextData};

    fn suggestions(words: &[&str], last_word: bool) -> SuggestionList {
        SuggestionList {
            words: words.iter().map(|w| w.to_string()).collect(),
            last_word,
        }
    }

    #[test]
    fn test_format_tip_joins_words() {
        let list = suggestions(&["force", "friction"], false);
        assert_eq!(list.format_tip().unwrap(), "force, friction");
    }

    #[test]
    fn test_format_tip_caps_and_appends_ellipsis() {
        let list = suggestions(&["a", "b", "c", "d", "e", "f", "g", "h", "i"], false);
        assert_eq!(list.format_tip().unwrap(), "a, b, c, d, e, f, g, …");
    }

    #[test]
    fn test_format_tip_done_marker() {
        let list = suggestions(&["mass"], true);
        assert_eq!(list.format_tip().unwrap(), "<done>, mass");
        assert_eq!(suggestions(&[], true).format_tip().unwrap(), "<done>");
    }

    #[test]
    fn test_format_tip_empty() {
        assert_eq!(suggestions(&[], false).format_tip(), None);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  the block<br>slides\ndown  "), "the block slides down");
        assert_eq!(clean_text("a<br />b<BR/>c"), "a b c");
    }

    #[test]
    fn test_tip_request_from_stencils() {
        let rect = Stencil::Rectangle(Rectangle::new(RectData::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(tip_request(&rect, None).category, TipCategory::Rectangle);
        assert_eq!(tip_request(&rect, None).text, "");

        let text = Stencil::Text(Text::new(TextData::new(0.0, 0.0, 10.0, 10.0, "v = 3 m/s")));
        let req = tip_request(&text, Some("v".to_string()));
        assert_eq!(req.category, TipCategory::Statement);
        assert_eq!(req.text, "v = 3 m/s");
        assert_eq!(req.symbol.as_deref(), Some("v"));
    }

    #[test]
    fn test_unknown_type_degrades_to_statement() {
        assert_eq!(TipCategory::from_type_name("scribble"), TipCategory::Statement);
        assert_eq!(TipCategory::from_type_name("vector"), TipCategory::Vector);
    }
}

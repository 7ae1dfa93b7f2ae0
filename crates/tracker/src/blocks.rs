//! Structured message blocks.
//!
//! A notification is a sequence of [`Block`]s. The serialised form is the
//! messaging service's block layout (`{"type": "section", ...}`), so sinks can
//! forward blocks without another translation step.

use serde::{Deserialize, Serialize};

/// A text element inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    /// Text with lightweight markup (`*bold*`, `` `code` ``).
    Mrkdwn {
        /// Rendered text.
        text: String,
    },
    /// Unformatted text.
    PlainText {
        /// Rendered text.
        text: String,
        /// Whether emoji shortcodes are expanded.
        emoji: bool,
    },
}

impl TextObject {
    /// Creates a markup text element.
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    /// Creates a plain text element with emoji expansion enabled.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText {
            text: text.into(),
            emoji: true,
        }
    }

    /// Returns the text content.
    pub fn text(&self) -> &str {
        match self {
            Self::Mrkdwn { text } | Self::PlainText { text, .. } => text,
        }
    }
}

/// One layout block of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Large title line.
    Header {
        /// Title text; must be plain text.
        text: TextObject,
    },
    /// A paragraph and/or a two-column field grid.
    Section {
        /// Paragraph text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        /// Field grid, laid out two per row.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
    },
    /// Horizontal rule.
    Divider,
    /// Small, muted trailing line.
    Context {
        /// Context elements.
        elements: Vec<TextObject>,
    },
}

impl Block {
    /// A section holding a single paragraph.
    pub fn text_section(text: TextObject) -> Self {
        Self::Section {
            text: Some(text),
            fields: Vec::new(),
        }
    }

    /// A section holding only a field grid.
    pub fn field_section(fields: Vec<TextObject>) -> Self {
        Self::Section { text: None, fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blocks_serialise_to_the_block_layout() {
        let blocks = vec![
            Block::Header {
                text: TextObject::plain("Swipp App Status Update"),
            },
            Block::field_section(vec![TextObject::mrkdwn("*Version:* `2.1`")]),
            Block::Divider,
        ];

        assert_eq!(
            serde_json::to_value(&blocks).unwrap(),
            json!([
                {"type": "header", "text": {"type": "plain_text", "text": "Swipp App Status Update", "emoji": true}},
                {"type": "section", "fields": [{"type": "mrkdwn", "text": "*Version:* `2.1`"}]},
                {"type": "divider"}
            ])
        );
    }
}

/*!
 * Status Bar Items
 * One segment of the i3bar protocol and the line decoding around it
 */

use serde::{Deserialize, Serialize};

/// Colour given to status command items that arrive without one.
pub const DEFAULT_COLOR: &str = "#FFFFFF";
/// Colour of a connected Bluetooth device. No leading `#`, unlike `DEFAULT_COLOR`.
pub const CONNECTED_COLOR: &str = "00FF00";
/// Colour of a known but disconnected Bluetooth device.
pub const DISCONNECTED_COLOR: &str = "FF0000";
/// Text shown in place of a line that could not be read or decoded.
pub const ERROR_TEXT: &str = "error";

/// A renderable segment. Unknown upstream fields are ignored on decode and
/// all four fields are always written on encode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub full_text: String,
}

impl StatusItem {
    /// The single item that replaces an unreadable line.
    pub fn error() -> Self {
        Self {
            full_text: ERROR_TEXT.to_string(),
            ..Default::default()
        }
    }

    /// Substitute the default colour when none was given.
    pub fn normalize_color(&mut self) {
        if self.color.is_empty() {
            self.color = DEFAULT_COLOR.to_string();
        }
    }
}

/// Decode one line of i3status output into a batch of items.
///
/// i3status continues its top-level array by prefixing every line after the
/// first with `,`, so leading commas are dropped before decoding.
pub fn decode_line(line: &str) -> Result<Vec<StatusItem>, serde_json::Error> {
    let line = line.trim_end_matches(['\r', '\n']).trim_start_matches(',');
    serde_json::from_str(line)
}

/// Like [`decode_line`], but a line that fails to decode becomes a one-item
/// error batch.
pub fn batch_from_line(line: &str) -> Vec<StatusItem> {
    match decode_line(line) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Undecodable status line {:?}: {}", line, e);
            vec![StatusItem::error()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_continuation_line() {
        let items = decode_line(
            r##",[{"name":"cpu_usage","instance":"","color":"#00FF00","full_text":"cpu: 10%"},{"full_text":"12:00"}]"##,
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "cpu_usage");
        assert_eq!(items[0].color, "#00FF00");
        assert_eq!(items[1].full_text, "12:00");
        assert_eq!(items[1].color, "");
    }

    #[test]
    fn ignores_unknown_fields() {
        let items =
            decode_line(r#"[{"full_text":"W: up","markup":"none","separator":true,"min_width":10}]"#)
                .unwrap();
        assert_eq!(items, vec![StatusItem { full_text: "W: up".into(), ..Default::default() }]);
    }

    #[test]
    fn bad_line_becomes_error_batch() {
        let batch = batch_from_line("not json");
        assert_eq!(batch, vec![StatusItem::error()]);
        assert_eq!(batch[0].full_text, "error");
    }

    #[test]
    fn protocol_header_is_not_a_batch() {
        assert_eq!(batch_from_line(r#"{"version":1}"#), vec![StatusItem::error()]);
        assert_eq!(batch_from_line("["), vec![StatusItem::error()]);
    }

    #[test]
    fn empty_color_gets_default() {
        let mut item = StatusItem { full_text: "x".into(), ..Default::default() };
        item.normalize_color();
        assert_eq!(item.color, DEFAULT_COLOR);

        let mut colored = StatusItem { color: "#123456".into(), ..Default::default() };
        colored.normalize_color();
        assert_eq!(colored.color, "#123456");
    }

    #[test]
    fn encodes_every_field_in_order() {
        let json = serde_json::to_string(&StatusItem {
            full_text: "cpu: 10%".into(),
            color: DEFAULT_COLOR.into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json, r##"{"name":"","instance":"","color":"#FFFFFF","full_text":"cpu: 10%"}"##);
    }
}

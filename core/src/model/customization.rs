// bagworks/src/model/customization.rs

//! Structured customization captured when a product goes into the cart.
//!
//! Older rows only carry a free-text summary such as
//! `Colors: Red, Blue, Print: Screen, Text: ACME, Logo: Uploaded`.
//! [`Customization::render_notes`] produces that summary for display and
//! [`Customization::parse_legacy_notes`] reads it back for rows that predate
//! the structured record.

use serde::{Deserialize, Serialize};

const TEXT_MARKER: &str = "Text: ";
const FIELD_DELIMITER: &str = ", ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
  #[serde(default)]
  pub colors: Vec<String>,
  #[serde(default)]
  pub print_type: Option<String>,
  #[serde(default)]
  pub custom_text: Option<String>,
  /// Reference into object storage, as returned by the upload collaborator.
  #[serde(default)]
  pub logo_ref: Option<String>,
}

impl Customization {
  /// Blank strings become `None` and blank colors are dropped.
  pub fn normalized(self) -> Self {
    fn clean(value: Option<String>) -> Option<String> {
      value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }
    Self {
      colors: self
        .colors
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect(),
      print_type: clean(self.print_type),
      custom_text: clean(self.custom_text),
      logo_ref: clean(self.logo_ref),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.colors.is_empty() && self.print_type.is_none() && self.custom_text.is_none() && self.logo_ref.is_none()
  }

  /// The human-readable summary stored as `notes`. Empty when nothing was chosen.
  pub fn render_notes(&self) -> String {
    let mut parts = Vec::new();
    if !self.colors.is_empty() {
      parts.push(format!("Colors: {}", self.colors.join(FIELD_DELIMITER)));
    }
    if let Some(print_type) = &self.print_type {
      parts.push(format!("Print: {}", print_type));
    }
    if let Some(text) = &self.custom_text {
      parts.push(format!("{}{}", TEXT_MARKER, text));
    }
    if self.logo_ref.is_some() {
      parts.push("Logo: Uploaded".to_string());
    }
    parts.join(FIELD_DELIMITER)
  }

  /// Recovers what can be recovered from a legacy `notes` string.
  ///
  /// Only the custom text is reliably delimited: it runs from `Text: ` to the
  /// next `, ` (or the end). Colors and print type are read on a best-effort
  /// basis; the logo reference is never in the text and comes from the row.
  pub fn parse_legacy_notes(notes: &str, logo_ref: Option<&str>) -> Self {
    let custom_text = extract_after(notes, TEXT_MARKER);
    let print_type = extract_after(notes, "Print: ");
    let colors = notes
      .find("Colors: ")
      .map(|start| {
        let rest = &notes[start + "Colors: ".len()..];
        let end = ["Print: ", TEXT_MARKER, "Logo: "]
          .iter()
          .filter_map(|m| rest.find(m))
          .min()
          .unwrap_or(rest.len());
        rest[..end]
          .split(',')
          .map(|c| c.trim().to_string())
          .filter(|c| !c.is_empty())
          .collect()
      })
      .unwrap_or_default();

    Customization {
      colors,
      print_type,
      custom_text,
      logo_ref: logo_ref.map(str::to_string),
    }
    .normalized()
  }
}

fn extract_after(haystack: &str, marker: &str) -> Option<String> {
  let start = haystack.find(marker)? + marker.len();
  let rest = &haystack[start..];
  let end = rest.find(FIELD_DELIMITER).unwrap_or(rest.len());
  let value = rest[..end].trim();
  (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> Customization {
    Customization {
      colors: vec!["Red".into(), "Navy".into()],
      print_type: Some("Screen".into()),
      custom_text: Some("ACME Stores".into()),
      logo_ref: Some("logos/acme.png".into()),
    }
  }

  #[test]
  fn renders_legacy_summary() {
    assert_eq!(
      sample().render_notes(),
      "Colors: Red, Navy, Print: Screen, Text: ACME Stores, Logo: Uploaded"
    );
    assert_eq!(Customization::default().render_notes(), "");
  }

  #[test]
  fn legacy_text_runs_to_next_delimiter() {
    let parsed = Customization::parse_legacy_notes("Print: Foil, Text: Hello World, Logo: Uploaded", None);
    assert_eq!(parsed.custom_text.as_deref(), Some("Hello World"));
    assert_eq!(parsed.print_type.as_deref(), Some("Foil"));
  }

  #[test]
  fn legacy_without_marker_has_no_text() {
    let parsed = Customization::parse_legacy_notes("Colors: Black", Some("logos/x.png"));
    assert_eq!(parsed.custom_text, None);
    assert_eq!(parsed.colors, vec!["Black".to_string()]);
    assert_eq!(parsed.logo_ref.as_deref(), Some("logos/x.png"));
  }

  #[test]
  fn normalized_drops_blanks() {
    let c = Customization {
      colors: vec![" ".into(), "Green ".into()],
      print_type: Some("  ".into()),
      custom_text: None,
      logo_ref: Some(String::new()),
    }
    .normalized();
    assert_eq!(c.colors, vec!["Green".to_string()]);
    assert!(c.print_type.is_none());
    assert!(c.logo_ref.is_none());
  }
}

//! Helpers for wrangling YouTube identifiers.

use regex::Regex;
use std::sync::OnceLock;

/// Extract the 11-character video ID from a YouTube URL or bare ID.
///
/// Handles watch URLs, youtu.be short links, shorts, embeds, and inputs that
/// already are an ID. Returns `None` when nothing matches.
pub fn extract_video_id(input: &str) -> Option<String> {
  static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

  let input = input.trim();
  if input.is_empty() {
    return None;
  }

  let patterns = PATTERNS.get_or_init(|| {
    [
      r"(?:v=|/v/|/embed/)([0-9A-Za-z_-]{11})",
      r"youtu\.be/([0-9A-Za-z_-]{11})",
      r"shorts/([0-9A-Za-z_-]{11})",
      r"^([0-9A-Za-z_-]{11})$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("hard-coded pattern"))
    .collect()
  });

  for pattern in patterns {
    if let Some(captures) = pattern.captures(input) {
      return Some(captures[1].to_string());
    }
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_from_watch_urls() {
    assert_eq!(
      extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
      Some("dQw4w9WgXcQ".to_string())
    );
    assert_eq!(
      extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s"),
      Some("dQw4w9WgXcQ".to_string())
    );
  }

  #[test]
  fn extracts_from_short_links_shorts_and_embeds() {
    assert_eq!(
      extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
      Some("dQw4w9WgXcQ".to_string())
    );
    assert_eq!(
      extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
      Some("dQw4w9WgXcQ".to_string())
    );
    assert_eq!(
      extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
      Some("dQw4w9WgXcQ".to_string())
    );
  }

  #[test]
  fn accepts_bare_ids() {
    assert_eq!(
      extract_video_id("dQw4w9WgXcQ"),
      Some("dQw4w9WgXcQ".to_string())
    );
  }

  #[test]
  fn rejects_garbage() {
    assert_eq!(extract_video_id(""), None);
    assert_eq!(extract_video_id("not a video"), None);
  }
}

// bagworks/src/settings.rs
use crate::model::StatusMessages;
use crate::outbox::{RetryPolicy, DEFAULT_DEAD_LETTER_LIMIT};

/// Tunables for the storefront core. The server fills these from its
/// environment; tests use `Default`.
#[derive(Debug, Clone)]
pub struct StorefrontSettings {
  /// Lead time for cart checkouts that carry no per-item lead time.
  pub default_lead_time_days: i32,
  pub notification_page_size: i64,
  /// Longer message bodies are cut to this many characters in notifications.
  pub message_preview_chars: usize,
  pub retry: RetryPolicy,
  /// Exhausted side effects kept for inspection.
  pub dead_letter_limit: usize,
  pub status_messages: StatusMessages,
  /// Business number for quote deep links, digits only.
  pub whatsapp_number: Option<String>,
  /// Attempt queued side effects right after the primary write. When off,
  /// only the background worker delivers them.
  pub inline_side_effects: bool,
}

impl Default for StorefrontSettings {
  fn default() -> Self {
    Self {
      default_lead_time_days: 7,
      notification_page_size: 50,
      message_preview_chars: 100,
      retry: RetryPolicy::default(),
      dead_letter_limit: DEFAULT_DEAD_LETTER_LIMIT,
      status_messages: StatusMessages::default(),
      whatsapp_number: None,
      inline_side_effects: true,
    }
  }
}

// bagworks/src/outbox.rs

//! Post-commit side effects.
//!
//! Workflows never call the webhook or write notifications inline with their
//! primary write. They enqueue a [`SideEffect`] once the primary write has
//! committed, and an [`OutboxProcessor`] delivers it with its own
//! [`RetryPolicy`]. Entries that run out of attempts are kept as dead letters,
//! up to a limit; past it the oldest are dropped.

use crate::error::BagworksResult;
use crate::model::NotificationDraft;
use crate::services::notifications::NotificationDispatcher;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Outbound "order placed" hook to the business's messaging channel.
#[async_trait]
pub trait OrderWebhook: Send + Sync {
  async fn order_placed(&self, order_id: Uuid) -> AnyResult<()>;
}

/// Used when no webhook endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledWebhook;

#[async_trait]
impl OrderWebhook for DisabledWebhook {
  async fn order_placed(&self, order_id: Uuid) -> AnyResult<()> {
    debug!(%order_id, "Order webhook disabled; skipping.");
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
  Notify { user_id: Uuid, draft: NotificationDraft },
  /// Expanded into one `Notify` per admin when processed.
  NotifyAdmins { draft: NotificationDraft },
  OrderWebhook { order_id: Uuid },
}

impl SideEffect {
  fn kind(&self) -> &'static str {
    match self {
      SideEffect::Notify { .. } => "notify",
      SideEffect::NotifyAdmins { .. } => "notify_admins",
      SideEffect::OrderWebhook { .. } => "order_webhook",
    }
  }
}

/// Exponential backoff: `base_delay`, then twice that, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_delay: Duration::from_secs(1),
    }
  }
}

impl RetryPolicy {
  /// Delay before attempt `attempts + 1`, given `attempts` already made.
  pub fn delay_after(&self, attempts: u32) -> Duration {
    let exponent = attempts.saturating_sub(1).min(16);
    self.base_delay.saturating_mul(1u32 << exponent)
  }
}

#[derive(Debug, Clone)]
pub struct OutboxEntry {
  pub id: u64,
  pub effect: SideEffect,
  pub attempts: u32,
  pub last_error: Option<String>,
  not_before: Instant,
}

pub const DEFAULT_DEAD_LETTER_LIMIT: usize = 1000;

#[derive(Debug)]
pub struct Outbox {
  queue: Mutex<VecDeque<OutboxEntry>>,
  dead_letters: Mutex<VecDeque<OutboxEntry>>,
  dead_letter_limit: usize,
  next_id: AtomicU64,
  wake: Notify,
}

impl Default for Outbox {
  fn default() -> Self {
    Self::with_dead_letter_limit(DEFAULT_DEAD_LETTER_LIMIT)
  }
}

impl Outbox {
  pub fn new() -> Self {
    Self::default()
  }

  /// Keeps at most `limit` dead letters, oldest dropped first.
  pub fn with_dead_letter_limit(limit: usize) -> Self {
    Self {
      queue: Mutex::new(VecDeque::new()),
      dead_letters: Mutex::new(VecDeque::new()),
      dead_letter_limit: limit,
      next_id: AtomicU64::new(0),
      wake: Notify::new(),
    }
  }

  pub fn enqueue(&self, effect: SideEffect) -> u64 {
    let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    debug!(entry_id = id, kind = effect.kind(), "Side effect queued.");
    self.queue.lock().push_back(OutboxEntry {
      id,
      effect,
      attempts: 0,
      last_error: None,
      not_before: Instant::now(),
    });
    self.wake.notify_one();
    id
  }

  pub fn pending_len(&self) -> usize {
    self.queue.lock().len()
  }

  pub fn pending(&self) -> Vec<SideEffect> {
    self.queue.lock().iter().map(|e| e.effect.clone()).collect()
  }

  /// Oldest first.
  pub fn dead_letters(&self) -> Vec<OutboxEntry> {
    self.dead_letters.lock().iter().cloned().collect()
  }

  /// Hands the dead letters over to the caller and forgets them.
  pub fn take_dead_letters(&self) -> Vec<OutboxEntry> {
    self.dead_letters.lock().drain(..).collect()
  }

  /// Removes and returns entries that are due, or all of them with `ignore_backoff`.
  fn take_ready(&self, ignore_backoff: bool) -> Vec<OutboxEntry> {
    let now = Instant::now();
    let mut queue = self.queue.lock();
    let (ready, waiting): (VecDeque<_>, VecDeque<_>) =
      queue.drain(..).partition(|e| ignore_backoff || e.not_before <= now);
    *queue = waiting;
    ready.into()
  }

  fn next_due(&self) -> Option<Instant> {
    self.queue.lock().iter().map(|e| e.not_before).min()
  }

  fn requeue(&self, entry: OutboxEntry) {
    self.queue.lock().push_back(entry);
  }

  fn bury(&self, entry: OutboxEntry) {
    let mut dead = self.dead_letters.lock();
    dead.push_back(entry);
    while dead.len() > self.dead_letter_limit {
      if let Some(dropped) = dead.pop_front() {
        warn!(entry_id = dropped.id, kind = dropped.effect.kind(), "Dead letter limit reached; oldest dropped.");
      }
    }
  }
}

/// Counts from one processing pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutboxReport {
  pub delivered: usize,
  pub retrying: usize,
  pub dead: usize,
}

impl OutboxReport {
  fn absorb(&mut self, pass: OutboxReport) {
    self.delivered += pass.delivered;
    self.dead += pass.dead;
    self.retrying = pass.retrying;
  }
}

pub struct OutboxProcessor {
  outbox: Arc<Outbox>,
  dispatcher: NotificationDispatcher,
  webhook: Arc<dyn OrderWebhook>,
  policy: RetryPolicy,
  inline: bool,
}

impl OutboxProcessor {
  pub fn new(
    outbox: Arc<Outbox>,
    dispatcher: NotificationDispatcher,
    webhook: Arc<dyn OrderWebhook>,
    policy: RetryPolicy,
  ) -> Self {
    Self {
      outbox,
      dispatcher,
      webhook,
      policy,
      inline: true,
    }
  }

  /// With `inline` off, [`OutboxProcessor::submit`] only queues and the
  /// background loop does all delivery.
  pub fn with_inline(mut self, inline: bool) -> Self {
    self.inline = inline;
    self
  }

  pub fn is_inline(&self) -> bool {
    self.inline
  }

  /// Queues effects from a committed write and, when inline, makes a first
  /// delivery attempt straight away. Never fails.
  pub async fn submit(&self, effects: impl IntoIterator<Item = SideEffect>) {
    for effect in effects {
      self.outbox.enqueue(effect);
    }
    if self.inline {
      self.process_due().await;
    }
  }

  pub fn outbox(&self) -> &Arc<Outbox> {
    &self.outbox
  }

  /// One attempt for every entry whose backoff has elapsed, including
  /// entries queued by the pass itself (admin fan-out).
  pub async fn process_due(&self) -> OutboxReport {
    let mut total = OutboxReport::default();
    loop {
      let pass = self.process_batch(false).await;
      total.absorb(pass);
      if pass.delivered == 0 {
        break;
      }
    }
    total
  }

  /// Delivers everything queued, ignoring backoff, until each entry has
  /// succeeded or exhausted its attempts. For tests and shutdown.
  #[instrument(name = "OutboxProcessor::process_pending", skip_all)]
  pub async fn process_pending(&self) -> OutboxReport {
    let mut total = OutboxReport::default();
    while self.outbox.pending_len() > 0 {
      let pass = self.process_batch(true).await;
      total.absorb(pass);
    }
    total
  }

  /// Background loop. Sleeps until woken by an enqueue or until the next
  /// retry is due. Runs until the task is dropped.
  pub async fn run(self: Arc<Self>) {
    info!(max_attempts = self.policy.max_attempts, "Outbox processor started.");
    loop {
      self.process_due().await;
      let wait = match self.outbox.next_due() {
        Some(due) => due.saturating_duration_since(Instant::now()),
        None => Duration::from_secs(60),
      };
      tokio::select! {
        _ = self.outbox.wake.notified() => {}
        _ = tokio::time::sleep(wait) => {}
      }
    }
  }

  async fn process_batch(&self, ignore_backoff: bool) -> OutboxReport {
    let mut report = OutboxReport::default();
    for mut entry in self.outbox.take_ready(ignore_backoff) {
      entry.attempts += 1;
      match self.deliver(&entry.effect).await {
        Ok(()) => {
          debug!(entry_id = entry.id, kind = entry.effect.kind(), attempt = entry.attempts, "Side effect delivered.");
          report.delivered += 1;
        }
        Err(e) if entry.attempts >= self.policy.max_attempts => {
          error!(
            entry_id = entry.id,
            kind = entry.effect.kind(),
            attempt = entry.attempts,
            error = %e,
            "Side effect failed permanently; moved to dead letters."
          );
          entry.last_error = Some(e.to_string());
          self.outbox.bury(entry);
          report.dead += 1;
        }
        Err(e) => {
          let delay = self.policy.delay_after(entry.attempts);
          warn!(
            entry_id = entry.id,
            kind = entry.effect.kind(),
            attempt = entry.attempts,
            retry_in_ms = delay.as_millis() as u64,
            error = %e,
            "Side effect failed; will retry."
          );
          entry.last_error = Some(e.to_string());
          entry.not_before = Instant::now() + delay;
          self.outbox.requeue(entry);
          report.retrying += 1;
        }
      }
    }
    report
  }

  async fn deliver(&self, effect: &SideEffect) -> BagworksResult<()> {
    match effect {
      SideEffect::Notify { user_id, draft } => {
        self.dispatcher.try_notify(*user_id, draft.clone()).await?;
      }
      SideEffect::NotifyAdmins { draft } => {
        let admins = self.dispatcher.admin_recipients().await?;
        if admins.is_empty() {
          debug!(title = %draft.title, "No admins to notify.");
        }
        for user_id in admins {
          self.outbox.enqueue(SideEffect::Notify {
            user_id,
            draft: draft.clone(),
          });
        }
      }
      SideEffect::OrderWebhook { order_id } => {
        self.webhook.order_placed(*order_id).await?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn backoff_doubles() {
    let policy = RetryPolicy {
      max_attempts: 4,
      base_delay: Duration::from_millis(100),
    };
    assert_eq!(policy.delay_after(1), Duration::from_millis(100));
    assert_eq!(policy.delay_after(2), Duration::from_millis(200));
    assert_eq!(policy.delay_after(3), Duration::from_millis(400));
  }

  #[test]
  fn enqueue_assigns_increasing_ids() {
    let outbox = Outbox::new();
    let a = outbox.enqueue(SideEffect::OrderWebhook { order_id: Uuid::nil() });
    let b = outbox.enqueue(SideEffect::OrderWebhook { order_id: Uuid::nil() });
    assert!(b > a);
    assert_eq!(outbox.pending_len(), 2);
  }
}

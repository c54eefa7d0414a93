// storefront/src/web/sse.rs

//! Server-sent event responses over a realtime subscription. The stream
//! owns the subscription, so a disconnecting client tears it down.

use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::web::Bytes;
use actix_web::HttpResponse;
use bagworks::{RealtimeEvent, Subscription};
use futures_util::stream;
use tracing::warn;

pub fn event_stream(subscription: Subscription) -> HttpResponse {
  let events = stream::unfold(subscription, |mut subscription| async move {
    loop {
      let event = subscription.recv().await?;
      if let Some(frame) = frame(&event) {
        return Some((Ok::<_, actix_web::Error>(Bytes::from(frame)), subscription));
      }
    }
  });
  HttpResponse::Ok()
    .insert_header((CONTENT_TYPE, "text/event-stream"))
    .insert_header((CACHE_CONTROL, "no-cache"))
    .streaming(events)
}

fn frame(event: &RealtimeEvent) -> Option<String> {
  let (name, data) = match event {
    RealtimeEvent::NotificationInserted(n) => ("notification", serde_json::to_string(n)),
    RealtimeEvent::MessageInserted(m) => ("message", serde_json::to_string(m)),
  };
  match data {
    Ok(json) => Some(format!("event: {}\ndata: {}\n\n", name, json)),
    Err(e) => {
      warn!(error = %e, "Dropping realtime event that failed to serialize.");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bagworks::OrderMessage;
  use chrono::Utc;
  use uuid::Uuid;

  #[test]
  fn message_frame_is_a_named_event() {
    let message = OrderMessage {
      id: Uuid::new_v4(),
      order_id: Uuid::new_v4(),
      sender_id: Uuid::new_v4(),
      recipient_id: Uuid::new_v4(),
      message: "Proof attached".into(),
      is_read: false,
      created_at: Utc::now(),
    };
    let frame = frame(&RealtimeEvent::MessageInserted(message)).unwrap();
    assert!(frame.starts_with("event: message\ndata: {"));
    assert!(frame.contains("\"message\":\"Proof attached\""));
    assert!(frame.ends_with("\n\n"));
  }
}

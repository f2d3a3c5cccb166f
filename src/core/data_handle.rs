use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::core::playback::PlaybackFrame;

#[derive(Serialize)]
struct FramePayload<'a> {
    seq: u64,
    #[serde(flatten)]
    frame: &'a PlaybackFrame,
}

/// Pushes every playback frame to the socket as JSON text until the
/// client goes away or the engine is dropped.
pub async fn handle_ws_playback(mut socket: WebSocket, mut frames: watch::Receiver<PlaybackFrame>) {
    info!("playback stream opened");

    let mut seq: u64 = 0;

    // current frame first, so the client does not wait for the next tick
    frames.mark_changed();

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("ws receive failed: {}", e);
                        break;
                    }
                    Some(Ok(_)) => continue,
                }
            }
        }

        // serialize under the borrow, send after releasing it
        let json = {
            let frame = frames.borrow_and_update();
            match serde_json::to_string(&FramePayload { seq, frame: &frame }) {
                Ok(j) => j,
                Err(e) => {
                    error!("json serialize error: {}", e);
                    return;
                }
            }
        };

        if let Err(e) = socket.send(Message::Text(json.into())).await {
            warn!("ws send failed: {}", e);
            return;
        }

        seq += 1;
    }

    info!("playback stream closed after {} frames", seq);
}

//! Viewer server.
//!
//! Streams the fleet to websocket clients. After every autonomous tick, each connected client
//! receives one [`ViewerFrame`] as JSON. Frames are built from a [`FleetSnapshot`] taken under
//! the fleet lock, so a client never sees a robot whose position, battery and path disagree.
//!
//! # Examples
//!
//! Serve the fleet while the autonomous loop runs:
//! ```no_run
//! use gridbots::{fleet::Fleet, launch_autonomous_loop, share, viewer, AUTONOMOUS_PERIOD};
//!
//! #[tokio::main]
//! async fn main() {
//!     let fleet = share(Fleet::standard());
//!     let autonomous = launch_autonomous_loop(fleet.clone(), AUTONOMOUS_PERIOD, Some(9))
//!         .expect("period is non-zero");
//!     let addr = viewer::serve(fleet, None, autonomous.ticks.clone())
//!         .await
//!         .expect("couldn't start the viewer");
//!     println!("viewer listening on {addr}");
//!
//!     autonomous.handle.await.expect("autonomous loop panicked");
//! }
//! ```

use futures_util::{stream::FusedStream, SinkExt};
use serde::Serialize;
use std::{
    fmt, io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::watch,
};
use tracing::{debug, info, warn};

use crate::{fleet::FleetSnapshot, IgnoreMutexErr, SharedFleet};

/// default viewer ip
pub const VIEWER_IP: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);

/// default viewer port
pub const VIEWER_PORT: u16 = 8282;

/// A frame sent to each viewer client.
#[derive(Serialize, Debug, Clone)]
pub struct ViewerFrame {
    pub fleet: FleetSnapshot,
    /// text rendering of the same state
    pub grid: String,
}

#[derive(Debug)]
pub enum ViewerError {
    Bind(io::Error),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::Bind(e) => write!(f, "couldn't bind the viewer socket: {e}"),
        }
    }
}

impl std::error::Error for ViewerError {}

/// Returns a new `ViewerFrame`, built while holding the fleet lock.
pub fn make_frame(fleet: &SharedFleet) -> ViewerFrame {
    let fleet = fleet.lock().unwrap_ignore_poison();
    ViewerFrame {
        fleet: fleet.snapshot(),
        grid: fleet.render(),
    }
}

/// Starts the viewer server on `addr` (defaults to `VIEWER_IP:VIEWER_PORT`).
/// A frame is pushed to every client each time `ticks` changes, and a client's stream ends
/// once the sender side of `ticks` is dropped.
/// Returns the address actually bound, useful when binding port 0.
pub async fn serve(
    fleet: SharedFleet,
    addr: Option<SocketAddr>,
    ticks: watch::Receiver<usize>,
) -> Result<SocketAddr, ViewerError> {
    let addr = addr.unwrap_or_else(|| SocketAddrV4::new(VIEWER_IP, VIEWER_PORT).into());
    let listener = TcpListener::bind(&addr).await.map_err(ViewerError::Bind)?;
    let local_addr = listener.local_addr().map_err(ViewerError::Bind)?;
    info!("viewer listening on: {}", local_addr);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            // subscribe before the handshake so the client doesn't miss the next tick
            let mut ticks = ticks.clone();
            ticks.mark_unchanged();
            tokio::spawn(accept_connection(fleet.clone(), ticks, stream));
        }
    });
    Ok(local_addr)
}

async fn accept_connection(
    fleet: SharedFleet,
    mut ticks: watch::Receiver<usize>,
    stream: TcpStream,
) {
    let addr = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("dropping viewer connection without peer address: {}", e);
            return;
        }
    };
    debug!("peer address: {}", addr);

    let mut ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!("websocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    info!("new viewer connection: {}", addr);

    while !ws_stream.is_terminated() {
        if ticks.changed().await.is_err() {
            debug!("no more ticks for viewer {}", addr);
            break;
        }
        let frame = make_frame(&fleet);
        let json_encoded_frame = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                warn!("couldn't serialize `ViewerFrame`: {}", e);
                continue;
            }
        };
        if let Err(e) = ws_stream
            .send(tokio_tungstenite::tungstenite::Message::text(
                json_encoded_frame,
            ))
            .await
        {
            info!("viewer {} disconnected: {}", addr, e);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fleet::Fleet, share};
    use futures_util::StreamExt;
    use std::time::Duration;
    use tokio_tungstenite::{connect_async, tungstenite::Message};

    #[test]
    fn frames_serialize_to_json() {
        let fleet = share(Fleet::standard());
        let frame = make_frame(&fleet);
        let json: serde_json::Value =
            serde_json::to_value(&frame).expect("frame should serialize");
        assert_eq!(json["fleet"]["size"], 10);
        assert_eq!(json["fleet"]["robots"][2]["name"], "FlyingRobot");
        assert_eq!(json["fleet"]["robots"][2]["glyph"], "F");
        assert_eq!(json["fleet"]["robots"][0]["pos"]["x"], 0);
        assert_eq!(json["fleet"]["obstacles"].as_array().map(Vec::len), Some(5));
        assert!(json["grid"]
            .as_str()
            .is_some_and(|g| g.starts_with("=== Grid World")));
    }

    #[tokio::test]
    async fn serve_binds_an_ephemeral_port() {
        let fleet = share(Fleet::standard());
        let addr = serve(
            fleet,
            Some(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0).into()),
            watch::channel(0).1,
        )
        .await
        .expect("binding port 0 should work");
        assert_ne!(addr.port(), 0);
    }

    async fn next_frame<S>(client: &mut S) -> serde_json::Value
    where
        S: futures_util::Stream<Item = tokio_tungstenite::tungstenite::Result<Message>> + Unpin,
    {
        let message = client
            .next()
            .await
            .expect("viewer closed the stream")
            .expect("viewer sent a broken message");
        serde_json::from_str(message.to_text().expect("frames are text"))
            .expect("frames are json")
    }

    #[tokio::test]
    async fn clients_receive_one_frame_per_tick() {
        let fleet = share(Fleet::standard());
        let (ticks, ticks_receiver) = watch::channel(0);
        let addr = serve(
            fleet.clone(),
            Some(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0).into()),
            ticks_receiver,
        )
        .await
        .expect("binding port 0 should work");

        let url = format!("ws://{addr}");
        let (mut client, _) = connect_async(url.as_str())
            .await
            .expect("viewer should accept the client");
        let (gone, _) = connect_async(url.as_str())
            .await
            .expect("viewer should accept the client");
        drop(gone);
        // let the server finish both handshakes and start waiting for ticks
        tokio::time::sleep(Duration::from_millis(50)).await;

        for expected in 1..=2 {
            let number = {
                let mut fleet = fleet.lock().unwrap_ignore_poison();
                fleet.tick();
                fleet.ticks()
            };
            ticks.send_replace(number);

            let frame = next_frame(&mut client).await;
            assert_eq!(frame["fleet"]["ticks"], expected);
            assert_eq!(frame["fleet"]["robots"][0]["pos"]["x"], expected);
            assert!(frame["grid"]
                .as_str()
                .is_some_and(|g| g.starts_with("=== Grid World")));
        }

        drop(ticks);
        let end = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("viewer should close the stream once ticks stop");
        assert!(!matches!(end, Some(Ok(Message::Text(_)))));
    }
}

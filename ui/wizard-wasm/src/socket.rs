//! Message socket plumbing.
//!
//! One websocket per page. Outbound frames go through an unbounded channel to
//! a writer task; a reader task feeds inbound frames to the controller and
//! re-renders after each one.

use futures::channel::mpsc::{self, UnboundedSender};
use futures::{SinkExt, StreamExt};
use gloo_net::websocket::{Message, futures::WebSocket};
use ic_protocol::ClientMessage;
use ic_wizard::{Ignored, Transition};
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

use crate::dom::Elements;
use crate::render;
use crate::state;

thread_local! {
    static OUTBOUND: RefCell<Option<UnboundedSender<String>>> = const { RefCell::new(None) };
}

/// Open the socket and start the reader and writer tasks.
///
/// Frames queued before the socket finishes opening are held by the sink and
/// flushed once it is ready.
pub fn connect(els: &Elements, url: &str) -> Result<(), JsValue> {
    let ws = WebSocket::open(url).map_err(|e| JsValue::from_str(&format!("websocket open {url}: {e}")))?;
    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::unbounded::<String>();
    OUTBOUND.with(|o| *o.borrow_mut() = Some(tx));

    wasm_bindgen_futures::spawn_local(async move {
        while let Some(frame) = rx.next().await {
            if let Err(e) = sink.send(Message::Text(frame)).await {
                gloo_console::error!(format!("socket send failed: {e}"));
                break;
            }
        }
    });

    let els = els.clone();
    wasm_bindgen_futures::spawn_local(async move {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => on_frame(&els, &text),
                Ok(Message::Bytes(bytes)) => {
                    gloo_console::warn!(format!("ignoring {} byte binary frame", bytes.len()));
                }
                Err(e) => {
                    gloo_console::error!(format!("socket error: {e}"));
                    break;
                }
            }
        }

        OUTBOUND.with(|o| o.borrow_mut().take());
        state::with_mut(|w| w.on_channel_closed());
        gloo_console::warn!("socket closed");
        render::render(&els);
    });

    Ok(())
}

/// Queue a frame for the server.
pub fn send(message: &ClientMessage) -> Result<(), String> {
    let frame = message.to_json().map_err(|e| e.to_string())?;
    gloo_console::debug!(format!("-> {frame}"));
    OUTBOUND.with(|o| match o.borrow().as_ref() {
        Some(tx) => tx.unbounded_send(frame).map_err(|e| format!("socket closed: {e}")),
        None => Err("socket is not connected".to_string()),
    })
}

fn on_frame(els: &Elements, text: &str) {
    gloo_console::debug!(format!("<- {text}"));
    let Some(transition) = state::with_mut(|w| w.on_frame(text)) else {
        return;
    };

    match &transition {
        Transition::Ignored(Ignored::UnknownAction(action)) => {
            gloo_console::warn!(format!("ignoring unknown action `{action}`"));
        }
        Transition::Ignored(Ignored::OutOfOrder { action, stage }) => {
            gloo_console::warn!(format!("ignoring `{action}` during stage {stage}"));
        }
        Transition::Ignored(Ignored::Malformed(reason)) => {
            gloo_console::warn!(format!("ignoring malformed frame: {reason}"));
        }
        Transition::Advanced { from, to } => {
            gloo_console::log!(format!("stage {from} -> {to}"));
        }
        Transition::Registered | Transition::Refreshed(_) | Transition::ErrorShown(_) => {}
    }

    render::render(els);
}

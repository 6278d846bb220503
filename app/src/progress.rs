//! Console status lines for model downloads.

use log::{debug, warn};
use tokio::sync::broadcast::{self, error::RecvError};
use translate_bot_model_cache::ModelEvent;

/// One status line for a model lifecycle event
pub fn describe(event: &ModelEvent) -> String {
    let pair = event.pair();
    let route = format!("{} → {}", pair.from_code(), pair.to_code());

    match event {
        ModelEvent::Started { .. } => format!("Downloading {} model...", route),
        ModelEvent::Joined { .. } => format!("Waiting for {} model already downloading", route),
        ModelEvent::Installed { path, .. } => format!("{} model ready at {}", route, path.display()),
        ModelEvent::Failed { error, .. } => format!("{} model failed: {}", route, error),
    }
}

/// Print model events to stderr until the manager goes away.
///
/// Stdout carries the chat replies, so status lines stay out of it.
pub fn spawn_reporter(mut events: broadcast::Receiver<ModelEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => eprintln!("{}", describe(&event)),
                Err(RecvError::Lagged(missed)) => warn!("Missed {} model events", missed),
                Err(RecvError::Closed) => {
                    debug!("Model event stream closed");
                    break;
                }
            }
        }
    });
}

//! The chat bot: command parsing, replies, statistics and the message loop.

mod commands;
mod handler;
mod replies;
mod stats;

pub use commands::{parse_command, Command, CommandError, CommandName};
pub use handler::BotHandler;
pub use stats::{format_uptime, BotStats, StatsSnapshot};

use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::transport::{IncomingMessage, Transport, TransportError};

/// Serve messages from `transport` until it closes or `shutdown` fires.
///
/// Each message is handled in its own task so a slow model download for one
/// chat does not hold up the others. Replies are sent in completion order.
/// When the transport closes, replies still being worked on are delivered
/// before returning.
pub async fn run(
    handler: Arc<BotHandler>,
    transport: &mut dyn Transport,
    shutdown: CancellationToken,
) -> Result<(), TransportError> {
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<(IncomingMessage, String)>();
    let mut reply_tx = Some(reply_tx);

    info!("Bot is running, waiting for messages");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, stopping bot");
                break;
            }
            message = transport.next_message(), if reply_tx.is_some() => {
                match message? {
                    Some(message) => {
                        debug!("Message from {}: {}", message.sender, message.content);
                        if let Some(tx) = &reply_tx {
                            spawn_reply(handler.clone(), message, tx.clone());
                        }
                    }
                    None => {
                        debug!("Transport closed, finishing pending replies");
                        reply_tx = None;
                    }
                }
            }
            reply = reply_rx.recv() => {
                match reply {
                    Some((message, text)) => transport.send_reply(&message, &text).await?,
                    None => break,
                }
            }
        }
    }

    Ok(())
}

fn spawn_reply(
    handler: Arc<BotHandler>,
    message: IncomingMessage,
    replies: mpsc::UnboundedSender<(IncomingMessage, String)>,
) {
    tokio::spawn(async move {
        if let Some(text) = handler.handle(&message.content).await {
            if replies.send((message, text)).is_err() {
                error!("Bot stopped before a reply could be sent");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::{TranslateError, Translator};
    use crate::transport::ConsoleTransport;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::time::Duration;
    use translate_bot_model_cache::{
        BackendError, CacheState, LanguagePair, ModelBackend, ModelCacheManager, ModelCatalog,
        ModelHandle,
    };

    struct InstantBackend;

    #[async_trait]
    impl ModelBackend for InstantBackend {
        async fn fetch_catalog(&self) -> Result<Vec<LanguagePair>, BackendError> {
            Ok(Vec::new())
        }

        async fn download_model(&self, pair: &LanguagePair) -> Result<PathBuf, BackendError> {
            Ok(PathBuf::from(format!("/models/{}", pair)))
        }
    }

    struct EchoTranslator;

    #[async_trait]
    impl Translator for EchoTranslator {
        async fn translate(&self, _model: &ModelHandle, text: &str) -> Result<String, TranslateError> {
            Ok(text.chars().rev().collect())
        }
    }

    fn handler() -> Arc<BotHandler> {
        let manager = ModelCacheManager::new(
            Arc::new(InstantBackend),
            ModelCatalog::new(vec![LanguagePair::new("en", "es")]),
            Arc::new(CacheState::new()),
        );
        Arc::new(BotHandler::new(
            manager,
            Arc::new(EchoTranslator),
            "Translate Bot",
            "",
            Duration::from_secs(5),
        ))
    }

    #[tokio::test]
    async fn test_console_session() {
        let input: &[u8] = b"translate en es hola\n\nnot-a-command-but-unknown\n";
        let mut transport = ConsoleTransport::new(input, Vec::new());

        run(handler(), &mut transport, CancellationToken::new())
            .await
            .unwrap();

        let output = String::from_utf8(transport.into_writer()).unwrap();
        assert!(output.contains("Translation (en → es):\naloh\n\n"), "{output}");
        assert!(output.contains("Unknown command 'not-a-command-but-unknown'"));
    }

    #[tokio::test]
    async fn test_reply_during_partial_line_keeps_the_line() {
        use tokio::io::AsyncWriteExt;

        let (mut input, reader) = tokio::io::duplex(64);
        let mut transport = ConsoleTransport::new(tokio::io::BufReader::new(reader), Vec::new());
        tokio::spawn(async move {
            input.write_all(b"help\nlangu").await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            input.write_all(b"ages\n").await.unwrap();
        });

        run(handler(), &mut transport, CancellationToken::new())
            .await
            .unwrap();

        let output = String::from_utf8(transport.into_writer()).unwrap();
        assert!(output.contains("Help**"), "{output}");
        assert!(output.contains("Available languages:\nen\nes"), "{output}");
        assert!(!output.contains("Unknown command"), "{output}");
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let (reader, _keep_open) = tokio::io::duplex(64);
        let mut transport = ConsoleTransport::new(tokio::io::BufReader::new(reader), Vec::new());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        run(handler(), &mut transport, shutdown).await.unwrap();

        assert!(transport.into_writer().is_empty());
    }
}

use async_trait::async_trait;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
};

use super::{IncomingMessage, Transport, TransportError};

const CONSOLE_SENDER: &str = "console";

/// Line-based transport: every non-empty input line is one message and each
/// reply is written followed by a blank line.
///
/// `next_message` is cancel-safe: a line that is only partly read when the
/// call is dropped is completed by the next call.
pub struct ConsoleTransport<R, W> {
    lines: Lines<R>,
    writer: W,
}

impl ConsoleTransport<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsoleTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: reader.lines(),
            writer,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<R, W> Transport for ConsoleTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn next_message(&mut self) -> Result<Option<IncomingMessage>, TransportError> {
        while let Some(line) = self.lines.next_line().await? {
            let content = line.trim();
            if !content.is_empty() {
                return Ok(Some(IncomingMessage::new(CONSOLE_SENDER, content)));
            }
        }

        Ok(None)
    }

    async fn send_reply(&mut self, _to: &IncomingMessage, text: &str) -> Result<(), TransportError> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

//! Runner output capture
//!
//! Each output stream gets a reader task that forwards decoded chunks to
//! the supervising task over a channel. The supervisor keeps the tail of
//! everything received in an [`OutputBuffer`].

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

const READ_CHUNK_BYTES: usize = 8 * 1024;

#[derive(Debug)]
pub enum OutputEvent {
    Chunk(String),
    Failed {
        stream: &'static str,
        error: std::io::Error,
    },
}

/// Forwards everything read from `reader` until EOF or a read error
///
/// Multi-byte characters split across reads are held back until complete.
pub fn spawn_reader<R>(
    stream: &'static str,
    mut reader: R,
    tx: mpsc::Sender<OutputEvent>,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK_BYTES];
        let mut pending: Vec<u8> = Vec::new();

        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    pending.extend_from_slice(&buf[..n]);
                    let text = decode_complete(&mut pending);
                    if !text.is_empty() && tx.send(OutputEvent::Chunk(text)).await.is_err() {
                        return;
                    }
                }
                Err(error) => {
                    let _ = tx.send(OutputEvent::Failed { stream, error }).await;
                    return;
                }
            }
        }

        if !pending.is_empty() {
            let text = String::from_utf8_lossy(&pending).into_owned();
            let _ = tx.send(OutputEvent::Chunk(text)).await;
        }
    })
}

/// Decodes `pending`, leaving an incomplete trailing character in place
fn decode_complete(pending: &mut Vec<u8>) -> String {
    let mut out = String::with_capacity(pending.len());
    let mut rest: &[u8] = pending;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                rest = &[];
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                out.push_str(&String::from_utf8_lossy(valid));
                match e.error_len() {
                    Some(bad) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[bad..];
                    }
                    None => {
                        rest = after;
                        break;
                    }
                }
            }
        }
    }

    *pending = rest.to_vec();
    out
}

/// Accumulated runner output, capped to the most recent `limit` bytes
///
/// Older text is compacted away only once the buffer holds twice the limit,
/// so a long run does not shift the whole tail on every read.
#[derive(Debug)]
pub struct OutputBuffer {
    text: String,
    limit: usize,
    truncated: bool,
}

impl OutputBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            text: String::new(),
            limit,
            truncated: false,
        }
    }

    pub fn push(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        if self.text.len() <= self.limit {
            return;
        }

        self.truncated = true;
        if self.text.len() > self.limit.saturating_mul(2) {
            let start = self.tail_start();
            self.text.drain(..start);
        }
    }

    /// The retained tail, at most `limit` bytes
    pub fn as_str(&self) -> &str {
        &self.text[self.tail_start()..]
    }

    /// True once older output has been dropped
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn tail_start(&self) -> usize {
        let mut start = self.text.len().saturating_sub(self.limit);
        while !self.text.is_char_boundary(start) {
            start += 1;
        }
        start
    }
}

//! Server-sent-event framing
//!
//! A per-connection state machine that turns arbitrary socket reads into
//! whole `data:` payloads. It knows nothing about HTTP, so provider stream
//! parsers can be exercised against synthetic byte chunks.
//!
//! Consecutive `data:` lines in one event are joined with `\n`. A payload
//! is released as soon as it forms a complete JSON document, otherwise at
//! the blank line that ends the event, at `[DONE]`, or at connection close.

use crate::completion::StreamChunk;
use crate::error::Result;

/// Literal payload that ends OpenAI-style streams
pub const DONE_SENTINEL: &str = "[DONE]";

/// Decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseState {
    /// Buffer empty, waiting for the next line
    AwaitingLine,
    /// Holding an incomplete line or payload from a previous read
    BufferedPartial,
    /// End of stream seen; further input is ignored
    Terminal,
}

/// One complete frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// A `data:` payload, tagged with the most recent `event:` name
    Data {
        /// Event type, if the server sent one
        event: Option<String>,
        /// Payload after `data:`, continuation lines joined with `\n`
        data: String,
    },
    /// The `[DONE]` sentinel
    Done,
}

/// Incremental SSE line decoder
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Option<String>,
    state: SseState,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDecoder {
    /// Create a decoder
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            event: None,
            data: None,
            state: SseState::AwaitingLine,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SseState {
        self.state
    }

    /// Whether the stream has ended
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state == SseState::Terminal
    }

    /// Feed one socket read, returning every frame completed by it
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.process_line(&line[..line.len() - 1], &mut frames);
            if self.is_terminal() {
                self.buffer.clear();
                return frames;
            }
        }

        self.state = if self.buffer.is_empty() && self.data.is_none() {
            SseState::AwaitingLine
        } else {
            SseState::BufferedPartial
        };
        frames
    }

    /// Flush a trailing line or held payload and enter `Terminal`
    pub fn finish(&mut self) -> Vec<SseFrame> {
        if self.is_terminal() {
            return Vec::new();
        }
        let mut frames = Vec::new();
        let rest = std::mem::take(&mut self.buffer);
        if !rest.is_empty() {
            self.process_line(&rest, &mut frames);
        }
        self.flush_data(&mut frames);
        self.state = SseState::Terminal;
        frames
    }

    /// Feed one read and run every completed frame through a parser
    pub fn feed_into<P: StreamParser + ?Sized>(
        &mut self,
        parser: &mut P,
        bytes: &[u8],
    ) -> Result<Vec<StreamChunk>> {
        let frames = self.feed(bytes);
        Self::dispatch(parser, frames)
    }

    /// Flush the decoder and the parser at connection close
    pub fn finish_into<P: StreamParser + ?Sized>(&mut self, parser: &mut P) -> Result<Vec<StreamChunk>> {
        let frames = self.finish();
        let mut chunks = Self::dispatch(parser, frames)?;
        chunks.extend(parser.finish());
        Ok(chunks)
    }

    fn dispatch<P: StreamParser + ?Sized>(
        parser: &mut P,
        frames: Vec<SseFrame>,
    ) -> Result<Vec<StreamChunk>> {
        let mut chunks = Vec::new();
        for frame in frames {
            match frame {
                SseFrame::Done => chunks.extend(parser.finish()),
                SseFrame::Data { event, data } => {
                    if parser.is_terminal() {
                        break;
                    }
                    if let Some(chunk) = parser.parse_frame(event.as_deref(), &data)? {
                        chunks.push(chunk);
                    }
                }
            }
        }
        Ok(chunks)
    }

    fn process_line(&mut self, raw: &[u8], frames: &mut Vec<SseFrame>) {
        if self.is_terminal() {
            return;
        }
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);

        if line.is_empty() {
            // Blank line ends an event block
            self.flush_data(frames);
            self.event = None;
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" if value.trim() == DONE_SENTINEL => {
                self.flush_data(frames);
                self.state = SseState::Terminal;
                frames.push(SseFrame::Done);
            }
            "data" => {
                let data = match self.data.take() {
                    Some(mut held) => {
                        held.push('\n');
                        held.push_str(value);
                        held
                    }
                    None => value.to_string(),
                };
                if is_complete_json(&data) {
                    frames.push(SseFrame::Data {
                        event: self.event.clone(),
                        data,
                    });
                } else {
                    self.data = Some(data);
                }
            }
            _ => {}
        }
    }

    fn flush_data(&mut self, frames: &mut Vec<SseFrame>) {
        if let Some(data) = self.data.take() {
            frames.push(SseFrame::Data {
                event: self.event.clone(),
                data,
            });
        }
    }
}

fn is_complete_json(data: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(data).is_ok()
}

/// Provider-specific interpretation of SSE frames
///
/// Implementations hold whatever per-connection state the provider needs
/// (response id, partially streamed tool-call arguments) and return at most
/// one chunk per frame. Frames that carry no text and no finish signal yield
/// nothing.
pub trait StreamParser: Send {
    /// Interpret one frame
    fn parse_frame(&mut self, event: Option<&str>, data: &str) -> Result<Option<StreamChunk>>;

    /// Whether the provider signalled end-of-stream in-band
    fn is_terminal(&self) -> bool {
        false
    }

    /// Emit anything still pending when the stream ends
    fn finish(&mut self) -> Option<StreamChunk> {
        None
    }
}

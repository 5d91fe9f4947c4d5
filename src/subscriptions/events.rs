//! Stand-in event source reading JSON lines from stdin
//!
//! Each line is either a source event (`{"source":"volume","level":72}`) or a
//! pointer event (`{"pointer":"move","x":960,"y":20}`). Blank lines and lines
//! starting with `#` are skipped, as are lines longer than `MAX_LINE_LENGTH`.

use crate::constants::MAX_LINE_LENGTH;
use crate::handlers::messages::Message;
use cosmic_notch_util::{BatteryInfo, BatteryTracker, Point, SourceEvent};
use serde::Deserialize;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "pointer", rename_all = "kebab-case")]
pub enum PointerInput {
    Enter,
    Move { x: f32, y: f32 },
    Leave,
    /// Click on the secondary container of the split layout
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Input {
    Pointer(PointerInput),
    Source(SourceEvent),
}

/// Parse one input line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<Input>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Derive charge-start from the charging flag instead of trusting the source
pub fn normalize(tracker: &mut BatteryTracker, event: SourceEvent) -> SourceEvent {
    match event {
        SourceEvent::Battery(info) => tracker
            .observe(info.percentage, info.is_charging, info.is_present)
            .unwrap_or(SourceEvent::Battery(BatteryInfo {
                charge_started: false,
                ..info
            })),
        other => other,
    }
}

impl From<PointerInput> for Message {
    fn from(input: PointerInput) -> Self {
        match input {
            PointerInput::Enter => Message::PointerEntered,
            PointerInput::Move { x, y } => Message::PointerMoved(Point::new(x, y)),
            PointerInput::Leave => Message::PointerLeft,
            PointerInput::Secondary => Message::SecondaryActivated,
        }
    }
}

pub fn spawn(output: Sender<Message>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let machine = Machine::<Start>::new(output).exec();
        machine.exec().await;
    })
}

struct Start;
struct Reading;

struct Machine<S> {
    output: Sender<Message>,
    battery: BatteryTracker,
    marker: core::marker::PhantomData<S>,
}

impl<S> Machine<S> {
    fn transition<Next>(self) -> Machine<Next> {
        Machine::<Next> {
            output: self.output,
            battery: self.battery,
            marker: core::marker::PhantomData,
        }
    }
}

impl Machine<Start> {
    fn new(output: Sender<Message>) -> Self {
        Self {
            output,
            battery: BatteryTracker::new(),
            marker: core::marker::PhantomData,
        }
    }

    fn exec(self) -> Machine<Reading> {
        info!("reading source events from stdin");
        self.transition()
    }
}

impl Machine<Reading> {
    async fn exec(mut self) {
        let mut reader = BufReader::new(tokio::io::stdin());
        loop {
            match read_line(&mut reader).await {
                Ok(Line::Text(line)) => {
                    if !self.forward(&line).await {
                        return;
                    }
                }
                Ok(Line::TooLong(len)) => warn!(len, "event line too long, skipped"),
                Ok(Line::Eof) => {
                    info!("event input closed");
                    break;
                }
                Err(err) => {
                    error!("Failed to read event input {}", err);
                    break;
                }
            }
        }
        _ = self.output.send(Message::Shutdown).await;
    }

    /// Returns `false` once nobody is listening anymore
    async fn forward(&mut self, line: &str) -> bool {
        let message = match parse_line(line) {
            Ok(Some(Input::Source(event))) => Message::Source(normalize(&mut self.battery, event)),
            Ok(Some(Input::Pointer(pointer))) => pointer.into(),
            Ok(None) => return true,
            Err(err) => {
                warn!("invalid event line: {}", err);
                return true;
            }
        };

        self.output.send(message).await.is_ok()
    }
}

#[derive(Debug, PartialEq)]
enum Line {
    Text(String),
    /// Bytes discarded from an oversized line
    TooLong(usize),
    Eof,
}

/// Read one line, buffering at most `MAX_LINE_LENGTH` bytes of it
async fn read_line<R>(reader: &mut R) -> io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_LENGTH as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(Line::Eof);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() > MAX_LINE_LENGTH {
        // Drain the rest of the line without keeping it
        let mut discarded = buf.len();
        loop {
            let chunk = reader.fill_buf().await?;
            if chunk.is_empty() {
                break;
            }
            match chunk.iter().position(|byte| *byte == b'\n') {
                Some(pos) => {
                    discarded += pos;
                    reader.consume(pos + 1);
                    break;
                }
                None => {
                    let len = chunk.len();
                    discarded += len;
                    reader.consume(len);
                }
            }
        }
        return Ok(Line::TooLong(discarded));
    }

    Ok(Line::Text(String::from_utf8_lossy(&buf).into_owned()))
}

//! Fix feed bridged from stdin.
//!
//! The host platform (or an operator) pipes one JSON object per line:
//! `{"latitude": .., "longitude": .., "timestamp_ms": ..}` for a fix,
//! `{"available": bool}` for an availability notice, or `null` for a fix
//! callback that carried no location. The feed's cadence is owned by the
//! writer; the subscription's interval parameters are logged for reference.
//!
//! Replacing a subscription costs one feed line: the outgoing reader still
//! owns stdin until it consumes the next line and fails its send, so that
//! line is dropped and the new reader takes over on the line after it.

use std::io::BufRead;

use guardiantrack_core::sources::location::{Fix, FixEvent, FixRequest, FixSource, SubscribeError};
use serde::Deserialize;
use tokio::sync::mpsc;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FixLine {
    Availability { available: bool },
    Fix {
        latitude: f64,
        longitude: f64,
        timestamp_ms: i64,
    },
}

/// Parse one feed line. `None` means the line is malformed.
fn parse_fix_line(line: &str) -> Option<FixEvent> {
    if line == "null" {
        return Some(FixEvent::Fix(None));
    }
    match serde_json::from_str::<FixLine>(line) {
        Ok(FixLine::Availability { available }) => Some(FixEvent::Availability(available)),
        Ok(FixLine::Fix {
            latitude,
            longitude,
            timestamp_ms,
        }) => Some(FixEvent::Fix(Some(Fix {
            latitude,
            longitude,
            timestamp_ms,
        }))),
        Err(_) => None,
    }
}

/// Recurring fix source reading the process's stdin.
#[derive(Debug, Default)]
pub struct StdinFixSource;

impl FixSource for StdinFixSource {
    fn subscribe(&self, request: FixRequest) -> Result<mpsc::Receiver<FixEvent>, SubscribeError> {
        tracing::debug!(
            interval_ms = request.interval_ms,
            fastest_interval_ms = request.fastest_interval_ms,
            high_accuracy = request.high_accuracy,
            "subscribing to stdin fix feed"
        );
        let (tx, rx) = mpsc::channel(64);
        std::thread::Builder::new()
            .name("fix-feed".to_string())
            .spawn(move || read_loop(&tx))
            .map_err(|error| SubscribeError::Subscription(error.to_string()))?;
        Ok(rx)
    }
}

/// Forward feed lines until stdin closes or the receiver is gone.
///
/// A replaced subscription's reader exits on its next send, once the old
/// receiver has been dropped. The line that triggered that failed send is
/// lost; the replacement reader blocks on the stdin lock until then.
fn read_loop(tx: &mpsc::Sender<FixEvent>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                tracing::warn!("fix feed read error: {error}");
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(event) = parse_fix_line(trimmed) else {
            tracing::warn!(line = trimmed, "ignoring malformed fix feed line");
            continue;
        };
        if tx.blocking_send(event).is_err() {
            break;
        }
    }
    tracing::debug!("fix feed ended");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn null_line_is_an_empty_fix() {
        assert_eq!(parse_fix_line("null"), Some(FixEvent::Fix(None)));
    }

    #[test]
    fn availability_line_parses() {
        assert_eq!(
            parse_fix_line(r#"{"available": false}"#),
            Some(FixEvent::Availability(false))
        );
    }

    #[test]
    fn fix_line_parses() {
        let event =
            parse_fix_line(r#"{"latitude": 1.23456, "longitude": -9.8765, "timestamp_ms": 1000}"#)
                .unwrap();
        assert_eq!(
            event,
            FixEvent::Fix(Some(Fix {
                latitude: 1.23456,
                longitude: -9.8765,
                timestamp_ms: 1000,
            }))
        );
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert_eq!(parse_fix_line("not json"), None);
        assert_eq!(parse_fix_line(r#"{"latitude": 1.0}"#), None);
    }
}

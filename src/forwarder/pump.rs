use super::signal::CancelToken;
use crate::{log_debug, log_debug_content};
use crossbeam_channel::Sender;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use std::thread;

pub(super) fn should_retry_read_error(err: &io::Error) -> bool {
    err.kind() == ErrorKind::Interrupted
}

/// Strip the line terminator (`\n` or `\r\n`) and decode lossily.
pub(super) fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && raw[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Read `source` line by line and forward each line in arrival order.
/// Ends on EOF, on a read error, on cancellation, or when the receiver goes away.
pub(super) fn spawn_line_pump<R>(
    source: R,
    tx: Sender<String>,
    cancel: CancelToken,
) -> io::Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("forwarder-stdout".into())
        .spawn(move || {
            let mut reader = BufReader::new(source);
            let mut raw = Vec::with_capacity(256);
            loop {
                raw.clear();
                match reader.read_until(b'\n', &mut raw) {
                    Ok(0) => break,
                    Ok(_) => {
                        if cancel.is_cancelled() {
                            log_debug("forwarder: stdout pump cancelled");
                            break;
                        }
                        if tx.send(decode_line(&raw)).is_err() {
                            break;
                        }
                    }
                    Err(err) if should_retry_read_error(&err) => continue,
                    Err(err) => {
                        log_debug(&format!("forwarder: stdout read error: {err}"));
                        break;
                    }
                }
            }
        })
}

/// Keep stderr drained so the forwarder never blocks on a full pipe; lines go to the log only.
pub(super) fn spawn_stderr_drain<R>(source: R) -> io::Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("forwarder-stderr".into())
        .spawn(move || {
            let mut reader = BufReader::new(source);
            let mut raw = Vec::with_capacity(256);
            loop {
                raw.clear();
                match reader.read_until(b'\n', &mut raw) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = decode_line(&raw);
                        tracing::debug!(stream = "stderr", "forwarder output");
                        log_debug_content(&format!("forwarder stderr: {line}"));
                    }
                    Err(err) if should_retry_read_error(&err) => continue,
                    Err(err) => {
                        log_debug(&format!("forwarder: stderr read error: {err}"));
                        break;
                    }
                }
            }
        })
}

use super::{Button, ButtonState, InputSource};
use crate::log_debug;
use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use std::io::{self, BufRead, BufReader, Read};
use std::thread;

/// Keyboard stand-in for the bonnet: each line naming `a`, `b` and/or `c`
/// reads as those buttons pressed for exactly one poll.
pub struct StdinButtons {
    presses: Receiver<ButtonState>,
    _reader: thread::JoinHandle<()>,
}

impl StdinButtons {
    pub fn spawn() -> Self {
        Self::from_reader(io::stdin())
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = unbounded();
        let handle = thread::spawn(move || {
            let mut lines = BufReader::new(reader);
            let mut line = String::new();
            loop {
                line.clear();
                match lines.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        let state = parse_button_line(&line);
                        if state.any() && tx.send(state).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        log_debug(&format!("stdin button reader stopped: {err}"));
                        break;
                    }
                }
            }
        });
        Self {
            presses: rx,
            _reader: handle,
        }
    }
}

impl InputSource for StdinButtons {
    fn read(&mut self) -> Result<ButtonState> {
        let mut state = ButtonState::RELEASED;
        loop {
            match self.presses.try_recv() {
                Ok(press) => state = state.merge(press),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(state)
    }
}

/// Buttons named on one input line; anything other than a/b/c is ignored.
pub fn parse_button_line(line: &str) -> ButtonState {
    let mut state = ButtonState::RELEASED;
    for ch in line.chars() {
        let button = match ch.to_ascii_lowercase() {
            'a' => Button::A,
            'b' => Button::B,
            'c' => Button::C,
            _ => continue,
        };
        state.set(button, true);
    }
    state
}

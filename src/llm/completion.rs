/// Accumulates generated token bytes into text and watches for stop sequences.
///
/// Tokens are fed as raw bytes because a multi-byte UTF-8 character can be
/// split across two tokens. Text is cut at the earliest stop sequence, so the
/// result never contains one.
#[derive(Debug)]
pub struct Completion<'a> {
    stop: &'a [String],
    text: String,
    pending: Vec<u8>,
    stopped: bool,
}

impl<'a> Completion<'a> {
    pub fn new(stop: &'a [String]) -> Self {
        Self {
            stop,
            text: String::new(),
            pending: Vec::new(),
            stopped: false,
        }
    }

    /// Feeds the bytes of one token. Returns `true` once a stop sequence has
    /// been seen; further input is ignored.
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        if self.stopped {
            return true;
        }
        self.pending.extend_from_slice(bytes);
        self.decode_pending(false);
        self.check_stop()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Final text, with whitespace trimmed from both ends.
    pub fn finish(mut self) -> String {
        if !self.stopped {
            self.decode_pending(true);
            self.check_stop();
        }
        self.text.trim().to_string()
    }

    fn decode_pending(&mut self, flush: bool) {
        while !self.pending.is_empty() {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    self.text.push_str(s);
                    self.pending.clear();
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Incomplete trailing sequence: wait for the next token.
                        None if !flush => {
                            self.pending.drain(..valid);
                            return;
                        }
                        None => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.clear();
                        }
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }

    fn check_stop(&mut self) -> bool {
        let earliest = self
            .stop
            .iter()
            .filter(|s| !s.is_empty())
            .filter_map(|s| self.text.find(s.as_str()))
            .min();

        if let Some(at) = earliest {
            self.text.truncate(at);
            self.pending.clear();
            self.stopped = true;
        }
        self.stopped
    }
}

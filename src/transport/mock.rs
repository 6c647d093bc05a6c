use super::Transport;
use crate::error::SiglentError;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Raw(Vec<u8>),
    Fail(String),
}

/// Scripted transport for exercising instrument code without hardware.
///
/// Every command (writes and queries alike) is recorded in order. Queries
/// consume the next scripted reply; running out of replies is an error.
///
/// # Examples
///
/// ```
/// use siglent_sa::{MockTransport, SpectrumAnalyzer};
///
/// let mock = MockTransport::new().with_reply("1.5e9");
/// let mut analyzer = SpectrumAnalyzer::new(mock);
///
/// analyzer.set_span(1e6)?;
/// assert_eq!(analyzer.get_center_frequency()?, 1.5e9);
///
/// let mock = analyzer.into_transport();
/// assert_eq!(mock.sent(), [":FREQ:SPAN 1000000 Hz", ":FREQ:CENT?"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Vec<String>,
    replies: VecDeque<Reply>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text reply
    pub fn with_reply(mut self, reply: &str) -> Self {
        self.push_reply(reply);
        self
    }

    /// Queue a binary reply
    pub fn with_raw_reply(mut self, reply: Vec<u8>) -> Self {
        self.push_raw_reply(reply);
        self
    }

    /// Queue a transport failure for the next query
    pub fn with_failure(mut self, message: &str) -> Self {
        self.replies.push_back(Reply::Fail(message.to_string()));
        self
    }

    pub fn push_reply(&mut self, reply: &str) {
        self.replies.push_back(Reply::Text(reply.to_string()));
    }

    pub fn push_raw_reply(&mut self, reply: Vec<u8>) {
        self.replies.push_back(Reply::Raw(reply));
    }

    /// Everything sent so far, oldest first
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Most recent command
    pub fn last_sent(&self) -> Option<&str> {
        self.sent.last().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }

    /// Scripted replies not yet consumed
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    fn next_reply(&mut self, command: &str) -> Result<Reply, SiglentError> {
        self.sent.push(command.to_string());
        self.replies.pop_front().ok_or_else(|| {
            SiglentError::Transport(format!("No scripted reply for {command:?}"))
        })
    }
}

impl Transport for MockTransport {
    fn write(&mut self, command: &str) -> Result<(), SiglentError> {
        self.sent.push(command.to_string());
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String, SiglentError> {
        match self.next_reply(command)? {
            Reply::Text(text) => Ok(text),
            Reply::Raw(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Reply::Fail(message) => Err(SiglentError::Transport(message)),
        }
    }

    fn query_raw(&mut self, command: &str, _len: usize) -> Result<Vec<u8>, SiglentError> {
        match self.next_reply(command)? {
            Reply::Text(text) => Ok(text.into_bytes()),
            Reply::Raw(bytes) => Ok(bytes),
            Reply::Fail(message) => Err(SiglentError::Transport(message)),
        }
    }
}

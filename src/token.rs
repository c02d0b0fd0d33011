//! Cancellation tokens with optional deadlines.
//!
//! A [Token] is done once its [Canceller] is cancelled or dropped, or once its
//! deadline passes. Child tokens created with [Token::with_timeout] share their
//! parent's cancellation, and expire at the earlier of the parent's deadline and
//! their own timeout, so a step can time out on its own without cancelling
//! anything above it.

use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Why a [Token] is done.
pub enum TokenError {
    #[error("token was cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug)]
/// Cancels every [Token] derived from the pair it was created with.
///
/// Dropping the canceller cancels its tokens as well.
pub struct Canceller {
    // Never sends, receivers observe cancellation as disconnection.
    sender: Option<Sender<()>>,
}

impl Canceller {
    pub fn cancel(&mut self) {
        self.sender.take();
    }
}

#[derive(Debug, Clone)]
/// Cancellable token with an optional deadline, handed down to lookups.
pub struct Token {
    cancelled: Receiver<()>,
    deadline: Option<Instant>,
}

impl Token {
    /// Create a root token without a deadline, and the [Canceller] that ends it.
    pub fn new() -> (Canceller, Token) {
        let (sender, cancelled) = flume::bounded(0);

        (
            Canceller {
                sender: Some(sender),
            },
            Token {
                cancelled,
                deadline: None,
            },
        )
    }

    /// Derive a child token that expires after `timeout`, or earlier if this token does.
    pub fn with_timeout(&self, timeout: Duration) -> Token {
        let deadline = Instant::now() + timeout;

        Token {
            cancelled: self.cancelled.clone(),
            deadline: Some(match self.deadline {
                Some(parent) => parent.min(deadline),
                None => deadline,
            }),
        }
    }

    // === Getters ===

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, `None` if there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_disconnected()
    }

    /// Returns why this token is done, or `None` if it is still live.
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn error(&self) -> Option<TokenError> {
        if self.is_cancelled() {
            return Some(TokenError::Cancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(TokenError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.error().is_some()
    }

    // === Public Methods ===

    /// Block until this token is done.
    pub fn wait(&self) -> TokenError {
        loop {
            let result = match self.deadline {
                Some(deadline) => self.cancelled.recv_deadline(deadline),
                None => self
                    .cancelled
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match result {
                Err(RecvTimeoutError::Disconnected) => return TokenError::Cancelled,
                Err(RecvTimeoutError::Timeout) => return TokenError::DeadlineExceeded,
                Ok(()) => continue,
            }
        }
    }

    /// Sleep for `duration`, returning early with an error if this token is done first.
    pub fn sleep(&self, duration: Duration) -> Result<(), TokenError> {
        let until = Instant::now() + duration;

        if matches!(self.deadline, Some(deadline) if deadline <= until) {
            return Err(self.wait());
        }

        loop {
            match self.cancelled.recv_deadline(until) {
                Err(RecvTimeoutError::Disconnected) => return Err(TokenError::Cancelled),
                Err(RecvTimeoutError::Timeout) => return Ok(()),
                Ok(()) => continue,
            }
        }
    }

    pub(crate) fn cancelled(&self) -> &Receiver<()> {
        &self.cancelled
    }
}

use chrono::Local;

use crate::catalog::Snippet;
use crate::clock::{Clock, Millis, SystemClock};
use crate::input::SessionInput;
use crate::metrics::{compute_accuracy, compute_wpm};
use crate::projector::{project, CharState};
use crate::results::{SessionResult, SnippetMeta};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    NotStarted,
    Active,
    Complete,
}

/// One attempt at typing a reference text.
///
/// All mutation goes through `start`, `apply_*`, `tick` and `reset`; anything those
/// reject leaves the session untouched. The clock only starts on the first accepted
/// keystroke so idle time before typing is never counted.
#[derive(Debug)]
pub struct Session<C: Clock = SystemClock> {
    reference: Vec<char>,
    typed: Vec<Option<char>>,
    cursor_pos: usize,
    started_at: Option<Millis>,
    elapsed_secs: u64,
    error_count: usize,
    accuracy: u32,
    wpm: u32,
    status: SessionStatus,
    snippet: SnippetMeta,
    result: Option<SessionResult>,
    clock: C,
}

impl Session<SystemClock> {
    pub fn new(reference: &str, snippet: SnippetMeta) -> Self {
        Self::with_clock(reference, snippet, SystemClock::new())
    }

    pub fn from_snippet(snippet: &Snippet) -> Self {
        Self::new(&snippet.code, SnippetMeta::from(snippet))
    }
}

impl<C: Clock> Session<C> {
    pub fn with_clock(reference: &str, snippet: SnippetMeta, clock: C) -> Self {
        let reference: Vec<char> = reference.chars().collect();
        let typed = vec![None; reference.len()];

        Self {
            reference,
            typed,
            cursor_pos: 0,
            started_at: None,
            elapsed_secs: 0,
            error_count: 0,
            accuracy: 100,
            wpm: 0,
            status: SessionStatus::NotStarted,
            snippet,
            result: None,
            clock,
        }
    }

    pub fn reference(&self) -> &[char] {
        &self.reference
    }

    pub fn reference_text(&self) -> String {
        self.reference.iter().collect()
    }

    pub fn typed(&self) -> &[Option<char>] {
        &self.typed
    }

    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    pub fn cursor_pos(&self) -> usize {
        self.cursor_pos
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<Millis> {
        self.started_at
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn snippet(&self) -> &SnippetMeta {
        &self.snippet
    }

    /// The record emitted on completion, kept until reset
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn expected_char(&self, idx: usize) -> Option<char> {
        self.reference.get(idx).copied()
    }

    /// Number of judged positions whose typed character matches the reference
    pub fn correct_count(&self) -> usize {
        self.reference[..self.cursor_pos]
            .iter()
            .zip(&self.typed)
            .filter(|(expected, typed)| **typed == Some(**expected))
            .count()
    }

    /// Per-position display classification of the current state
    pub fn projection(&self) -> Vec<CharState> {
        project(&self.reference, &self.typed, self.cursor_pos)
    }

    /// `NotStarted -> Active`. Returns false when the session was not waiting to start
    /// or has nothing to type.
    pub fn start(&mut self) -> bool {
        if self.status != SessionStatus::NotStarted || self.reference.is_empty() {
            return false;
        }
        self.status = SessionStatus::Active;
        tracing::debug!(snippet = %self.snippet.snippet_id, len = self.len(), "session started");
        true
    }

    pub fn apply(&mut self, input: SessionInput) -> Option<SessionResult> {
        match input {
            SessionInput::Char(c) => self.apply_character(c),
            SessionInput::Newline => self.apply_newline(),
            SessionInput::Backspace => {
                self.apply_backspace();
                None
            }
        }
    }

    /// Judge a printable character at the cursor. Returns the result if this completed
    /// the session.
    pub fn apply_character(&mut self, c: char) -> Option<SessionResult> {
        if c.is_control() {
            return None;
        }
        self.accept(c)
    }

    /// Enter always consumes one position; it is only correct where the reference has
    /// a line break.
    pub fn apply_newline(&mut self) -> Option<SessionResult> {
        self.accept('\n')
    }

    fn accept(&mut self, c: char) -> Option<SessionResult> {
        if self.status != SessionStatus::Active || self.cursor_pos >= self.reference.len() {
            return None;
        }

        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
        }

        let idx = self.cursor_pos;
        self.typed[idx] = Some(c);
        if c != self.reference[idx] {
            self.error_count += 1;
        }
        self.cursor_pos += 1;
        self.accuracy = compute_accuracy(self.correct_count(), self.cursor_pos);

        if self.cursor_pos == self.reference.len() {
            return Some(self.complete());
        }
        None
    }

    /// Step back one position, forgetting what was typed there. Returns false when
    /// rejected.
    pub fn apply_backspace(&mut self) -> bool {
        if self.status != SessionStatus::Active || self.cursor_pos == 0 {
            return false;
        }

        self.cursor_pos -= 1;
        let idx = self.cursor_pos;
        if self.typed[idx] != Some(self.reference[idx]) {
            self.error_count = self.error_count.saturating_sub(1);
        }
        self.typed[idx] = None;
        self.accuracy = compute_accuracy(self.correct_count(), self.cursor_pos);
        true
    }

    /// Recompute elapsed time and wpm. Never touches correctness state.
    pub fn tick(&mut self, now: Millis) {
        if self.status != SessionStatus::Active {
            return;
        }
        if let Some(started_at) = self.started_at {
            self.elapsed_secs = now.saturating_sub(started_at) / 1000;
            self.wpm = compute_wpm(self.cursor_pos, self.elapsed_secs);
        }
    }

    pub fn on_tick(&mut self) {
        let now = self.clock.now();
        self.tick(now);
    }

    /// Back to `NotStarted` over the same reference text
    pub fn reset(&mut self) {
        self.typed.iter_mut().for_each(|slot| *slot = None);
        self.cursor_pos = 0;
        self.started_at = None;
        self.elapsed_secs = 0;
        self.error_count = 0;
        self.accuracy = 100;
        self.wpm = 0;
        self.status = SessionStatus::NotStarted;
        self.result = None;
        tracing::debug!(snippet = %self.snippet.snippet_id, "session reset");
    }

    fn complete(&mut self) -> SessionResult {
        let now = self.clock.now();
        let started_at = self.started_at.unwrap_or(now);

        self.elapsed_secs = now.saturating_sub(started_at) / 1000;
        self.wpm = compute_wpm(self.reference.len(), self.elapsed_secs);
        self.status = SessionStatus::Complete;

        let result = SessionResult {
            wpm: self.wpm,
            accuracy: self.accuracy,
            elapsed_secs: self.elapsed_secs,
            error_count: self.error_count,
            snippet: self.snippet.clone(),
            completed_at: Local::now(),
        };
        tracing::debug!(
            wpm = result.wpm,
            accuracy = result.accuracy,
            errors = result.error_count,
            secs = result.elapsed_secs,
            "session complete"
        );

        self.result = Some(result.clone());
        result
    }
}

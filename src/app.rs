use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Terminal};
use std::io;

use crate::catalog::{expand_tabs, Catalog, Snippet, SnippetFilter};
use crate::input::classify_key;
use crate::results::{ResultSink, SessionResult, SnippetMeta};
use crate::runtime::{AppEvent, EventSource, Runner};
use crate::session::{Session, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Where the reference text comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Catalog(Snippet),
    Custom(String),
}

impl Source {
    pub fn text(&self) -> &str {
        match self {
            Source::Catalog(snippet) => &snippet.code,
            Source::Custom(text) => text,
        }
    }

    pub fn meta(&self) -> SnippetMeta {
        match self {
            Source::Catalog(snippet) => SnippetMeta::from(snippet),
            Source::Custom(_) => SnippetMeta::custom(),
        }
    }

    pub fn snippet(&self) -> Option<&Snippet> {
        match self {
            Source::Catalog(snippet) => Some(snippet),
            Source::Custom(_) => None,
        }
    }
}

pub struct App {
    pub catalog: Catalog,
    pub filter: SnippetFilter,
    pub source: Source,
    pub session: Session,
    pub state: AppState,
    pub last_result: Option<SessionResult>,
    sink: Box<dyn ResultSink>,
}

impl App {
    pub fn new(
        catalog: Catalog,
        filter: SnippetFilter,
        custom_prompt: Option<String>,
        sink: Box<dyn ResultSink>,
    ) -> Self {
        let source = match custom_prompt {
            Some(text) => Source::Custom(expand_tabs(&text)),
            None => Source::Catalog(catalog.select(&filter, &mut rand::thread_rng()).clone()),
        };
        tracing::info!(snippet = %source.meta().snippet_id, "snippet selected");
        let session = Session::new(source.text(), source.meta());

        Self {
            catalog,
            filter,
            source,
            session,
            state: AppState::Typing,
            last_result: None,
            sink,
        }
    }

    /// Start over on the same reference text
    pub fn retry(&mut self) {
        self.session.reset();
        self.state = AppState::Typing;
        self.last_result = None;
    }

    /// Replace the reference text with another snippet matching the current filter.
    /// The old session is discarded, never carried over.
    pub fn next_snippet(&mut self) {
        if let Source::Catalog(_) = self.source {
            let snippet = self
                .catalog
                .random(&self.filter, &mut rand::thread_rng())
                .clone();
            tracing::info!(snippet = %snippet.id, "snippet selected");
            self.source = Source::Catalog(snippet);
        }
        self.session = Session::new(self.source.text(), self.source.meta());
        self.state = AppState::Typing;
        self.last_result = None;
    }

    /// The live-stats timer should exist exactly while typing is in progress
    pub fn timer_should_run(&self) -> bool {
        self.session.status() == SessionStatus::Active
    }

    pub fn on_tick(&mut self) {
        self.session.on_tick();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if key.kind == KeyEventKind::Release {
            return AppAction::Continue;
        }

        match key.code {
            KeyCode::Esc => return AppAction::Quit,
            KeyCode::Char('c')
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                return AppAction::Quit
            }
            KeyCode::Left => {
                self.retry();
                return AppAction::Continue;
            }
            KeyCode::Right => {
                self.next_snippet();
                return AppAction::Continue;
            }
            _ => {}
        }

        match self.state {
            AppState::Typing => self.handle_typing_key(key),
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.retry(),
                KeyCode::Char('n') => self.next_snippet(),
                _ => {}
            },
        }
        AppAction::Continue
    }

    fn handle_typing_key(&mut self, key: KeyEvent) {
        match self.session.status() {
            SessionStatus::NotStarted => {
                if key.code == KeyCode::Enter {
                    self.session.start();
                }
            }
            SessionStatus::Active => {
                let Some(input) = classify_key(&key) else {
                    return;
                };
                if let Some(result) = self.session.apply(input) {
                    self.finish(result);
                }
            }
            SessionStatus::Complete => {}
        }
    }

    fn finish(&mut self, result: SessionResult) {
        if let Err(err) = self.sink.record(&result) {
            tracing::warn!(%err, "failed to save result");
        }
        self.last_result = Some(result);
        self.state = AppState::Results;
    }
}

/// Draw and dispatch events until the user quits or input goes away. The tick timer
/// is re-synchronised with the session after every event.
pub fn run<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut Runner<E>,
) -> io::Result<()> {
    loop {
        runner.sync_timer(app.timer_should_run());
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let Some(event) = runner.step() else {
            break;
        };
        match event {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.handle_key(key) == AppAction::Quit {
                    break;
                }
            }
        }
    }

    runner.sync_timer(false);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::MemorySink;

    struct SharedSink(std::rc::Rc<std::cell::RefCell<MemorySink>>);

    impl ResultSink for SharedSink {
        fn record(&mut self, result: &SessionResult) -> crate::error::Result<()> {
            self.0.borrow_mut().record(result)
        }
    }

    struct FailingSink;

    impl ResultSink for FailingSink {
        fn record(&mut self, _result: &SessionResult) -> crate::error::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn custom_app(prompt: &str) -> (App, std::rc::Rc<std::cell::RefCell<MemorySink>>) {
        let sink = std::rc::Rc::new(std::cell::RefCell::new(MemorySink::default()));
        let app = App::new(
            Catalog::bundled().unwrap(),
            SnippetFilter::default(),
            Some(prompt.to_string()),
            Box::new(SharedSink(sink.clone())),
        );
        (app, sink)
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            let code = if c == '\n' {
                KeyCode::Enter
            } else {
                KeyCode::Char(c)
            };
            app.handle_key(key(code));
        }
    }

    #[test]
    fn test_typing_waits_for_enter() {
        let (mut app, _) = custom_app("hi");
        type_str(&mut app, "h");
        assert_eq!(app.session.status(), SessionStatus::NotStarted);
        assert_eq!(app.session.cursor_pos(), 0);
        assert!(!app.timer_should_run());

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.session.status(), SessionStatus::Active);
        assert_eq!(app.session.cursor_pos(), 0);
        assert!(app.timer_should_run());
    }

    #[test]
    fn test_complete_session_records_result() {
        let (mut app, sink) = custom_app("a\nb");
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "a\nb");

        assert_eq!(app.state, AppState::Results);
        assert!(!app.timer_should_run());
        let result = app.last_result.clone().unwrap();
        assert_eq!(result.accuracy, 100);
        assert_eq!(result.snippet, SnippetMeta::custom());
        assert_eq!(sink.borrow().results, vec![result]);
    }

    #[test]
    fn test_failing_sink_still_shows_results() {
        let mut app = App::new(
            Catalog::bundled().unwrap(),
            SnippetFilter::default(),
            Some("x".into()),
            Box::new(FailingSink),
        );
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "x");
        assert_eq!(app.state, AppState::Results);
        assert!(app.last_result.is_some());
    }

    #[test]
    fn test_results_keys() {
        let (mut app, _) = custom_app("ab");
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "ab");
        assert_eq!(app.state, AppState::Results);

        // typing on the results screen does nothing
        type_str(&mut app, "x");
        assert_eq!(app.session.status(), SessionStatus::Complete);

        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.session.status(), SessionStatus::NotStarted);
        assert_eq!(app.session.reference_text(), "ab");
        assert!(app.last_result.is_none());
    }

    #[test]
    fn test_retry_mid_session() {
        let (mut app, _) = custom_app("abc");
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "ax");
        app.handle_key(key(KeyCode::Left));

        assert_eq!(app.session.cursor_pos(), 0);
        assert_eq!(app.session.error_count(), 0);
        assert!(!app.timer_should_run());
    }

    #[test]
    fn test_next_snippet_respects_filter() {
        let mut app = App::new(
            Catalog::bundled().unwrap(),
            SnippetFilter::new(None, None, Some("Python".into())),
            None,
            Box::new(MemorySink::default()),
        );
        assert_eq!(app.source.snippet().unwrap().language, "Python");

        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "de");
        app.handle_key(key(KeyCode::Right));

        assert_eq!(app.source.snippet().unwrap().language, "Python");
        assert_eq!(app.session.cursor_pos(), 0);
        assert_eq!(app.session.status(), SessionStatus::NotStarted);
        assert_eq!(app.session.reference_text(), app.source.text());
    }

    #[test]
    fn test_exact_selection() {
        let app = App::new(
            Catalog::bundled().unwrap(),
            SnippetFilter::new(
                Some("Dynamic Programming".into()),
                Some("Climbing Stairs".into()),
                Some("Java".into()),
            ),
            None,
            Box::new(MemorySink::default()),
        );
        let snippet = app.source.snippet().unwrap();
        assert_eq!(snippet.topic, "Climbing Stairs");
        assert_eq!(snippet.language, "Java");
    }

    #[test]
    fn test_custom_prompt_tabs_are_typeable() {
        let (mut app, _) = custom_app("\tx");
        assert_eq!(app.session.reference_text(), "    x");

        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "    x");
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.last_result.as_ref().unwrap().accuracy, 100);
    }

    #[test]
    fn test_altgr_brace_is_typed() {
        let (mut app, _) = custom_app("{}");
        app.handle_key(key(KeyCode::Enter));
        let altgr = KeyModifiers::CONTROL | KeyModifiers::ALT;
        app.handle_key(KeyEvent::new(KeyCode::Char('{'), altgr));

        assert_eq!(app.session.cursor_pos(), 1);
        assert_eq!(app.session.error_count(), 0);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _) = custom_app("ab");
        assert_eq!(app.handle_key(key(KeyCode::Esc)), AppAction::Quit);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            AppAction::Quit
        );
        assert_eq!(
            app.handle_key(key(KeyCode::Char('c'))),
            AppAction::Continue
        );
    }
}

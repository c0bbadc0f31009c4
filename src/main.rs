use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use dsatype::{
    app::{self, App},
    app_dirs::AppDirs,
    catalog::{Catalog, SnippetFilter},
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    metrics::format_time,
    results::{CsvResultLog, HistorySummary, MemorySink, ResultSink},
    runtime::{CrosstermEventSource, Runner, TickTimer, TICK_INTERVAL},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    io::{self, stdin},
};

/// typing practice on data structure and algorithm snippets
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Typing practice in the terminal on implementations of classic data structure and algorithm problems, with live wpm and accuracy."
)]
pub struct Cli {
    /// problem category, e.g. "Binary Search"
    #[clap(short = 'c', long)]
    category: Option<String>,

    /// problem within the category, e.g. "Two Sum"
    #[clap(short = 't', long)]
    topic: Option<String>,

    /// implementation language, e.g. Python
    #[clap(short = 'l', long)]
    language: Option<String>,

    /// custom prompt to type instead of a snippet (`\n` starts a new line, `\t` indents)
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// list the bundled snippets and exit
    #[clap(long)]
    list: bool,

    /// print a summary of past results and exit
    #[clap(long)]
    history: bool,

    /// delete all recorded results and exit
    #[clap(long)]
    clear_history: bool,

    /// do not record the result of this run
    #[clap(long)]
    no_save: bool,
}

impl Cli {
    /// Stored preferences, with any flag given on the command line taking precedence
    fn filter(&self, cfg: &Config) -> SnippetFilter {
        SnippetFilter::new(
            self.category.clone().or_else(|| cfg.category.clone()),
            self.topic.clone().or_else(|| cfg.topic.clone()),
            self.language.clone().or_else(|| cfg.language.clone()),
        )
    }

    fn custom_prompt(&self) -> Option<String> {
        self.prompt.as_deref().map(unescape_prompt)
    }
}

fn unescape_prompt(prompt: &str) -> String {
    prompt.replace("\\n", "\n").replace("\\t", "\t")
}

fn print_catalog(catalog: &Catalog) {
    for category in catalog.categories() {
        println!("{category}");
        for topic in catalog.topics(category) {
            let languages = catalog
                .snippets()
                .iter()
                .filter(|s| s.category == category && s.topic == topic)
                .map(|s| s.language.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!("  {topic}: {languages}");
        }
    }
}

fn print_history(log: &CsvResultLog) -> Result<(), Box<dyn Error>> {
    let summary = HistorySummary::from_results(&log.load_all()?);
    if summary.count == 0 {
        println!("no results yet ({})", log.path().display());
        return Ok(());
    }

    println!("sessions:     {}", summary.count);
    println!("average wpm:  {}", summary.average_wpm);
    println!("best wpm:     {}", summary.best_wpm);
    println!("wpm std dev:  {:.1}", summary.wpm_std_dev);
    println!("average acc:  {}%", summary.average_accuracy);
    println!("time typing:  {}", format_time(summary.total_secs));
    for (language, wpm) in &summary.per_language {
        println!("  {language}: {wpm} wpm");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = logging::init(&AppDirs::log_path());

    let catalog = Catalog::bundled()?;

    if cli.list {
        print_catalog(&catalog);
        return Ok(());
    }
    if cli.history {
        return print_history(&CsvResultLog::new());
    }
    if cli.clear_history {
        let log = CsvResultLog::new();
        if log.clear()? {
            println!("cleared results ({})", log.path().display());
        } else {
            println!("no results to clear");
        }
        return Ok(());
    }

    let custom_prompt = cli.custom_prompt();
    if custom_prompt.as_deref().is_some_and(str::is_empty) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, "prompt must not be empty")
            .exit();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let mut cfg = store.load();
    let sink: Box<dyn ResultSink> = if cli.no_save || !cfg.save_results {
        Box::new(MemorySink::default())
    } else {
        Box::new(CsvResultLog::new())
    };
    let mut app = App::new(catalog, cli.filter(&cfg), custom_prompt, sink);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(CrosstermEventSource::new(), TickTimer::new(TICK_INTERVAL));
    let outcome = app::run(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;
    outcome?;

    cfg.remember(&app.filter);
    if let Err(err) = store.save(&cfg) {
        tracing::warn!(%err, "failed to save config");
    }

    Ok(())
}

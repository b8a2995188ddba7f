use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossterm::event::{
    DisableFocusChange, EnableFocusChange, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tracing::{error, info};
#[cfg(feature = "network")]
use tracing::warn;

use bookdr::app::App;
use bookdr::book::Book;
use bookdr::config::Config;
use bookdr::event::{AppEvent, EventHandler};
use bookdr::logging;
#[cfg(feature = "network")]
use bookdr::store::remote::RemoteStore;
use bookdr::store::ProgressStore;
use bookdr::store::json_store::JsonStore;
use bookdr::store::sync::ProgressSync;
use bookdr::ui::components::keyboard_diagram::KeyboardDiagram;
use bookdr::ui::components::progress_bar::ProgressBar;
use bookdr::ui::components::stats_sidebar::{StatsSidebar, compact_stats};
use bookdr::ui::components::typing_area::TypingArea;
use bookdr::ui::layout::{AppLayout, pack_hint_lines};
use bookdr::ui::theme::Theme;

#[derive(Parser)]
#[command(name = "bookdr", version, about = "Touch typing practice through whole books")]
struct Cli {
    #[arg(short, long, global = true, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, global = true, help = "Directory for books and progress")]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Hide the keyboard diagram")]
    no_keyboard: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean and store a plain-text book
    Import {
        file: PathBuf,
        #[arg(short, long)]
        title: Option<String>,
    },
    /// List imported books and their progress
    List {
        #[cfg(feature = "network")]
        #[arg(long, help = "Also list progress held by the sync service")]
        remote: bool,
    },
    /// Practise a stored book, by id or unique id prefix
    Practice { book: String },
    /// Practise the bundled sample book
    Sample,
    /// Remove a book and its progress
    Delete { book: String },
    /// Print the reconciled progress of a book as JSON
    Progress { book: String },
    /// Write the effective configuration to the config file
    InitConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    if cli.no_keyboard {
        config.show_keyboard = false;
    }

    let _log_guard = logging::init(&config.log_dir(), &config.log_level)?;
    let local = JsonStore::with_base_dir(config.data_path())
        .with_context(|| format!("opening data dir {}", config.data_dir))?;

    match cli.command {
        Command::Import { file, title } => {
            let book = Book::import(&file, title.as_deref())?;
            local.save_book(&book.info(), &book.text)?;
            info!(book_id = %book.id, title = %book.title, "book imported");
            println!(
                "Imported \"{}\" ({} chars) as {}",
                book.title,
                book.char_count(),
                book.id
            );
        }
        #[cfg(feature = "network")]
        Command::List { remote } => {
            print_books(&local);
            if remote {
                print_remote(&config)?;
            }
        }
        #[cfg(not(feature = "network"))]
        Command::List {} => print_books(&local),
        Command::Practice { book } => {
            let info = local.find_book(&book)?;
            let text = local.load_book_text(&info.book_id)?;
            let book = Book {
                id: info.book_id,
                title: info.title,
                author: info.author,
                text,
            };
            let sync = build_sync(&config, local);
            run_tui(&config, sync, &book)?;
        }
        Command::Sample => {
            let book = Book::sample()?;
            if local.find_book(&book.id).is_err() {
                local.save_book(&book.info(), &book.text)?;
            }
            let sync = build_sync(&config, local);
            run_tui(&config, sync, &book)?;
        }
        Command::Delete { book } => {
            let info = local.find_book(&book)?;
            local.delete_book(&info.book_id)?;
            info!(book_id = %info.book_id, "book deleted");
            println!("Deleted \"{}\"", info.title);
        }
        Command::Progress { book } => {
            let info = local.find_book(&book)?;
            let sync = build_sync(&config, local);
            if sync.has_remote() {
                eprintln!("Checking the sync service for newer progress...");
            }
            match sync.load(&info.book_id, info.total_chars) {
                Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                None => println!("No progress saved for \"{}\"", info.title),
            }
        }
        Command::InitConfig => {
            config.save()?;
            println!("Wrote {}", Config::config_path().display());
        }
    }

    Ok(())
}

fn build_sync(config: &Config, local: JsonStore) -> ProgressSync {
    ProgressSync::new(local, remote_store(config))
}

#[cfg(feature = "network")]
fn remote_store(config: &Config) -> Option<Arc<dyn ProgressStore>> {
    let url = config.sync_url.as_ref()?;
    match RemoteStore::new(url, config.sync_token.clone(), config.sync_timeout()) {
        Ok(remote) => {
            info!(url = %remote.base_url(), "remote sync enabled");
            Some(Arc::new(remote))
        }
        Err(e) => {
            warn!(error = %e, "remote sync disabled");
            None
        }
    }
}

#[cfg(not(feature = "network"))]
fn remote_store(_config: &Config) -> Option<Arc<dyn ProgressStore>> {
    None
}

fn print_books(local: &JsonStore) {
    let books = local.all_books();
    if books.is_empty() {
        println!("No books yet. Try `bookdr import <file>` or `bookdr sample`.");
        return;
    }
    let progress: HashMap<String, _> = local
        .all_progress()
        .into_iter()
        .map(|p| (p.book_id.clone(), p))
        .collect();

    for book in books {
        let short_id = &book.book_id[..8.min(book.book_id.len())];
        match progress.get(&book.book_id) {
            Some(p) => println!(
                "{short_id}  {:>5.1}%  {:>3} wpm  {:>3}% acc  {}",
                p.completion_percent(),
                p.stats.wpm,
                p.stats.accuracy,
                book.title
            ),
            None => println!("{short_id}  {:>5.1}%  {:>3} wpm  {:>3}% acc  {}", 0.0, 0, 100, book.title),
        }
    }
}

#[cfg(feature = "network")]
fn print_remote(config: &Config) -> Result<()> {
    let Some(url) = &config.sync_url else {
        println!("No sync_url configured.");
        return Ok(());
    };
    let remote = RemoteStore::new(url, config.sync_token.clone(), config.sync_timeout())?;
    for p in remote.all_progress()? {
        println!(
            "remote  {:>5.1}%  {}  {}",
            p.completion_percent(),
            p.updated_at.format("%Y-%m-%d %H:%M"),
            p.title
        );
    }
    Ok(())
}

fn run_tui(config: &Config, sync: ProgressSync, book: &Book) -> Result<()> {
    let theme = Theme::resolve(&config.theme);
    let mut app = App::new(config, sync, theme);
    app.open_book(book);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;

    // Without enhancement flags some terminals never report key kinds.
    let keyboard_enhanced = execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));
    let result = run_app(&mut terminal, &mut app, &events);
    if !app.should_quit {
        app.quit();
    }

    if keyboard_enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    app.wait_for_sync();

    if let Err(err) = &result {
        error!(error = ?err, "ui loop failed");
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
            AppEvent::Key(_) => {}
            AppEvent::FocusGained => app.set_terminal_focus(true),
            AppEvent::FocusLost => app.set_terminal_focus(false),
            AppEvent::Tick | AppEvent::Resize => {}
        }
        app.tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let session = &app.session;
    let layout = AppLayout::new(area, app.show_keyboard);

    let mut header = vec![Span::styled(
        format!(" {} ", session.title()),
        Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
    )];
    if layout.sidebar.is_none() {
        header.push(Span::styled(
            format!("| {}", compact_stats(session.stats())),
            Style::default().fg(colors.fg()),
        ));
    }
    if let Some(status) = &app.status {
        header.push(Span::styled(
            format!("  {status}"),
            Style::default().fg(colors.warning()),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(header)), layout.header);

    frame.render_widget(TypingArea::new(session, &app.theme, app.paused), layout.main);

    if let Some(sidebar) = layout.sidebar {
        let widget = StatsSidebar::new(
            session.stats(),
            session.position(),
            session.len(),
            session.elapsed_secs(Utc::now()),
            &app.theme,
        );
        frame.render_widget(widget, sidebar);
    }

    let expected = session.expected_key();
    if let Some(keyboard) = layout.keyboard {
        let widget = KeyboardDiagram::new(&app.keyboard, &expected, app.last_typed, &app.theme);
        frame.render_widget(widget, keyboard);
    }

    frame.render_widget(
        ProgressBar::new("Book", session.progress(), &app.theme),
        layout.progress,
    );

    let next = if session.is_complete() {
        "Finished".to_string()
    } else {
        format!("Next: {}", expected.display_label)
    };
    let pause_hint = if app.paused { "[Enter] Resume" } else { "[Esc] Pause" };
    let hints = [next.as_str(), pause_hint, "[Ctrl+S] Save", "[Ctrl+Q] Quit"];
    let lines: Vec<Line> = pack_hint_lines(&hints, layout.footer.width as usize)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_pending()))))
        .collect();
    frame.render_widget(Paragraph::new(lines), layout.footer);
}

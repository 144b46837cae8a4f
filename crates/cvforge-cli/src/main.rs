mod app;
mod editor;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use cvforge_config::Config;
use cvforge_engine::export::{PdfExporter, render_print_html};
use cvforge_engine::io;
use cvforge_engine::render::SectionRenderer;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::{self, OpenOptions};
use std::io::{Stdout, stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;

use app::App;

#[derive(Parser)]
#[command(name = "cvforge", version, about = "Section-based CV editor with live preview")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Edit a document in the terminal
    Edit {
        /// Document file (created on first save)
        #[arg(default_value = "resume.json")]
        file: PathBuf,
    },

    /// Write the printable HTML page of a document
    Render {
        file: PathBuf,
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a document to PDF through the export service
    Export {
        file: PathBuf,
        #[arg(short, long, default_value = "cv.pdf")]
        output: PathBuf,
        /// Export endpoint, overrides the config file
        #[arg(long, env = "CVFORGE_EXPORT_URL")]
        url: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default().context("Failed to load config")?;

    match cli.command {
        Command::Edit { file } => {
            init_logging(Some(&config.log_file))?;
            edit(file, &config)
        }
        Command::Render { file, output } => {
            init_logging(None)?;
            let snapshot = io::load_from_file(&file)
                .with_context(|| format!("Failed to load {}", file.display()))?;
            let html = render_print_html(&snapshot, &mut SectionRenderer::default());
            match output {
                Some(path) => fs::write(&path, html)
                    .with_context(|| format!("Failed to write {}", path.display())),
                None => {
                    print!("{html}");
                    Ok(())
                }
            }
        }
        Command::Export { file, output, url } => {
            init_logging(None)?;
            let snapshot = io::load_from_file(&file)
                .with_context(|| format!("Failed to load {}", file.display()))?;
            let url = url.unwrap_or_else(|| config.export_url.clone());
            let exporter = PdfExporter::new(url, config.export_timeout())?;

            let runtime = tokio::runtime::Runtime::new()?;
            let pdf = runtime.block_on(exporter.export(&snapshot))?;
            fs::write(&output, &pdf)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            log::info!("Wrote {} ({} bytes)", output.display(), pdf.len());
            Ok(())
        }
    }
}

/// Log to `log_file` when given (the editor owns the terminal), stderr otherwise
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(log::LevelFilter::Info);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn edit(file: PathBuf, config: &Config) -> Result<()> {
    let autosave_path = config.autosave_path();
    let initial = App::initial_snapshot(&file, autosave_path)?;
    let exporter = PdfExporter::new(config.export_url.clone(), config.export_timeout())?;
    let runtime = tokio::runtime::Runtime::new()?;

    let mut app = App::new(
        initial,
        file,
        autosave_path,
        exporter,
        runtime.handle().clone(),
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.shutdown();

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    config: &Config,
) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| ui::ui(f, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if let Some(target) = app.handle_key(key.code) {
            let Some(initial) = app.text_for(&target) else {
                continue;
            };

            disable_raw_mode()?;
            execute!(std::io::stdout(), LeaveAlternateScreen)?;
            let edited = editor::edit_text(&config.editor_command(), &initial, target.file_suffix());
            execute!(std::io::stdout(), EnterAlternateScreen)?;
            enable_raw_mode()?;
            terminal.clear()?;

            match edited {
                Ok(text) => app.apply_edit(target, text),
                Err(e) => {
                    log::warn!("Edit aborted: {e:#}");
                    app.status = format!("Edit aborted: {e}");
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

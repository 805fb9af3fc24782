use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};

use textedit::terminal::{self, RawMode, StdinSource};
use textedit::{logging, Config, Editor, Result};

/// A small terminal text editor.
#[derive(Parser, Debug)]
#[command(name = "textedit", version, about)]
struct Args {
    /// File to edit. Without one the editor starts on an empty buffer.
    path: Option<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let raw_mode = RawMode::enable()?;
    let mut input = StdinSource::new();
    let mut stdout = io::stdout();

    let (rows, cols) = terminal::window_size(&mut stdout, &mut input)?;
    tracing::info!(target: "runtime", rows, cols, "startup");

    let mut editor = Editor::new(rows, cols, config);
    if let Some(path) = &args.path {
        editor.open(path)?;
    }
    editor.set_status_message("HELP: Ctrl-S = save | Ctrl-Q = quit");

    editor.run(&mut input, &mut stdout)?;
    raw_mode.restore()
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = logging::init();
    logging::install_panic_hook();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The raw-mode guard is gone by now, so the shell gets a sane terminal back.
            let mut stdout = io::stdout();
            let _ = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0));
            let _ = stdout.flush();
            tracing::error!(target: "runtime", error = %e, "fatal");
            eprintln!("textedit: {e}");
            ExitCode::FAILURE
        }
    }
}

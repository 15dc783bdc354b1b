use crate::{
    config::Config,
    editor::{Editor, ReadLine},
    popups::PopupSources,
};
use clap::{Parser, Subcommand, ValueEnum};
use ghostline_core::{
    keymap::PermissionMode,
    store::{self, MemoryStore, SqliteStore, Store},
};
use std::{
    env,
    error::Error,
    io::{self, IsTerminal},
    os::unix::io::AsRawFd,
    path::PathBuf,
    process,
    sync::Arc,
};
use tokio::io::{AsyncRead, AsyncWrite};

mod buffer;
mod config;
mod editor;
mod logger;
mod os;
mod paths;
mod popups;

const HELP: &str = "\
/help                 show this message
/history              list previous inputs, newest first
/completion on|off    toggle history suggestions
/mode NAME            switch permission mode
/clear                clear the screen";

#[derive(Parser)]
#[command(name = "ghostline", version, about = "Line editor with history ghost completions", long_about = None)]
struct Options {
    /// Config file to read instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database holding history and settings.
    #[arg(long, conflicts_with = "in_memory")]
    store: Option<PathBuf>,

    /// Keep history and settings in memory for this session only.
    #[arg(long)]
    in_memory: bool,

    /// Enable verbose logging, repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable all logging.
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the input history, newest first, with usage counts.
    History,

    /// Turn history suggestions on or off.
    Completion {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() {
    let options = Options::parse();

    logger::init();
    log_panics::init();

    if options.quiet {
        logger::quiet();
    } else {
        logger::verbose(options.verbose);
    }

    let code = match run(options) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            exitcode::SOFTWARE
        }
    };

    process::exit(code);
}

fn run(options: Options) -> Result<exitcode::ExitCode, Box<dyn Error>> {
    let store = open_store(&options)?;

    match options.command {
        Some(Command::History) => {
            print_history(&*store);
            return Ok(exitcode::OK);
        }
        Some(Command::Completion {
            state,
        }) => {
            store::write_enabled(&*store, matches!(state, Toggle::On))?;
            return Ok(exitcode::OK);
        }
        None => {}
    }

    if !io::stdin().is_terminal() {
        log::error!("standard input is not a terminal");
        return Ok(exitcode::USAGE);
    }

    let config = match options.config {
        Some(path) => Config::load(&path)?,
        None => Config::load(&paths::config_file()?)?,
    };

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    runtime.block_on(interactive(store, config))
}

fn open_store(options: &Options) -> Result<Arc<dyn Store>, Box<dyn Error>> {
    if options.in_memory {
        return Ok(Arc::new(MemoryStore::new()));
    }

    let path = match &options.store {
        Some(path) => path.clone(),
        None => paths::store_db()?,
    };

    log::debug!("opening store at {}", path.display());

    Ok(Arc::new(SqliteStore::open(path)?))
}

fn print_history(store: &dyn Store) {
    let counts = store::read_counts(store);

    for entry in store::read_history(store).iter().rev() {
        println!("{:>5}  {}", counts.get(entry).copied().unwrap_or(0), entry);
    }
}

async fn interactive(store: Arc<dyn Store>, config: Config) -> Result<exitcode::ExitCode, Box<dyn Error>> {
    let sources = PopupSources::new(&config, env::current_dir()?);
    let mut editor = Editor::new(tokio::io::stdin(), tokio::io::stdout(), store.clone(), config, sources)?;

    loop {
        match editor.read_line().await? {
            ReadLine::Input(line) => execute(&mut editor, &*store, &line).await?,
            ReadLine::Eof => return Ok(exitcode::OK),
        }
    }
}

/// Handle a submitted line. Lines starting with `/` are editor commands, the
/// rest are echoed back.
async fn execute<I, O>(editor: &mut Editor<I, O>, store: &dyn Store, line: &str) -> io::Result<()>
where
    I: AsyncRead + Unpin,
    O: AsyncWrite + AsRawFd + Unpin,
{
    let mut words = line.split_whitespace();

    match (words.next(), words.next()) {
        (Some("/help"), None) => println!("{}", HELP),
        (Some("/history"), None) => print_history(store),
        (Some("/clear"), None) => editor.clear_screen().await?,
        (Some("/completion"), Some(state @ ("on" | "off"))) => {
            if let Err(e) = editor.completion().set_enabled(state == "on") {
                log::warn!("failed to save completion setting: {}", e);
            }
        }
        (Some("/mode"), Some(name)) => match PermissionMode::ALL.iter().find(|mode| mode.as_str() == name) {
            Some(&mode) => editor.dispatcher_mut().set_mode(mode),
            None => log::warn!("unknown mode: {}", name),
        },
        _ => println!("{}", line),
    }

    Ok(())
}

use crate::environment::Environment;
use crate::interpreter;
use ansi_term::Colour;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::fmt;
use std::fs::read_to_string;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

const PROMPT: &str = "lispy> ";
const HISTORY_FILE: &str = ".lispy_history";

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Script {
        path: PathBuf,
        line: usize,
        error: interpreter::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Script { path, line, error } => {
                write!(f, "{}:{}: {}", path.display(), line, error)
            }
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub fn setup() -> io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("lispy")?;
    interface.set_prompt(PROMPT)?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push(HISTORY_FILE);
            Some(path)
        }
        None => None,
    }
}

pub fn save_history<T: Terminal>(interface: &Interface<T>) -> io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

/// Red when printing to a terminal, plain otherwise.
pub fn render_error(error: &dyn fmt::Display) -> String {
    let text = format!("error: {}", error);
    if atty::is(atty::Stream::Stdout) {
        Colour::Red.paint(text).to_string()
    } else {
        text
    }
}

pub fn repl<T: Terminal>(interface: &Interface<T>, env: &Rc<Environment>) {
    loop {
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig).ok();
            }
            Ok(ReadResult::Input(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                interface.add_history_unique(line.clone());
                let written = match interpreter::rep(&line, env) {
                    Ok(Some(text)) => writeln!(interface, "{}", text),
                    Ok(None) => Ok(()),
                    Err(e) => writeln!(interface, "{}", render_error(&e)),
                };
                written.ok();
            }
            Err(e) => {
                writeln!(interface, "Error: {}", e).ok();
                break;
            }
        }
    }
}

/// Runs a script one line at a time, writing each printable result to `out`. Stops at
/// the first line that fails.
pub fn run_script(path: &Path, env: &Rc<Environment>, out: &mut impl Write) -> Result<(), Error> {
    let source = read_to_string(path)?;
    for (index, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match interpreter::rep(line, env) {
            Ok(Some(text)) => writeln!(out, "{}", text)?,
            Ok(None) => {}
            Err(error) => {
                return Err(Error::Script {
                    path: path.to_path_buf(),
                    line: index + 1,
                    error,
                })
            }
        }
    }
    Ok(())
}

/// With no arguments, starts the interactive REPL. With one, runs that file as a script.
pub fn launch(args: Vec<String>, env: &Rc<Environment>) -> Result<(), Error> {
    match args.get(1) {
        Some(path) => {
            log::info!("running script {}", path);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            run_script(Path::new(path), env, &mut out)
        }
        None => {
            let interface = setup()?;
            repl(&interface, env);
            save_history(&interface)?;
            Ok(())
        }
    }
}

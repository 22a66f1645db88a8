use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Read, Stdin};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub fn stderr_is_tty() -> bool {
    io::stderr().is_terminal()
}

pub fn stdin_is_tty() -> bool {
    io::stdin().is_terminal()
}

/// Structure input, either a named file or piped stdin.
pub enum InputSource {
    File { reader: BufReader<File>, path: PathBuf },
    Stdin(BufReader<Stdin>),
}

impl InputSource {
    /// Name used in error messages and progress output.
    pub fn describe(&self) -> String {
        match self {
            InputSource::File { path, .. } => path.display().to_string(),
            InputSource::Stdin(_) => "<stdin>".to_string(),
        }
    }
}

impl Read for InputSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputSource::File { reader, .. } => reader.read(buf),
            InputSource::Stdin(reader) => reader.read(buf),
        }
    }
}

pub fn open_input(path: Option<&Path>) -> Result<InputSource> {
    let Some(path) = path else {
        return Ok(InputSource::Stdin(BufReader::new(io::stdin())));
    };
    let file = File::open(path)
        .with_context(|| format!("Failed to open structure file: {}", path.display()))?;
    Ok(InputSource::File {
        reader: BufReader::new(file),
        path: path.to_path_buf(),
    })
}

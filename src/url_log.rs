use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "gfu.log";

/// Append-only record of discovered URLs, one per line, grouped under `# <pattern>` headers.
pub struct UrlLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl UrlLog {
    /// Opens `<output_dir>/gfu.log` for appending, creating the folder if needed.
    pub fn open(output_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(UrlLog {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn section(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.writer, "# {}", name)?;
        self.writer.flush()
    }

    /// Flushed per call so a killed run keeps everything found so far.
    pub fn append(&mut self, urls: &[String]) -> io::Result<()> {
        for url in urls {
            writeln!(self.writer, "{}", url)?;
        }
        self.writer.flush()
    }
}

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::logic::dataset::record::EvalRecord;

/// Appends evaluation records to a JSONL file, one record per line.
pub struct EvalWriter {
    out: BufWriter<File>,
    path: PathBuf,
    written: usize,
}

impl EvalWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            path: path.to_path_buf(),
            written: 0,
        })
    }

    pub fn append(&mut self, record: &EvalRecord) -> io::Result<()> {
        let json = serde_json::to_string(record)?;
        writeln!(self.out, "{}", json)?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn finish(mut self) -> io::Result<usize> {
        self.out.flush()?;
        log::info!("Wrote {} evaluation records to {}", self.written, self.path.display());
        Ok(self.written)
    }
}

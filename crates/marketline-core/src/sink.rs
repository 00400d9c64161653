//! Output sink: one JSON file per batch, written to a tmp file then renamed

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::batch::Batch;

/// Writes each batch as a JSON array of records.
///
/// File name: `{marketplace}_{slug}_{YYYYMMDD}.json`, date taken from the
/// batch timestamp, so re-running on the same day replaces the file. Two
/// sellers whose slugs sanitize to the same name get `_2`, `_3`, ... suffixes
/// instead of overwriting each other.
#[derive(Debug)]
pub struct JsonSink {
    output_dir: PathBuf,
    /// File name -> seller that wrote it through this sink
    claimed: Mutex<HashMap<String, String>>,
}

impl JsonSink {
    /// Create the output directory if needed and clear stale tmp files.
    pub fn new(output_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        cleanup_tmp_files(&output_dir)?;
        Ok(Self {
            output_dir,
            claimed: Mutex::default(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Deterministic file name for `batch`
    pub fn file_name(batch: &Batch) -> String {
        format!(
            "{}_{}_{}.json",
            batch.marketplace,
            sanitize(&batch.seller),
            batch.batched_at.format("%Y%m%d")
        )
    }

    /// `file_name`, suffixed if another seller already claimed it
    fn claim(&self, batch: &Batch) -> String {
        let base = Self::file_name(batch);
        let owner = format!("{}/{}", batch.marketplace, batch.seller);
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);

        let mut name = base.clone();
        let mut n = 1;
        while let Some(existing) = claimed.get(&name) {
            if *existing == owner {
                return name;
            }
            n += 1;
            name = format!("{}_{n}.json", base.trim_end_matches(".json"));
        }
        if n > 1 {
            log::warn!("{owner}: file name {base} already used by another seller, writing {name}");
        }
        claimed.insert(name.clone(), owner);
        name
    }

    /// Write `batch`, returning the final path.
    pub fn write(&self, batch: &Batch) -> io::Result<PathBuf> {
        let filename = self.claim(batch);
        let final_path = self.output_dir.join(&filename);
        let tmp_path = self.output_dir.join(format!("{filename}.tmp"));

        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &batch.records).map_err(io::Error::other)?;
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp_path, &final_path)?;
        log::debug!(
            "{}: {} records written",
            final_path.display(),
            batch.records.len()
        );
        Ok(final_path)
    }
}

/// Keep slugs filesystem-safe
fn sanitize(slug: &str) -> String {
    slug.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

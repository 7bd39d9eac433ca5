use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context};
use command_executor::command::Command;

use crate::config::Config;
use crate::error::SortError;
use crate::keyed_record::{resolve_indices, KeyedRecord};
use crate::pull_reader::PullReader;
use crate::run_file::RunFile;
use crate::writer::CsvWriter;

/// Result of one pairwise merge, reported back to the round driver.
pub(crate) struct MergeOutcome {
    pub(crate) pair_index: usize,
    pub(crate) result: Result<RunFile, anyhow::Error>,
}

/// Merges two sorted run files into one.
pub(crate) struct MergeCommand {
    pair_index: usize,
    left: RunFile,
    right: RunFile,
    output: PathBuf,
    config: Arc<Config>,
    outcomes: Sender<MergeOutcome>,
}

impl MergeCommand {
    pub(crate) fn new(
        pair_index: usize,
        left: RunFile,
        right: RunFile,
        output: PathBuf,
        config: Arc<Config>,
        outcomes: Sender<MergeOutcome>,
    ) -> MergeCommand {
        MergeCommand {
            pair_index,
            left,
            right,
            output,
            config,
            outcomes,
        }
    }
}

impl Command for MergeCommand {
    fn execute(&self) -> Result<(), anyhow::Error> {
        let result = merge_pair(&self.left, &self.right, &self.output, &self.config)
            .with_context(
                || SortError::MergeFailed {
                    left: self.left.path().display().to_string(),
                    right: self.right.path().display().to_string(),
                }
            );
        if let Err(e) = &result {
            log::error!("{:#}", e);
        }
        self.outcomes
            .send(MergeOutcome { pair_index: self.pair_index, result })
            .map_err(|_| anyhow!("merge outcome receiver is gone"))
    }
}

/// Merge two sorted files with the same header into `output`.
///
/// The side that compares less is written and refilled. On equal keys both rows are written,
/// left first, so every input row appears exactly once.
pub(crate) fn merge_pair(left: &RunFile, right: &RunFile, output: &PathBuf, config: &Config) -> Result<RunFile, anyhow::Error> {
    log::debug!(
        "Merging {} and {} into {}, thread: {}",
        left.path().display(),
        right.path().display(),
        output.display(),
        thread::current().name().unwrap_or("unnamed")
    );
    let mut left_reader = PullReader::open(left.path(), config.separator())?;
    let mut right_reader = PullReader::open(right.path(), config.separator())?;
    let left_row = left_reader.next_row()?;
    let right_row = right_reader.next_row()?;

    let header = left_reader
        .column_headers()
        .ok_or_else(|| SortError::MissingHeader { path: left.path().display().to_string() })?
        .to_vec();
    if right_reader.column_headers().is_some_and(|right_header| right_header != header.as_slice()) {
        return Err(
            SortError::HeaderMismatch {
                left: left.path().display().to_string(),
                right: right.path().display().to_string(),
            }.into()
        );
    }
    let indices = resolve_indices(&header, config.fields(), left.path())?;
    let key = |row: Vec<String>| KeyedRecord::from_row(row, &indices, config.fields(), config.order());

    let mut writer = CsvWriter::create(output, config.separator());
    writer.write_row(&header)?;

    let mut current_left = left_row.map(key).transpose()?;
    let mut current_right = right_row.map(key).transpose()?;
    loop {
        if current_left.is_none() {
            current_left = left_reader.next_row()?.map(key).transpose()?;
        }
        if current_right.is_none() {
            current_right = right_reader.next_row()?.map(key).transpose()?;
        }
        match (current_left.take(), current_right.take()) {
            (None, None) => break,
            (Some(l), None) => writer.write_row(l.item())?,
            (None, Some(r)) => writer.write_row(r.item())?,
            (Some(l), Some(r)) => {
                if l < r {
                    writer.write_row(l.item())?;
                    current_right = Some(r);
                } else if l > r {
                    writer.write_row(r.item())?;
                    current_left = Some(l);
                } else {
                    writer.write_row(l.item())?;
                    writer.write_row(r.item())?;
                }
            }
        }
    }
    left_reader.close();
    right_reader.close();
    writer.close()?;

    let rows = writer.rows() - 1;
    if config.remove_merged() {
        std::fs::remove_file(left.path())
            .with_context(|| format!("remove {}", left.path().display()))?;
        std::fs::remove_file(right.path())
            .with_context(|| format!("remove {}", right.path().display()))?;
    }
    log::debug!("Merged {} rows into {}", rows, output.display());
    Ok(RunFile::new(output.clone(), rows))
}

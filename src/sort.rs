use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use command_executor::shutdown_mode::ShutdownMode;
use command_executor::thread_pool::ThreadPool;
use command_executor::thread_pool_builder::ThreadPoolBuilder;
use regex::Regex;
use tempfile::Builder;

use crate::config::Config;
use crate::error::SortError;
use crate::field::Field;
use crate::keyed_record::{resolve_indices, KeyedRecord};
use crate::merge_command::{MergeCommand, MergeOutcome};
use crate::order::Order;
use crate::pull_reader::PullReader;
use crate::record::Record;
use crate::run_file::RunFile;
use crate::value::Value;
use crate::writer::CsvWriter;

const RUN_PREFIX: &str = "run-";
const MERGE_PREFIX: &str = "merge-";
const FILE_SUFFIX: &str = ".csv";
const MAX_NAME_CHARS: usize = 64;
const TMP_PREFIX: &str = "external-sort-";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Accepting,
    Done,
}

/// Sort records that do not fit in memory.
///
/// Records are buffered up to the buffer capacity. A full buffer is sorted and spilled to a
/// run file in a private temporary directory. [ExternalSort::merge_files] then merges the runs
/// pairwise, one round at a time, on a pool of worker threads until a single sorted file is
/// left.
///
/// The temporary directory and the files in it are left on disk for the caller; see
/// [ExternalSort::tmp_dir].
///
/// The first record added fixes the columns of the sorted output. Later records may leave
/// columns out but may not bring new ones. Missing and [Value::Null] values are written as
/// empty strings, so the output does not depend on how many runs were merged.
///
/// # Examples
/// ```
/// use delimited_sort::field::Field;
/// use delimited_sort::field_type::FieldType;
/// use delimited_sort::record::Record;
/// use delimited_sort::sort::ExternalSort;
///
/// fn sort_people(tmp: std::path::PathBuf) -> Result<std::path::PathBuf, anyhow::Error> {
///     let mut external_sort = ExternalSort::new();
///     external_sort.with_tmp_dir(tmp);
///     external_sort.with_buffer(2);
///     external_sort.add_field(Field::string("city"));
///     external_sort.add_field(Field::new("age", FieldType::Integer));
///     external_sort.add(Record::new().with("name", "Tom").with("city", "Oslo").with("age", 59))?;
///     external_sort.add(Record::new().with("name", "Meg").with("city", "Bergen").with("age", 54))?;
///     external_sort.add(Record::new().with("name", "Ann").with("city", "Oslo").with("age", 7))?;
///     external_sort.merge_files()
/// }
/// ```
pub struct ExternalSort {
    tmp: PathBuf,
    tasks: usize,
    buffer_capacity: usize,
    separator: String,
    fields: Vec<Field>,
    order: Order,
    remove_merged: bool,
    state: State,
    run_dir: Option<PathBuf>,
    columns: Option<Vec<String>>,
    buffer: Vec<KeyedRecord<Record>>,
    runs: Vec<RunFile>,
    file_name_filter: Option<Regex>,
}

impl ExternalSort {
    /// Create a default ExternalSort.
    ///
    /// * temporary files go to a new directory under std::env::temp_dir()
    /// * the buffer holds 50 000 records
    /// * merges use all available cores
    /// * the field separator is ','
    /// * the order is Asc
    /// * merged inputs are removed
    pub fn new() -> ExternalSort {
        ExternalSort {
            tmp: std::env::temp_dir(),
            tasks: 0,
            buffer_capacity: 50_000,
            separator: ",".to_string(),
            fields: vec![],
            order: Order::Asc,
            remove_merged: true,
            state: State::Accepting,
            run_dir: None,
            columns: None,
            buffer: Vec::new(),
            runs: Vec::new(),
            file_name_filter: None,
        }
    }

    /// Set the directory under which the temporary directory is created. The default is
    /// std::env::temp_dir()
    pub fn with_tmp_dir(&mut self, tmp: PathBuf) {
        self.tmp = tmp;
    }

    /// Set the number of merge threads. The default is zero which will result in using all
    /// system cores
    pub fn with_tasks(&mut self, tasks: usize) {
        self.tasks = tasks;
    }

    /// Set the number of records kept in memory before a spill. The default is 50 000.
    pub fn with_buffer(&mut self, buffer_capacity: usize) {
        self.buffer_capacity = buffer_capacity.max(1);
    }

    /// Set the separator of the temporary files. The default is ','
    pub fn with_separator(&mut self, separator: &str) {
        self.separator = separator.to_string();
    }

    /// Sort by the given columns, compared as strings.
    pub fn sort_by(&mut self, columns: &[&str]) {
        self.fields = columns.iter().map(|column| Field::string(column)).collect();
    }

    /// Add a sort field. Fields are compared in the order they were added.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Replace all sort fields with the `fields` value.
    pub fn with_fields(&mut self, fields: Vec<Field>) {
        self.fields = fields;
    }

    /// Set [Order]
    pub fn with_order(&mut self, order: Order) {
        self.order = order;
    }

    /// Remove the two inputs of every successful merge. The default is true.
    pub fn with_remove_merged(&mut self, remove_merged: bool) {
        self.remove_merged = remove_merged;
    }

    /// The directory holding the run files, once the first run was written.
    pub fn tmp_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }

    /// Number of run files written so far.
    pub fn runs(&self) -> usize {
        self.runs.len()
    }

    /// Add a record. Spills the buffer to a run file when it reaches its capacity.
    ///
    /// Every sort field must be present in the record and orderable as its declared type. A
    /// column that the first record did not have is [SortError::UnexpectedColumn].
    pub fn add(&mut self, record: Record) -> Result<(), anyhow::Error> {
        if self.state != State::Accepting {
            return Err(SortError::Finished.into());
        }
        let keyed = KeyedRecord::from_record(record, &self.fields, self.order)?;
        if self.columns.is_none() {
            self.columns = Some(keyed.item().columns().map(str::to_string).collect());
        } else if let Some(columns) = &self.columns {
            let unexpected = keyed.item()
                .columns()
                .find(|column| !columns.iter().any(|c| c.as_str() == *column));
            if let Some(column) = unexpected {
                return Err(SortError::UnexpectedColumn { column: column.to_string() }.into());
            }
        }
        self.buffer.push(keyed);
        if self.buffer.len() >= self.buffer_capacity {
            self.spill()?;
        }
        Ok(())
    }

    fn spill(&mut self) -> Result<(), anyhow::Error> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.buffer.sort();
        let path = self.spill_path()?;
        let columns = self.columns.clone().unwrap_or_default();
        let mut writer = CsvWriter::create(&path, &self.separator);
        writer.write_row(&columns)?;
        for keyed in &self.buffer {
            let row: Vec<String> = columns
                .iter()
                .map(|column| keyed.item().get(column).map(Value::to_string).unwrap_or_default())
                .collect();
            writer.write_row(&row)?;
        }
        writer.close()?;
        log::info!("Spilled {} records to {}", self.buffer.len(), path.display());
        self.runs.push(RunFile::new(path, self.buffer.len()));
        self.buffer.clear();
        Ok(())
    }

    /// A name derived from the leading key of the buffer, unique within the run directory.
    fn spill_path(&mut self) -> Result<PathBuf, anyhow::Error> {
        let run_dir = self.run_dir()?;
        let leading: Vec<String> = match self.buffer.first() {
            None => vec![],
            Some(keyed) => self.fields
                .iter()
                .map(|field| keyed.item().get(field.name()).map(Value::to_string).unwrap_or_default())
                .collect(),
        };
        if self.file_name_filter.is_none() {
            self.file_name_filter = Some(Regex::new("[^A-Za-z0-9._-]")?);
        }
        let leading = leading.join("_");
        let name: String = match &self.file_name_filter {
            Some(file_name_filter) => file_name_filter.replace_all(&leading, "_").chars().take(MAX_NAME_CHARS).collect(),
            None => leading,
        };
        let mut path = run_dir.join(format!("{RUN_PREFIX}{name}{FILE_SUFFIX}"));
        let mut i = 1;
        while path.exists() {
            path = run_dir.join(format!("{RUN_PREFIX}{name}_{i}{FILE_SUFFIX}"));
            i += 1;
        }
        Ok(path)
    }

    fn run_dir(&mut self) -> Result<PathBuf, anyhow::Error> {
        if let Some(run_dir) = &self.run_dir {
            return Ok(run_dir.clone());
        }
        fs::create_dir_all(&self.tmp)
            .with_context(|| format!("create directory {}", self.tmp.display()))?;
        let run_dir = Builder::new()
            .prefix(TMP_PREFIX)
            .tempdir_in(&self.tmp)
            .with_context(|| format!("create temporary directory in {}", self.tmp.display()))?
            .keep();
        log::info!("Writing run files to {}", run_dir.display());
        self.run_dir = Some(run_dir.clone());
        Ok(run_dir)
    }

    fn create_config(&mut self) -> Result<Config, anyhow::Error> {
        let mut tasks = self.tasks;
        if self.tasks == 0 {
            tasks = num_cpus::get();
        }
        Ok(
            Config::new(
                self.run_dir()?,
                tasks,
                self.separator.clone(),
                self.fields.clone(),
                self.order,
                self.remove_merged,
            )
        )
    }

    /// Spill what is left in the buffer and merge all run files into one sorted file.
    ///
    /// The returned file lives in the temporary directory. The worker pool is shut down before
    /// returning, whether the merge succeeded or not, and no more records can be added.
    pub fn merge_files(&mut self) -> Result<PathBuf, anyhow::Error> {
        if self.state != State::Accepting {
            return Err(SortError::Finished.into());
        }
        self.spill()?;
        self.state = State::Done;
        if self.runs.is_empty() {
            return Err(SortError::NoRecords.into());
        }

        let config = Arc::new(self.create_config()?);
        let files = std::mem::take(&mut self.runs);
        let mut merging_pool = Self::create_pool(&config)?;
        let result = Self::merge_rounds(&mut merging_pool, files, &config);
        log::info!("Shutting down merging pool");
        merging_pool.shutdown();
        let joined = merging_pool.join();
        let merged = result?;
        joined?;
        log::info!("Finished merging, {} rows in {}", merged.rows(), merged.path().display());
        Ok(merged.path().clone())
    }

    fn create_pool(config: &Config) -> Result<ThreadPool, anyhow::Error> {
        let mut thread_pool_builder = ThreadPoolBuilder::new();
        let merging_pool = thread_pool_builder
            .with_name("merging".to_string())
            .with_tasks(config.tasks())
            .with_queue_size(config.queue_size())
            .with_shutdown_mode(ShutdownMode::CompletePending)
            .build()?;
        Ok(merging_pool)
    }

    /// Merge pairs of files round by round. A round completes before the next one starts.
    fn merge_rounds(thread_pool: &mut ThreadPool, mut files: Vec<RunFile>, config: &Arc<Config>) -> Result<RunFile, anyhow::Error> {
        let mut round = 0;
        while files.len() > 1 {
            files.sort();
            log::info!("Merge round {}, {} files", round, files.len());
            let (sender, receiver) = mpsc::channel::<MergeOutcome>();
            let mut carried = None;
            let mut pairs = 0;
            let mut remaining = files.into_iter();
            while let Some(left) = remaining.next() {
                match remaining.next() {
                    Some(right) => {
                        let output = config.run_dir().join(format!("{MERGE_PREFIX}{round:04}-{pairs:06}{FILE_SUFFIX}"));
                        let merge_command = MergeCommand::new(pairs, left, right, output, config.clone(), sender.clone());
                        thread_pool.submit(Box::new(merge_command));
                        pairs += 1;
                    }
                    None => carried = Some(left),
                }
            }
            drop(sender);

            let mut merged: Vec<Option<RunFile>> = vec![None; pairs];
            let mut failure = None;
            for _ in 0..pairs {
                let outcome = match receiver.recv() {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        failure.get_or_insert_with(|| anyhow::Error::new(SortError::TaskLost));
                        break;
                    }
                };
                match outcome.result {
                    Ok(run_file) => merged[outcome.pair_index] = Some(run_file),
                    Err(e) => {
                        failure.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = failure {
                return Err(e);
            }

            files = merged.into_iter().flatten().collect();
            files.extend(carried);
            round += 1;
        }
        files.pop().ok_or_else(|| anyhow!("no files left to merge"))
    }

    /// Check that a headed file is sorted by the configured fields and order.
    pub fn check<P: AsRef<Path>>(&self, path: P) -> Result<bool, anyhow::Error> {
        let path = path.as_ref();
        let mut reader = PullReader::open(path, &self.separator)?;
        let first = reader.next_row()?;
        let header = match reader.column_headers() {
            None => return Ok(true),
            Some(header) => header.to_vec(),
        };
        let indices = resolve_indices(&header, &self.fields, path)?;

        let mut previous = match first {
            None => return Ok(true),
            Some(row) => KeyedRecord::from_row(row, &indices, &self.fields, self.order)?,
        };
        while let Some(row) = reader.next_row()? {
            let current = KeyedRecord::from_row(row, &indices, &self.fields, self.order)?;
            if previous > current {
                return Ok(false);
            }
            previous = current;
        }
        Ok(true)
    }

    /// Sort a headed delimited file into `output`.
    ///
    /// Every row becomes a record of string values keyed by the header. Short rows are padded
    /// with empty strings.
    pub fn sort_file<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, input: P, output: Q) -> Result<(), anyhow::Error> {
        let input = input.as_ref();
        let output = output.as_ref();
        log::info!("Start sorting {}", input.display());
        let rows = PullReader::open(input, &self.separator)?.into_maps();
        for row in rows {
            let record: Record = row?.into_iter().collect();
            self.add(record)?;
        }
        let merged = self.merge_files()?;
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create directory {}", parent.display()))?;
            }
        }
        if fs::rename(&merged, output).is_err() {
            fs::copy(&merged, output)
                .with_context(|| anyhow!("Copy {} to {}", merged.display(), output.display()))?;
            fs::remove_file(&merged)?;
        }
        log::info!("Finish sorting {} into {}", input.display(), output.display());
        Ok(())
    }
}

impl Default for ExternalSort {
    fn default() -> Self {
        ExternalSort::new()
    }
}

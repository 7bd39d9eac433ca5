//! This crate reads, writes and sorts delimited text files, for example CSV or TSV.
//!
//! Three pieces make up the crate:
//!
//! * a codec for lines of delimited text in which a field may be quoted with `"`, a quote inside
//!   a quoted field is doubled and a newline is written as the two characters `\n`
//! * readers and a writer for such files. [reader::CsvReader] pushes rows into a
//!   [reader::RowHandler], [pull_reader::PullReader] hands out one row per call and
//!   [writer::CsvWriter] writes rows, records and header lines
//! * an external sort, [sort::ExternalSort], that buffers records in memory, spills sorted runs
//!   to temporary files and merges them pairwise on a pool of worker threads until one sorted
//!   file is left
//!
//! The external sort is meant for data sets that do not fit in memory. The buffer size bounds
//! the number of records held at any time and the number of merge threads bounds the CPU use.
//!
//! # Examples
//! ```
//! use std::path::PathBuf;
//! use delimited_sort::field::Field;
//! use delimited_sort::field_type::FieldType;
//! use delimited_sort::order::Order;
//! use delimited_sort::sort::ExternalSort;
//!
//! fn sort_trips(input: PathBuf, output: PathBuf, tmp: PathBuf) -> Result<(), anyhow::Error> {
//!     let mut external_sort = ExternalSort::new();
//!
//!     // the directory under which a private directory for the run files is created. The
//!     // default is std::env::temp_dir(), for large inputs a dedicated directory on the same
//!     // file system as the output is recommended.
//!     external_sort.with_tmp_dir(tmp);
//!
//!     // records kept in memory before a sorted run is written to disk
//!     external_sort.with_buffer(100_000);
//!
//!     // number of merge threads, the default is to use all available cores
//!     external_sort.with_tasks(2);
//!
//!     external_sort.add_field(Field::string("route_id"));
//!     external_sort.add_field(Field::new("departure", FieldType::Integer));
//!     external_sort.with_order(Order::Asc);
//!
//!     external_sort.sort_file(input, output)
//! }
//! ```
//!

pub(crate) mod line_source;
pub(crate) mod key;
pub(crate) mod keyed_record;
pub(crate) mod run_file;
pub(crate) mod merge_command;
pub(crate) mod config;

pub mod codec;
pub mod error;
pub mod reader;
pub mod pull_reader;
pub mod writer;
pub mod value;
pub mod record;
pub mod sort;
pub mod field;
pub mod field_type;
pub mod order;

use std::io::Cursor;
use std::ops::ControlFlow;

use anyhow::anyhow;
use delimited_sort::error::{HaltPipeline, ParseFault};
use delimited_sort::reader::{CsvReader, RowHandler};

mod common;

#[derive(Default)]
struct Collector {
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    stop_after: Option<usize>,
    fail_on: Option<usize>,
    halt_on: Option<usize>,
    finished: bool,
}

impl RowHandler for Collector {
    fn process_header(&mut self, header: &[String]) -> Result<(), anyhow::Error> {
        self.header = Some(header.to_vec());
        Ok(())
    }

    fn process_row(&mut self, _header: &[String], row: Vec<String>) -> Result<ControlFlow<()>, anyhow::Error> {
        self.rows.push(row);
        if self.fail_on == Some(self.rows.len()) {
            return Err(anyhow!("bad row"));
        }
        if self.halt_on == Some(self.rows.len()) {
            return Err(HaltPipeline::new("enough").into());
        }
        if self.stop_after == Some(self.rows.len()) {
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    }

    fn after_processing(&mut self) {
        self.finished = true;
    }
}

fn parse(src: &str, separator: &str) -> Result<Collector, anyhow::Error> {
    let mut collector = Collector::default();
    CsvReader::from_reader(Cursor::new(src.to_string()), separator)?.parse(&mut collector)?;
    Ok(collector)
}

fn assert_people(collector: &Collector) {
    assert_eq!(collector.header.as_deref(), Some(["name", "age", "birthDate"].map(String::from).as_slice()));
    assert_eq!(collector.rows.len(), 3);
    assert_eq!(collector.rows[0], vec!["Tom Hanks", "59", "7/9/1956"]);
    assert_eq!(collector.rows[1], vec!["Meg Ryan", "54", "11/19/1961"]);
    assert_eq!(collector.rows[2], vec!["Tom Cruise", "53", "7/3/1962"]);
    assert!(collector.finished);
}

#[test]
fn test_no_quotes() -> Result<(), anyhow::Error> {
    let src = "name,age,birthDate\n\
        Tom Hanks,59,7/9/1956\n\
        Meg Ryan,54,11/19/1961\n\
        Tom Cruise,53,7/3/1962\n";
    assert_people(&parse(src, ",")?);
    Ok(())
}

#[test]
fn test_quotes() -> Result<(), anyhow::Error> {
    let src = "\"name\",\"age\",\"birthDate\"\n\
        \"Tom Hanks\",\"59\",\"7/9/1956\"\n\
        \"Meg Ryan\",\"54\",\"11/19/1961\"\n\
        \"Tom Cruise\",\"53\",\"7/3/1962\"\n";
    assert_people(&parse(src, ",")?);
    Ok(())
}

#[test]
fn test_mixed_quotes() -> Result<(), anyhow::Error> {
    let src = "name,\"age\",birthDate\n\
        Tom Hanks,\"59\",\"7/9/1956\"\n\
        \"Meg Ryan\",54,\"11/19/1961\"\n\
        Tom Cruise,53,7/3/1962\n";
    assert_people(&parse(src, ",")?);
    Ok(())
}

#[test]
fn test_escaped_quotes() -> Result<(), anyhow::Error> {
    let src = "name,\"age\",birthDate\n\
        Tom \"\"Big\"\" Hanks,\"59\",\"7/9/1956\"\n\
        \"Meg \"\"Botched\"\" Ryan\",54,\"11/19/1961\"\n\
        Tom \"\"Cra-Cra\"\" Cruise,53,7/3/1962\n";
    let collector = parse(src, ",")?;
    assert_eq!(collector.rows[0], vec!["Tom \"Big\" Hanks", "59", "7/9/1956"]);
    assert_eq!(collector.rows[1], vec!["Meg \"Botched\" Ryan", "54", "11/19/1961"]);
    assert_eq!(collector.rows[2], vec!["Tom \"Cra-Cra\" Cruise", "53", "7/3/1962"]);
    Ok(())
}

#[test]
fn test_given_headers_and_stop() -> Result<(), anyhow::Error> {
    let src = "\"01-APR-2014\"|\"INV SVC -G\"|\"SD\"|\"CORE SVCS\"|\"\"\"\"|\"\"|\"Investor Services Complex\"|\"Service Delivery\"|\"Core Services\"\n\
        \"02-APR-2014\"|\"x\"|\"\"|\"\"|\"\"|\"\"|\"\"|\"\"|\"\"\n";
    let mut collector = Collector { stop_after: Some(1), ..Collector::default() };
    let reader = CsvReader::from_reader(Cursor::new(src.to_string()), "|")?.with_column_headers(vec![]);
    let rows = reader.parse(&mut collector)?;

    assert_eq!(rows, 1);
    assert!(collector.header.is_none());
    assert_eq!(
        collector.rows[0],
        vec![
            "01-APR-2014", "INV SVC -G", "SD", "CORE SVCS", "\"", "",
            "Investor Services Complex", "Service Delivery", "Core Services",
        ]
    );
    assert!(collector.finished);
    Ok(())
}

#[test]
fn test_stop_counts_stopping_row() -> Result<(), anyhow::Error> {
    let src = "a,b\n1,2\n3,4\n5,6\n";
    let mut collector = Collector { stop_after: Some(2), ..Collector::default() };
    let rows = CsvReader::from_reader(Cursor::new(src), ",")?.parse(&mut collector)?;
    assert_eq!(rows, 2);
    assert_eq!(collector.rows.len(), 2);
    assert!(collector.finished);
    Ok(())
}

#[test]
fn test_blank_lines_skipped() -> Result<(), anyhow::Error> {
    let src = "\n\na,b\r\n\r\n1,2\n\n3,4";
    let collector = parse(src, ",")?;
    assert_eq!(collector.header, Some(vec!["a".to_string(), "b".to_string()]));
    assert_eq!(collector.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    Ok(())
}

#[test]
fn test_empty_source() -> Result<(), anyhow::Error> {
    let mut collector = Collector::default();
    let rows = CsvReader::from_reader(Cursor::new(""), ",")?.parse(&mut collector)?;
    assert_eq!(rows, 0);
    assert!(collector.header.is_none());
    assert!(collector.finished);
    Ok(())
}

#[test]
fn test_handler_error_wrapped() -> Result<(), anyhow::Error> {
    let src = "a,b\n1,2\n\n3,4\n";
    let mut collector = Collector { fail_on: Some(2), ..Collector::default() };
    let error = CsvReader::from_reader(Cursor::new(src), ",")?
        .parse(&mut collector)
        .unwrap_err();

    let fault = error.downcast_ref::<ParseFault>().expect("parse fault context");
    assert_eq!(fault.line(), 4);
    assert_eq!(fault.source_name(), "<stream>");
    assert!(matches!(fault, ParseFault::Row { text, .. } if text == "3,4"));
    assert_eq!(error.root_cause().to_string(), "bad row");
    assert!(collector.finished);
    Ok(())
}

#[test]
fn test_halt_passes_through() -> Result<(), anyhow::Error> {
    let src = "a,b\n1,2\n3,4\n";
    let mut collector = Collector { halt_on: Some(1), ..Collector::default() };
    let error = CsvReader::from_reader(Cursor::new(src), ",")?
        .parse(&mut collector)
        .unwrap_err();

    assert!(error.is::<HaltPipeline>());
    assert!(error.downcast_ref::<ParseFault>().is_none());
    assert_eq!(error.downcast_ref::<HaltPipeline>().map(HaltPipeline::message), Some("enough"));
    assert!(collector.finished);
    Ok(())
}

#[test]
fn test_bom_and_file() -> Result<(), anyhow::Error> {
    common::setup();
    let path = common::temp_file_name("./target/results/");
    let mut content = vec![0xEF, 0xBB, 0xBF];
    content.extend_from_slice("id,name\n1,\"x,y\"\n".as_bytes());
    std::fs::write(&path, content)?;

    let mut collector = Collector::default();
    let rows = CsvReader::open(&path, ",")?.parse(&mut collector)?;
    assert_eq!(rows, 1);
    assert_eq!(collector.header, Some(vec!["id".to_string(), "name".to_string()]));
    assert_eq!(collector.rows, vec![vec!["1", "x,y"]]);
    std::fs::remove_file(path)?;
    Ok(())
}

#[test]
fn test_literal_mode() -> Result<(), anyhow::Error> {
    let src = "a\tb\n\"1\"\tx,y\n";
    let mut collector = Collector::default();
    CsvReader::from_reader(Cursor::new(src), "\t")?
        .escaped(false)
        .parse(&mut collector)?;
    assert_eq!(collector.rows, vec![vec!["\"1\"", "x,y"]]);
    Ok(())
}

#[test]
fn test_missing_file() {
    assert!(CsvReader::open("./target/results/does-not-exist.csv", ",").is_err());
}

#[test]
fn test_read_fault_line() -> Result<(), anyhow::Error> {
    let src: Vec<u8> = b"a,b\n1,2\n\xff\xfe,x\n".to_vec();
    let mut collector = Collector::default();
    let error = CsvReader::from_reader(Cursor::new(src), ",")?
        .parse(&mut collector)
        .unwrap_err();

    let fault = error.downcast_ref::<ParseFault>().expect("parse fault context");
    assert!(matches!(fault, ParseFault::Row { .. }));
    assert_eq!(fault.line(), 3);
    assert_eq!(collector.rows, vec![vec!["1", "2"]]);
    assert!(collector.finished);

    let error = CsvReader::from_reader(Cursor::new(b"\xff,a\n1,2\n".to_vec()), ",")?
        .parse(&mut Collector::default())
        .unwrap_err();
    let fault = error.downcast_ref::<ParseFault>().expect("parse fault context");
    assert!(matches!(fault, ParseFault::Header { .. }));
    assert_eq!(fault.line(), 1);
    Ok(())
}

use std::fs;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use data_encoding::HEXLOWER;

pub fn setup() {
    let _ = simple_logger::init_with_level(log::Level::Warn);
    let results_dir_path = PathBuf::from_str("./target/results/").unwrap();
    let tmp_dir_path = PathBuf::from_str("./target/tmp/").unwrap();

    if !results_dir_path.exists() {
        fs::create_dir_all(&results_dir_path).unwrap_or_else(|_|
            panic!("Failed to create results directory: {:?}", results_dir_path)
        );
    }

    if !tmp_dir_path.exists() {
        fs::create_dir_all(&tmp_dir_path).unwrap_or_else(|_|
            panic!("Failed to create tmp directory: {:?}", tmp_dir_path)
        );
    }
}

#[allow(dead_code)]
pub fn read_lines(path: &PathBuf) -> Result<Vec<String>, anyhow::Error> {
    let reader = BufReader::new(File::open(path)?);
    let lines = reader.lines().map(|x| x.unwrap()).collect();
    Ok(lines)
}

#[allow(dead_code)]
pub fn temp_file_name(dir: &str) -> PathBuf {
    let mut result = PathBuf::from(dir);
    let name = HEXLOWER.encode(&rand::random::<[u8; 16]>());
    result.push(name);
    result
}

#[allow(dead_code)]
pub fn write_file(path: &PathBuf, content: &str) -> Result<(), anyhow::Error> {
    fs::write(path, content)?;
    Ok(())
}

/// In memory sink that stays readable after a writer took ownership of a clone.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct SharedBuf {
    inner: Arc<Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.inner.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

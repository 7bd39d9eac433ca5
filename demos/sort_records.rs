use std::path::{Path, PathBuf};

use anyhow::Error;
use delimited_sort::field::Field;
use delimited_sort::field_type::FieldType;
use delimited_sort::order::Order;
use delimited_sort::record::Record;
use delimited_sort::sort::ExternalSort;
use delimited_sort::writer::CsvWriter;
use rand::Rng;

fn generate_trips(path: &Path, count: usize) -> Result<(), Error> {
    let routes = ["R1", "R2", "R3", "R4", "R5"];
    let mut rng = rand::thread_rng();
    let mut writer = CsvWriter::create(path, ",");
    for i in 0..count {
        let record = Record::new()
            .with("trip_id", i as i64)
            .with("route_id", routes[rng.gen_range(0..routes.len())])
            .with("departure", rng.gen_range(0..86_400))
            .with("fare", rng.gen_range(1.0..25.0));
        writer.write_record(&record)?;
    }
    writer.close()
}

fn sort_by_route(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    let mut external_sort = ExternalSort::new();
    external_sort.with_tmp_dir(PathBuf::from("./target/tmp/"));
    external_sort.with_buffer(10_000);
    external_sort.add_field(Field::string("route_id"));
    external_sort.add_field(Field::new("departure", FieldType::Integer));
    external_sort.sort_file(input_path, output_path)?;
    if let Some(tmp_dir) = external_sort.tmp_dir() {
        std::fs::remove_dir_all(tmp_dir)?;
    }
    Ok(())
}

fn sort_by_fare_descending(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    let mut external_sort = ExternalSort::new();
    external_sort.with_tmp_dir(PathBuf::from("./target/tmp/"));
    external_sort.with_buffer(10_000);
    external_sort.add_field(Field::new("fare", FieldType::Number));
    external_sort.with_order(Order::Desc);
    external_sort.sort_file(input_path, output_path)?;
    let sorted = external_sort.check(output_path)?;
    log::info!("{} sorted: {}", output_path.display(), sorted);
    if let Some(tmp_dir) = external_sort.tmp_dir() {
        std::fs::remove_dir_all(tmp_dir)?;
    }
    Ok(())
}

// cargo run -r --example sort_records
pub fn main() -> Result<(), Error> {
    simple_logger::init_with_level(log::Level::Info)?;
    let trips_path = PathBuf::from("./target/trips-100000.csv");
    let by_route_path = PathBuf::from("./target/trips-by-route.csv");
    let by_fare_path = PathBuf::from("./target/trips-by-fare.csv");

    generate_trips(&trips_path, 100_000)?;
    sort_by_route(&trips_path, &by_route_path)?;
    sort_by_fare_descending(&trips_path, &by_fare_path)?;

    Ok(())
}

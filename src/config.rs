use std::path::PathBuf;

use crate::field::Field;
use crate::order::Order;

/// Settings shared by the merge tasks of one sort.
#[derive(Clone)]
pub(crate) struct Config {
    run_dir: PathBuf,
    tasks: usize,
    queue_size: usize,
    separator: String,
    fields: Vec<Field>,
    order: Order,
    remove_merged: bool,
}

impl Config {
    pub(crate) fn new(
        run_dir: PathBuf,
        tasks: usize,
        separator: String,
        fields: Vec<Field>,
        order: Order,
        remove_merged: bool,
    ) -> Config {
        let queue_size = 4096;
        Config {
            run_dir,
            tasks,
            queue_size,
            separator,
            fields,
            order,
            remove_merged,
        }
    }

    pub(crate) fn run_dir(&self) -> &PathBuf {
        &self.run_dir
    }

    pub(crate) fn tasks(&self) -> usize {
        self.tasks
    }

    pub(crate) fn queue_size(&self) -> usize {
        self.queue_size
    }

    pub(crate) fn separator(&self) -> &str {
        &self.separator
    }

    pub(crate) fn fields(&self) -> &Vec<Field> {
        &self.fields
    }

    pub(crate) fn order(&self) -> Order {
        self.order
    }

    pub(crate) fn remove_merged(&self) -> bool {
        self.remove_merged
    }
}

mod actions;
mod batch;
mod failures;
mod mock;
mod objects;
mod service;
mod simple;
mod transactions;

pub use mock::*;
pub use service::*;

use crate::{actions::actions, failures::failures, objects::objects, simple::simple};
#[cfg(not(feature = "disable-batch"))]
use batch::batch;
use dbwrap::{Database, Driver};
#[cfg(not(feature = "disable-transactions"))]
use transactions::transactions;
use log::LevelFilter;
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the driver conformance tests against `database`, which must point to an empty,
/// writable database.
pub async fn execute_tests<D: Driver>(database: Database<D>) {
    simple(&database).await;
    #[cfg(not(feature = "disable-batch"))]
    batch(&database).await;
    objects(&database).await;
    actions(&database).await;
    failures(&database).await;
    #[cfg(not(feature = "disable-transactions"))]
    transactions(&database).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        let result = { $($code)+ };
        log::set_max_level(level);
        result
    }};
}

pub(crate) mod executor;
pub(crate) mod worker;

pub(crate) use executor::JobExecutor;
pub(crate) use worker::Worker;

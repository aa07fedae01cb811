pub mod config;
pub mod logging;

pub mod control;
pub mod invoker;
pub mod manual;
pub mod preflight;
pub mod record;
pub mod retry;
pub mod scheduler;
pub mod stats;
pub mod storage;

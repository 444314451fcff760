#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunk;
pub mod config;
pub mod error;
pub mod ingest;
pub mod traits;
pub mod types;

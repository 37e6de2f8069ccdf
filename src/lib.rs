// Library for tests to access modules

pub mod aggregator;
pub mod client;
pub mod config;
pub mod counter;
pub mod docker_repo;
pub mod error;
pub mod host;
pub mod models;
pub mod routes;
pub mod translate;

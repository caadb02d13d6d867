pub mod aws;
pub mod catalog;
pub mod db;
pub mod queue;

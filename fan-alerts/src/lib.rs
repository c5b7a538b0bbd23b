pub mod processor;
pub mod report;

pub mod campaign;
pub mod report;

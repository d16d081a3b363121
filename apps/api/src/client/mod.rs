pub mod api;
pub mod flow;
pub mod questions;
pub mod report;
pub mod terminal;

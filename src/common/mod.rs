pub mod elevation;
pub mod paths;
pub mod shell;

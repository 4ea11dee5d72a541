pub mod model;
pub mod scheduler;

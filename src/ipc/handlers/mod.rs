pub mod attendance;
pub mod backup;
pub mod classes;
pub mod core;
pub mod entries;
pub mod keys;
pub mod students;

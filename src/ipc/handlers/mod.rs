pub mod core;
pub mod imports;
pub mod students;
pub mod uploads;

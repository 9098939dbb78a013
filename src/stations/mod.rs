pub mod directory;
pub mod error;
pub mod locate_station;

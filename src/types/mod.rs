pub mod field;
pub mod schema;
pub mod selection;
pub mod station;
pub mod table;
pub mod time_bound;
pub mod variables;

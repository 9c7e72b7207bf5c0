pub mod forecast;
pub mod location;
pub mod range;
pub mod records;

pub mod field;
pub mod incident;
pub mod prediction;
pub mod schema;

pub use field::*;
pub use incident::*;
pub use prediction::*;
pub use schema::*;

mod catalogs;
mod providers;

pub use catalogs::*;
pub use providers::*;

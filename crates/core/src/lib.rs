pub mod catalog;
pub mod config;
pub mod errors;
pub mod reading;

pub use catalog::{EntityResource, LocaleCatalog, LocaleResource};
pub use errors::{FetchError, InterfaceError};
pub use reading::RemoteReading;

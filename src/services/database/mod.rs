mod error;
mod export;
mod logging;

// Backend abstraction and implementations
pub mod drivers;
pub mod mvo;
pub mod traits;

pub use drivers::HandlerFactory;
pub use error::{DbError, Result};
pub use export::{write_csv, write_records};
pub use logging::LogSink;

pub use traits::{
    BackendKind, BoxedHandler, Cell, ConnectionDescriptor, ConnectionRecord, DatabaseHandler,
    QueryResult, Row, Value,
};

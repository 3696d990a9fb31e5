pub mod bulk;
pub mod chunker;
pub mod csv_io;
pub mod identity;
pub mod payload_fix;
pub mod retry;
pub mod runner;
pub mod transport;

pub use crate::domain::model::{CallOutcome, FileSummary, HttpReply, ResultRecord, Row, RunReport};
pub use crate::domain::ports::{FileProcessor, Transport};
pub use crate::utils::error::Result;

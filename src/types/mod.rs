pub mod job;
pub mod response;

pub use job::{JobRecord, UNKNOWN_COMPANY, UNTITLED_JOB};
pub use response::{ContentResponse, DeliveryReceipt};

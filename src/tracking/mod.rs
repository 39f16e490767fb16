pub mod clock;
mod history;
mod snapshot;
pub mod status;

pub use clock::{Clock, SystemClock};
pub use history::{HistoryEvent, ProcessingHistory};
pub use snapshot::{ResultRecord, ResultsSnapshot, StatusCounts};
pub use status::OutcomeStatus;

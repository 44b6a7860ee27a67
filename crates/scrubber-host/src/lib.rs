// Local stand-ins for the browser capabilities scrubber runs against

mod alarms;
mod data_dir;
mod error;
mod history;
mod notify;
mod store;

pub use alarms::{AlarmFire, MemoryAlarms, TokioAlarms};
pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use history::{JsonHistory, MemoryHistory};
pub use notify::{ChannelNotifier, TracingNotifier};
pub use store::JsonFileStore;

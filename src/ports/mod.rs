pub mod process;
pub mod working_copy;

pub use process::{ProcessHandle, RestartAction};
pub use working_copy::WorkingCopy;

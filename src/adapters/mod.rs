pub mod git2_working_copy;
pub mod shell_process;

pub use git2_working_copy::Git2WorkingCopy;
pub use shell_process::ShellProcess;

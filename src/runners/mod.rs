// Runners Module
// Step execution: one step, one external process

pub mod shell;

pub use shell::ShellRunner;

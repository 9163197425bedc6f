mod args;

pub use args::{Cli, Command, DoctorArgs, OutputFormat, PlanArgs};

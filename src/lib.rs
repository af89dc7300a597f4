pub mod collaborators;
pub mod config;
pub mod errors;
pub mod oven;
pub mod packet;
pub mod phase;
pub mod report;
pub mod scheduler;
pub mod telemetry;
pub mod util;
pub mod validator;

//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled       |
//! |------------|------------------------|
//! | `plan`     | `Plan`, `Classify`     |
//! | `validate` | `Validate`             |
//! | `config`   | `Config`               |
//! | `report`   | `Report`               |

pub mod config;
pub mod plan;
pub mod report;
pub mod validate;

pub use config::{CliOverrides, cmd_config};
pub use plan::{cmd_classify, cmd_plan};
pub use report::cmd_report;
pub use validate::cmd_validate;

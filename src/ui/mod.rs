//! Terminal output for the commands that talk to a person
//!
//! On a terminal this draws with `cliclack` and `indicatif`; in pipes and CI
//! it falls back to plain `[OK]`/`[WARN]` lines. The shell-startup path
//! (`dotpulse --quiet`) never goes through here.

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, outro_warn, remark, step_error_detail, step_info, step_ok,
    step_warn,
};
pub use progress::{TaskSpinner, UpgradeProgress};
pub use prompts::confirm;
pub use theme::{init_theme, DotpulseTheme};

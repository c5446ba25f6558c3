//! Browser driver facade (component C1): the abstract capability set a
//! browser context must support, plus an in-memory fake backing tests and
//! the demo CLI.

mod driver;
mod error;
mod fake;
mod types;

pub use driver::BrowserDriver;
pub use error::DriverError;
pub use fake::FakeBrowserDriver;
pub use types::{
    is_interactive_role, Action, ActionOutcome, ActionTarget, AxNode, AxTreeOptions, BoundingBox,
    CrashEvent, InteractiveElement, MutationSummary, NormalizedAxTree, PageSignals,
    ScreenshotClip, ScreenshotMode, ScreenshotOptions, ScreenshotResult, ScrollPosition,
    SettleObservation, INTERACTIVE_ROLES, PRUNED_ROLES,
};

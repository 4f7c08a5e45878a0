// Challenge detection, widget wiring, and the single-retry execution flow.

pub mod detect;
pub mod executor;
pub mod widget;

pub use detect::needs_challenge;
pub use executor::execute_with_challenge_retry;
pub use widget::{
    ChallengePrompt, ChallengeResult, ChallengeToken, ChallengeWidget, ChallengeWidgetError,
    PresetTokenWidget,
};

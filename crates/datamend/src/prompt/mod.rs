//! Natural-language analysis prompts.

mod dispatcher;
mod intent;
mod plot;
mod response;

pub use dispatcher::{PromptDispatcher, flag_outliers};
pub use intent::{ACCEPTED_PROMPTS, Intent, OutlierMethod, VariabilityView, classify};
pub use plot::Series;
pub use response::{ImagePayload, PromptResponse};

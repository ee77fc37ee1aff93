//! Hosted provider adapters
//!
//! One trait per role (web search, text completion) with a concrete
//! implementation per vendor.

mod mistral;
mod prompt;
mod tavily;
mod traits;

pub use mistral::Mistral;
pub use prompt::{build_user_prompt, SYSTEM_PROMPT};
pub use tavily::Tavily;
pub use traits::*;

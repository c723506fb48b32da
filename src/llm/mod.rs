pub mod anthropic;
pub mod dalle;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod polling;
pub mod provider;
pub mod replicate;
pub mod selection;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use dalle::DalleProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;
pub use polling::{JobState, PollObservation, PollPolicy, poll_until_terminal};
pub use provider::{ImageProvider, ProviderRegistry, TextProvider};
pub use replicate::ReplicateProvider;
pub use selection::{
    ImageSelection, ProviderAvailability, SelectionReason, TextSelection, TextSelectionInput,
    select_image_model, select_text_provider, select_translation_provider,
};
pub use types::*;

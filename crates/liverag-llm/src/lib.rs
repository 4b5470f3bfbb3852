//! liverag-llm
//!
//! Client for an OpenAI-compatible `chat/completions` endpoint, used as the
//! pipeline's [`Generator`](liverag_core::traits::Generator).
pub mod openai;

pub use openai::OpenAiCompatibleGenerator;

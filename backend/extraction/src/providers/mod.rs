pub mod openai;

pub use openai::OpenAiVisionProvider;

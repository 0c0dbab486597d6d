pub mod anthropic;
pub mod llm;
pub mod openai;
pub mod tryon;

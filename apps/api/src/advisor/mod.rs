// Advisor domain: AI payload shapes and the prompt builder.
// All LLM calls go through gateway → llm_client; nothing here performs I/O.

pub mod models;
pub mod prompts;

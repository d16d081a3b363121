// Advisor flow: explicit flow state, ordering guards, and the AI step handlers.
// All LLM calls go through gateway; handlers never talk to the provider directly.

pub mod handlers;
pub mod state;

// ATS scoring: candidate/job matching with cache-aside persistence.
// All LLM calls go through llm_client via the Matcher trait.

pub mod handlers;
pub mod matcher;
pub mod orchestrator;
pub mod prompts;
pub mod store;
pub mod weights;

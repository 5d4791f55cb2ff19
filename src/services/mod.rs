pub mod llm;
pub mod prompt;
pub mod schema;
pub mod script;
pub mod structured;

//! Plan text → tasks.
//!
//! ```text
//! chunks ─▶ PlanParser::push ─▶ line ─▶ Thought? ─▶ reasoning
//!                                    └▶ Action? ─▶ parse_arguments ─▶ dependencies_for ─▶ Task
//! ```

pub mod args;
pub mod literal;
mod parser;
mod patterns;
mod scan;
mod stream;
mod types;

pub use args::{parse_arguments, references_in, RAW_ARGUMENTS_KEY};
pub use literal::parse_literal;
pub use parser::{PlanParser, MAX_INDEX_STEP};
pub use patterns::reference_regex;
pub use stream::plan_stream;
pub use types::{Task, JOIN_CAPABILITY};

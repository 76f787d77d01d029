//! Rule and flag schema types with serde (de)serialization.
//!
//! Field names follow the JSON contract shared with rule authors:
//! - `DeclarativeRule`: `id, field, condition, value, message, domain?, tags?,
//!   owner?, createdAt?, status, appliesToStatus?`
//! - `CopilotFlag`: `id, entryId, message, status, createdAt, reviewedBy?, reviewedAt?`

mod flag;
mod operator;
mod rule;

pub use flag::*;
pub use operator::*;
pub use rule::*;

#[cfg(test)]
mod tests;

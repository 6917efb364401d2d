pub mod chat_state;

pub use chat_state::*;

pub mod query_token;
pub use query_token::*;

pub mod token_stream;
pub use token_stream::*;

pub mod builder;
pub use builder::*;

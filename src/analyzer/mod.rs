pub mod statement_type;
pub use statement_type::*;

pub mod query_information;
pub use query_information::*;

pub mod info_holder;
pub use info_holder::*;

pub mod introspector;
pub use introspector::*;

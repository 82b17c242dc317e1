// Network attack/defence action layer
// Action descriptors, execution results and the flat / parameterised action-space codecs

pub mod action;
pub mod coverage;
pub mod error;
pub mod flat;
pub mod parameterised;
pub mod result;
pub mod scenario;
pub mod scenarios;
pub mod schema;

pub use action::*;
pub use error::*;
pub use flat::*;
pub use parameterised::*;
pub use result::*;
pub use scenario::*;
pub use schema::*;

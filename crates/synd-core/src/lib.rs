pub mod error;
pub mod ids;
pub mod record;
pub mod traits;
pub mod types;

pub use error::*;
pub use ids::*;
pub use record::*;
pub use traits::*;
pub use types::*;

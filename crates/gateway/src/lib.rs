pub mod logic;
pub mod router;
pub mod upstream;

pub use logic::*;
pub use router::*;
pub use upstream::*;

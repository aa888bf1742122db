// Gateway business logic: validate, normalize, forward, map.

pub mod classify;
pub mod data_url;
pub mod generation;
pub mod history;
pub mod request;
pub mod response;

pub use classify::*;
pub use data_url::*;
pub use generation::*;
pub use history::*;
pub use request::*;
pub use response::*;

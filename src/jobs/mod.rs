pub mod broadcaster_sync;
pub mod http_api;
pub mod token_refresh;

pub use broadcaster_sync::{broadcaster_sync_routine, sync_broadcasters};
pub use http_api::http_api_routine;
pub use token_refresh::token_refresh_routine;

pub mod cli;
pub mod http;
pub mod page;

pub use cli::Cli;
pub use http::{
    get_index, get_records, get_status, get_tokens, router, set_listener, toggle_listener, ApiServer,
    AppState, RecordsResponse, StatusResponse, TokensResponse,
};

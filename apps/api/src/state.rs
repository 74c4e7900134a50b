use partledger_application::LogGridService;
use partledger_core::UserIdentity;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub log_grid_service: LogGridService,
    pub api_token: String,
    pub api_identity: UserIdentity,
}

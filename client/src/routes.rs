//! Screens the client core can direct the shell to.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// First-run splash sequence.
    Onboarding,
    Login,
    LiveMonitoring,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Onboarding => "/splash1",
            Route::Login => "/login",
            Route::LiveMonitoring => "/livemonitoring",
        }
    }
}

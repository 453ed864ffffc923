//! Device push-token provisioning.
//!
//! Walks the device through the permission check once and caches the
//! resulting push token for the lifetime of the provisioner. The outcome is
//! an explicit [`PushTokenState`] so callers can tell "not checked yet" from
//! "denied" and "unsupported".

use crate::errors::ClientResult;
use crate::notifications::RawNotification;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

/// Notification permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Platform notification services the client relies on.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// False on emulators and simulators without push capability.
    fn is_physical_device(&self) -> bool;

    async fn permission_status(&self) -> ClientResult<PermissionStatus>;

    /// Prompts the user; returns the status after the prompt.
    async fn request_permission(&self) -> ClientResult<PermissionStatus>;

    async fn device_push_token(&self) -> ClientResult<String>;

    /// The notification that launched the app from a killed state, if any.
    async fn last_notification_response(&self) -> ClientResult<Option<RawNotification>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "token", rename_all = "snake_case")]
pub enum PushTokenState {
    #[default]
    Unchecked,
    /// No push capability on this device.
    Unsupported,
    /// The user refused; only a trip to system settings changes this.
    Denied,
    Ready(String),
}

impl PushTokenState {
    pub fn token(&self) -> Option<&str> {
        match self {
            PushTokenState::Ready(token) => Some(token),
            _ => None,
        }
    }

    /// Unsupported and denied states never resolve without outside action.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PushTokenState::Unchecked)
    }

    /// Why a login cannot be submitted yet, if it cannot.
    pub fn blocking_reason(&self) -> Option<&'static str> {
        match self {
            PushTokenState::Ready(_) => None,
            PushTokenState::Unchecked => Some("Push notifications are still being set up"),
            PushTokenState::Unsupported => {
                Some("Push notifications require a physical device")
            }
            PushTokenState::Denied => {
                Some("Enable notifications for this app in system settings to sign in")
            }
        }
    }
}

pub struct PushTokenProvisioner<P> {
    platform: P,
    state: PushTokenState,
}

impl<P: PushPlatform> PushTokenProvisioner<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            state: PushTokenState::Unchecked,
        }
    }

    pub fn state(&self) -> &PushTokenState {
        &self.state
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Resolves the push token, doing the platform work at most once.
    ///
    /// A platform failure is logged and leaves the state `Unchecked`, so a
    /// later call tries again.
    pub async fn provision(&mut self) -> &PushTokenState {
        if self.state.is_terminal() {
            return &self.state;
        }

        match self.resolve().await {
            Ok(state) => self.state = state,
            Err(e) => error!("Failed to register for push notifications: {}", e),
        }

        &self.state
    }

    async fn resolve(&self) -> ClientResult<PushTokenState> {
        if !self.platform.is_physical_device() {
            info!("Not a physical device. Push notifications won't work.");
            return Ok(PushTokenState::Unsupported);
        }

        let existing = self.platform.permission_status().await?;
        info!(?existing, "Existing permission status");

        let status = if existing == PermissionStatus::Granted {
            existing
        } else {
            let requested = self.platform.request_permission().await?;
            info!(?requested, "Permission status after request");
            requested
        };

        if status != PermissionStatus::Granted {
            info!("Permission not granted for notifications");
            return Ok(PushTokenState::Denied);
        }

        let token = self.platform.device_push_token().await?;
        Ok(PushTokenState::Ready(token))
    }
}

/// Platform with a fixed, pre-obtained push token.
///
/// Used by the headless binary, where the token comes from the command line.
#[derive(Debug, Clone)]
pub struct StaticPushPlatform {
    token: Option<String>,
}

impl StaticPushPlatform {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl PushPlatform for StaticPushPlatform {
    fn is_physical_device(&self) -> bool {
        self.token.is_some()
    }

    async fn permission_status(&self) -> ClientResult<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    async fn request_permission(&self) -> ClientResult<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    async fn device_push_token(&self) -> ClientResult<String> {
        self.token
            .clone()
            .ok_or_else(|| crate::errors::ClientError::platform("No push token configured"))
    }

    async fn last_notification_response(&self) -> ClientResult<Option<RawNotification>> {
        Ok(None)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::ClientError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scriptable platform that counts calls.
    #[derive(Default)]
    pub(crate) struct FakePlatform {
        pub device: bool,
        pub existing: Option<PermissionStatus>,
        pub after_request: Option<PermissionStatus>,
        pub token_fails: Mutex<bool>,
        pub last_response: Option<RawNotification>,
        pub requests: AtomicUsize,
        pub token_fetches: AtomicUsize,
    }

    impl FakePlatform {
        pub(crate) fn device(existing: PermissionStatus, after_request: PermissionStatus) -> Self {
            Self {
                device: true,
                existing: Some(existing),
                after_request: Some(after_request),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PushPlatform for FakePlatform {
        fn is_physical_device(&self) -> bool {
            self.device
        }

        async fn permission_status(&self) -> ClientResult<PermissionStatus> {
            Ok(self.existing.unwrap_or(PermissionStatus::Undetermined))
        }

        async fn request_permission(&self) -> ClientResult<PermissionStatus> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.after_request.unwrap_or(PermissionStatus::Denied))
        }

        async fn device_push_token(&self) -> ClientResult<String> {
            self.token_fetches.fetch_add(1, Ordering::SeqCst);
            if *self.token_fails.lock().unwrap() {
                return Err(ClientError::platform("push service unreachable"));
            }
            Ok("ExponentPushToken[test]".to_string())
        }

        async fn last_notification_response(&self) -> ClientResult<Option<RawNotification>> {
            Ok(self.last_response.clone())
        }
    }

    #[tokio::test]
    async fn test_emulator_is_unsupported() {
        let mut provisioner = PushTokenProvisioner::new(FakePlatform::default());
        assert_eq!(provisioner.provision().await, &PushTokenState::Unsupported);
        assert_eq!(provisioner.token(), None);
    }

    #[tokio::test]
    async fn test_granted_skips_request_and_caches_token() {
        let platform = FakePlatform::device(PermissionStatus::Granted, PermissionStatus::Denied);
        let mut provisioner = PushTokenProvisioner::new(platform);

        provisioner.provision().await;
        provisioner.provision().await;

        assert_eq!(provisioner.token(), Some("ExponentPushToken[test]"));
        assert_eq!(provisioner.platform().requests.load(Ordering::SeqCst), 0);
        assert_eq!(provisioner.platform().token_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_then_grant() {
        let platform =
            FakePlatform::device(PermissionStatus::Undetermined, PermissionStatus::Granted);
        let mut provisioner = PushTokenProvisioner::new(platform);

        let state = provisioner.provision().await.clone();
        assert_eq!(state, PushTokenState::Ready("ExponentPushToken[test]".to_string()));
        assert_eq!(provisioner.platform().requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_denial_is_terminal() {
        let platform =
            FakePlatform::device(PermissionStatus::Undetermined, PermissionStatus::Denied);
        let mut provisioner = PushTokenProvisioner::new(platform);

        assert_eq!(provisioner.provision().await, &PushTokenState::Denied);
        provisioner.provision().await;

        // Not retried automatically
        assert_eq!(provisioner.platform().requests.load(Ordering::SeqCst), 1);
        assert!(provisioner.state().blocking_reason().is_some());
    }

    #[tokio::test]
    async fn test_token_failure_can_retry() {
        let platform = FakePlatform::device(PermissionStatus::Granted, PermissionStatus::Granted);
        *platform.token_fails.lock().unwrap() = true;
        let mut provisioner = PushTokenProvisioner::new(platform);

        assert_eq!(provisioner.provision().await, &PushTokenState::Unchecked);

        *provisioner.platform().token_fails.lock().unwrap() = false;
        assert!(provisioner.provision().await.token().is_some());
    }

    #[test]
    fn test_blocking_reasons_differ() {
        let unchecked = PushTokenState::Unchecked.blocking_reason();
        let denied = PushTokenState::Denied.blocking_reason();
        let unsupported = PushTokenState::Unsupported.blocking_reason();
        assert_ne!(unchecked, denied);
        assert_ne!(denied, unsupported);
        assert_eq!(PushTokenState::Ready("t".into()).blocking_reason(), None);
    }
}

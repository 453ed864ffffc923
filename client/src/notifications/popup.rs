//! Visibility and content state of the notification popup.

use super::gesture::{DismissResolution, ImageTransform, resolve_dismiss};
use super::payload::{PayloadDecoder, PopupContent, RawNotification};
use crate::push::PushPlatform;
use tracing::{debug, error, info};

/// How a notification reached the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSource {
    /// Delivered while the app was in the foreground.
    Foreground,
    /// The user tapped it in the system tray.
    Tapped,
    /// It launched the app from a killed state.
    LaunchResponse,
}

#[derive(Default)]
pub struct PopupController {
    decoder: PayloadDecoder,
    visible: bool,
    content: Option<PopupContent>,
    source: Option<NotificationSource>,
    transform: ImageTransform,
}

impl PopupController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decoder(decoder: PayloadDecoder) -> Self {
        Self {
            decoder,
            ..Self::default()
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn content(&self) -> Option<&PopupContent> {
        self.content.as_ref()
    }

    pub fn source(&self) -> Option<NotificationSource> {
        self.source
    }

    pub fn transform(&self) -> &ImageTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut ImageTransform {
        &mut self.transform
    }

    /// Decodes `notification` and opens the popup with it, replacing
    /// whatever was showing.
    pub fn show(
        &mut self,
        notification: &RawNotification,
        source: NotificationSource,
    ) -> &PopupContent {
        let content = self.decoder.decode(notification);
        info!(
            ?source,
            images = content.image_urls.len(),
            "Showing notification popup"
        );

        self.visible = true;
        self.source = Some(source);
        self.transform.reset();
        self.content.insert(content)
    }

    /// Opens the popup for the notification that launched the app, if any.
    ///
    /// Returns whether the popup was opened.
    pub async fn check_launch_response<P: PushPlatform + ?Sized>(&mut self, platform: &P) -> bool {
        match platform.last_notification_response().await {
            Ok(Some(notification)) => {
                self.show(&notification, NotificationSource::LaunchResponse);
                true
            }
            Ok(None) => false,
            Err(e) => {
                error!("Failed to read launch notification: {}", e);
                false
            }
        }
    }

    /// Hides the popup and drops its content.
    pub fn close(&mut self) {
        debug!("Closing notification popup");
        self.visible = false;
        self.content = None;
        self.source = None;
        self.transform.reset();
    }

    /// Resolves a released drag on the popup, closing it if committed.
    pub fn release_drag(
        &mut self,
        velocity_y: f64,
        translation_y: f64,
        popup_height: f64,
    ) -> DismissResolution {
        let resolution = resolve_dismiss(velocity_y, translation_y, popup_height);
        if resolution == DismissResolution::Close {
            self.close();
        }
        resolution
    }
}

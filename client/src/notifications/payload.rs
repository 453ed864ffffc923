//! Decoding of delivered push notifications into popup content.
//!
//! Image URLs reach the client in one of two shapes: as an `image_urls`
//! list on the data payload, or inside a `body` field holding JSON text.
//! Decoders are tried in order and the first one that yields a list wins.
//! Nothing here fails; an undecodable payload is a text-only notification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A notification as handed over by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNotification {
    pub title: Option<String>,
    pub body: Option<String>,
    /// Free-form data payload attached by the sender.
    #[serde(default)]
    pub data: Value,
}

/// What the popup shows for one notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopupContent {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image_urls: Vec<String>,
}

impl PopupContent {
    pub fn has_images(&self) -> bool {
        !self.image_urls.is_empty()
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct ImageList {
    image_urls: Vec<String>,
}

/// One way of finding image URLs in a data payload.
pub trait ImageUrlDecoder: Send + Sync {
    /// `None` hands the payload to the next decoder.
    fn decode(&self, data: &Value) -> Option<Vec<String>>;
}

/// `{"image_urls": [...]}` directly on the payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectImageUrls;

impl ImageUrlDecoder for DirectImageUrls {
    fn decode(&self, data: &Value) -> Option<Vec<String>> {
        let urls = data.get("image_urls")?;
        serde_json::from_value::<Vec<String>>(urls.clone()).ok()
    }
}

/// `{"body": "{\"image_urls\": [...]}"}`, JSON text inside a string field.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedBodyJson;

impl ImageUrlDecoder for EmbeddedBodyJson {
    fn decode(&self, data: &Value) -> Option<Vec<String>> {
        let text = data.get("body")?.as_str()?;
        serde_json::from_str::<ImageList>(text)
            .ok()
            .map(|list| list.image_urls)
    }
}

/// Ordered chain of decoders.
pub struct PayloadDecoder {
    decoders: Vec<Box<dyn ImageUrlDecoder>>,
}

impl Default for PayloadDecoder {
    fn default() -> Self {
        Self {
            decoders: vec![Box::new(DirectImageUrls), Box::new(EmbeddedBodyJson)],
        }
    }
}

impl PayloadDecoder {
    pub fn new(decoders: Vec<Box<dyn ImageUrlDecoder>>) -> Self {
        Self { decoders }
    }

    pub fn image_urls(&self, data: &Value) -> Vec<String> {
        self.decoders
            .iter()
            .find_map(|d| d.decode(data))
            .unwrap_or_default()
    }

    pub fn decode(&self, notification: &RawNotification) -> PopupContent {
        PopupContent {
            title: notification.title.clone(),
            body: notification.body.clone(),
            image_urls: self.image_urls(&notification.data),
        }
    }
}

/// Decodes image URLs with the default decoder chain.
pub fn decode_image_urls(data: &Value) -> Vec<String> {
    PayloadDecoder::default().image_urls(data)
}

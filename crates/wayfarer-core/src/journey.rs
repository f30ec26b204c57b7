//! Journey drafts
//!
//! A draft is what the creator screen holds before upload. Building it
//! produces the multipart payload for `POST stories`: photos go through
//! the compositor, videos pass through untouched, and text journeys are
//! rendered onto a solid background.

use bytes::Bytes;
use tracing::debug;

use crate::compositor::{
    parse_hex_color, Compositor, FontSpec, TextOverlay, Transform, MAX_OVERLAY_CHARS,
};
use crate::error::ClientResult;
use crate::transport::UploadPayload;
use crate::types::JourneyKind;
use crate::validation::ValidationErrors;

/// Largest video accepted for upload
pub const MAX_VIDEO_BYTES: usize = 50 * 1024 * 1024;

/// Multipart field carrying the media file
pub const MEDIA_FIELD: &str = "media";

/// Journey under construction
#[derive(Debug, Clone)]
pub enum JourneyDraft {
    Photo {
        /// Encoded source image (JPEG, PNG or WebP)
        image: Bytes,
        transform: Transform,
        overlay: Option<TextOverlay>,
    },
    Video {
        bytes: Bytes,
        mime: String,
    },
    Text {
        content: String,
        /// `#RGB` or `#RRGGBB`, sent to the server as given
        background_color: String,
        font: FontSpec,
    },
}

impl JourneyDraft {
    pub fn photo(image: impl Into<Bytes>) -> Self {
        JourneyDraft::Photo {
            image: image.into(),
            transform: Transform::default(),
            overlay: None,
        }
    }

    pub fn video(bytes: impl Into<Bytes>, mime: impl Into<String>) -> Self {
        JourneyDraft::Video {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    pub fn text(content: impl Into<String>, background_color: impl Into<String>) -> Self {
        JourneyDraft::Text {
            content: content.into(),
            background_color: background_color.into(),
            font: FontSpec::default(),
        }
    }

    pub fn kind(&self) -> JourneyKind {
        match self {
            JourneyDraft::Photo { .. } => JourneyKind::Image,
            JourneyDraft::Video { .. } => JourneyKind::Video,
            JourneyDraft::Text { .. } => JourneyKind::Text,
        }
    }

    /// Field-level problems that would block upload
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match self {
            JourneyDraft::Photo { image, overlay, .. } => {
                if image.is_empty() {
                    errors.add("media", "Choose a photo");
                }
                if let Some(overlay) = overlay {
                    check_text_length(&mut errors, "overlay", &overlay.content);
                }
            }
            JourneyDraft::Video { bytes, mime } => {
                if bytes.is_empty() {
                    errors.add("media", "Choose a video");
                } else if bytes.len() > MAX_VIDEO_BYTES {
                    errors.add("media", "Videos are limited to 50 MB");
                }
                if !mime.starts_with("video/") {
                    errors.add("media", "Unsupported video format");
                }
            }
            JourneyDraft::Text {
                content,
                background_color,
                ..
            } => {
                if content.trim().is_empty() {
                    errors.add("textContent", "Write something");
                }
                check_text_length(&mut errors, "textContent", content);
                if parse_hex_color(background_color).is_err() {
                    errors.add("backgroundColor", "Pick a valid color");
                }
            }
        }
        errors
    }

    /// Validate, render if needed, and build the upload payload
    pub fn into_payload(self, compositor: &Compositor) -> ClientResult<UploadPayload> {
        self.validate().into_result()?;
        let kind = self.kind();
        let payload = UploadPayload::new().field("type", kind.as_str());

        let payload = match self {
            JourneyDraft::Photo {
                image,
                transform,
                overlay,
            } => {
                let output = compositor.compose_bytes(&image, transform, overlay.as_ref())?;
                payload.file(MEDIA_FIELD, "journey.jpg", "image/jpeg", output.jpeg)
            }
            JourneyDraft::Video { bytes, mime } => {
                let file_name = format!("journey.{}", video_extension(&mime));
                payload.file(MEDIA_FIELD, &file_name, &mime, bytes)
            }
            JourneyDraft::Text {
                content,
                background_color,
                font,
            } => {
                let preview = compositor.preview();
                let center = (preview.width as f32 / 2.0, preview.height as f32 / 2.0);
                let overlay = TextOverlay::new(content.clone(), font, center);
                let output =
                    compositor.render_text_card(parse_hex_color(&background_color)?, &overlay)?;
                payload
                    .field("textContent", content)
                    .field("backgroundColor", background_color.trim())
                    .file(MEDIA_FIELD, "journey.jpg", "image/jpeg", output.jpeg)
            }
        };

        debug!(kind = kind.as_str(), parts = payload.parts().len(), "Built journey payload");
        Ok(payload)
    }
}

fn check_text_length(errors: &mut ValidationErrors, field: &str, text: &str) {
    if text.chars().count() > MAX_OVERLAY_CHARS {
        errors.add(
            field,
            format!("Text is limited to {} characters", MAX_OVERLAY_CHARS),
        );
    }
}

fn video_extension(mime: &str) -> &str {
    match mime {
        "video/quicktime" => "mov",
        "video/x-msvideo" => "avi",
        other => other
            .strip_prefix("video/")
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("mp4"),
    }
}

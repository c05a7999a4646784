//! Screenshot handling for questions that arrive with a base64 image.
//!
//! The image is decoded, its format sniffed from magic bytes and then handed to
//! the vision profile for a one-line description. Nothing here fails: every
//! problem degrades to a fixed description string.

use std::{future::Future, pin::Pin};

use ai_llm_service::{AiLlmError, LlmServiceProfiles};
use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use tracing::{info, warn};

const VISION_PROMPT: &str = "What does this screenshot show? Is it related to programming, \
data science, or course questions? Provide a brief description.";

pub const UNPROCESSABLE_IMAGE: &str = "Image uploaded but could not be processed";

/// Appended to image questions that mention "gpt".
pub const MODEL_SELECTION_HINT: &str = " [Image shows question about model selection]";

/// Accepts input with or without `=` padding.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub type DescribeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// Vision seam: describe the image at `image_url`.
pub trait ImageDescriber: Send + Sync {
    fn describe<'a>(&'a self, prompt: &'a str, image_url: &'a str) -> DescribeFuture<'a>;
}

impl ImageDescriber for LlmServiceProfiles {
    fn describe<'a>(&'a self, prompt: &'a str, image_url: &'a str) -> DescribeFuture<'a> {
        Box::pin(self.describe_image(prompt, image_url))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn mime_subtype(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageInfo {
    fn dims(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{w}x{h}"),
            _ => "unknown size".to_string(),
        }
    }
}

/// Removes an optional `data:image/<fmt>;base64,` prefix.
pub fn strip_data_url_prefix(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("data:image/") else {
        return raw;
    };
    let fmt_len = rest.bytes().take_while(|b| b.is_ascii_lowercase()).count();
    if fmt_len == 0 {
        return raw;
    }
    rest[fmt_len..].strip_prefix(";base64,").unwrap_or(raw)
}

/// Format and, for PNG and GIF, pixel dimensions read from the header.
pub fn sniff(bytes: &[u8]) -> Option<ImageInfo> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        let (width, height) = match bytes.get(16..24) {
            Some(h) => (
                Some(u32::from_be_bytes([h[0], h[1], h[2], h[3]])),
                Some(u32::from_be_bytes([h[4], h[5], h[6], h[7]])),
            ),
            None => (None, None),
        };
        return Some(ImageInfo { format: ImageFormat::Png, width, height });
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        let (width, height) = match bytes.get(6..10) {
            Some(h) => (
                Some(u16::from_le_bytes([h[0], h[1]]) as u32),
                Some(u16::from_le_bytes([h[2], h[3]]) as u32),
            ),
            None => (None, None),
        };
        return Some(ImageInfo { format: ImageFormat::Gif, width, height });
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageInfo { format: ImageFormat::Jpeg, width: None, height: None });
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(ImageInfo { format: ImageFormat::Webp, width: None, height: None });
    }
    None
}

/// Decodes `raw` (plain base64 or a data URL) and sniffs the image.
pub fn decode_image(raw: &str) -> Option<(String, ImageInfo)> {
    let b64: String = strip_data_url_prefix(raw.trim())
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = LENIENT_STANDARD.decode(b64.as_bytes()).ok()?;
    let info = sniff(&bytes)?;
    Some((b64, info))
}

/// Produces a short description of the uploaded screenshot.
pub async fn describe_image(vision: Option<&dyn ImageDescriber>, raw: &str) -> String {
    let Some((b64, info)) = decode_image(raw) else {
        warn!(len = raw.len(), "Error processing image");
        return UNPROCESSABLE_IMAGE.to_string();
    };
    info!(format = info.format.mime_subtype(), size = %info.dims(), "Image processed");

    let fallback = format!("Screenshot shows question about model selection ({})", info.dims());
    let Some(vision) = vision else {
        return fallback;
    };

    let url = format!("data:image/{};base64,{b64}", info.format.mime_subtype());
    match vision.describe(VISION_PROMPT, &url).await {
        Ok(text) if text.trim().is_empty() => {
            "Screenshot analyzed: Image content could not be analyzed".to_string()
        }
        Ok(text) => format!("Screenshot analyzed: {}", text.trim()),
        Err(e) => {
            warn!(error = %e, "Vision API not available, using fallback description");
            fallback
        }
    }
}

/// Question actually sent to the answerer when an image accompanies it.
pub fn rewrite_question(question: &str) -> String {
    if question.to_lowercase().contains("gpt") {
        format!("{question}{MODEL_SELECTION_HINT}")
    } else {
        question.to_string()
    }
}

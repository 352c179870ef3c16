use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1024x1024")]
    Square,
    #[serde(rename = "1792x1024")]
    Landscape,
    #[serde(rename = "1024x1792")]
    Portrait,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Landscape => "1792x1024",
            ImageSize::Portrait => "1024x1792",
        }
    }

    /// Flag token that selects this size, e.g. `--portrait`.
    pub fn from_flag(token: &str) -> Option<Self> {
        match token {
            "--square" => Some(ImageSize::Square),
            "--landscape" => Some(ImageSize::Landscape),
            "--portrait" => Some(ImageSize::Portrait),
            _ => None,
        }
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1024x1024" => Ok(ImageSize::Square),
            "1792x1024" => Ok(ImageSize::Landscape),
            "1024x1792" => Ok(ImageSize::Portrait),
            other => Err(format!("unsupported image size '{}'", other)),
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    Vivid,
    Natural,
}

impl ImageStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStyle::Vivid => "vivid",
            ImageStyle::Natural => "natural",
        }
    }

    pub fn from_flag(token: &str) -> Option<Self> {
        match token {
            "--vivid" => Some(ImageStyle::Vivid),
            "--natural" => Some(ImageStyle::Natural),
            _ => None,
        }
    }
}

impl FromStr for ImageStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vivid" => Ok(ImageStyle::Vivid),
            "natural" => Ok(ImageStyle::Natural),
            other => Err(format!("unsupported image style '{}'", other)),
        }
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Hd,
    Standard,
}

impl ImageQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Hd => "hd",
            ImageQuality::Standard => "standard",
        }
    }

    pub fn from_flag(token: &str) -> Option<Self> {
        match token {
            "--hd" => Some(ImageQuality::Hd),
            "--standard" => Some(ImageQuality::Standard),
            _ => None,
        }
    }
}

impl FromStr for ImageQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hd" => Ok(ImageQuality::Hd),
            "standard" => Ok(ImageQuality::Standard),
            other => Err(format!("unsupported image quality '{}'", other)),
        }
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field fallbacks used when a message carries no flag for that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDefaults {
    pub size: ImageSize,
    pub style: ImageStyle,
    pub quality: ImageQuality,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        ImageDefaults {
            size: ImageSize::Square,
            style: ImageStyle::Vivid,
            quality: ImageQuality::Hd,
        }
    }
}

/// A parsed user request. Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    size: ImageSize,
    style: ImageStyle,
    quality: ImageQuality,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        size: ImageSize,
        style: ImageStyle,
        quality: ImageQuality,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            size,
            style,
            quality,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    pub fn style(&self) -> ImageStyle {
        self.style
    }

    pub fn quality(&self) -> ImageQuality {
        self.quality
    }
}

/// Images always come back inline; the bridge never fetches hosted URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageResponseFormat {
    B64Json,
}

/// Body of an OpenAI `images/generations` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGenerationPayload {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: ImageSize,
    pub quality: ImageQuality,
    pub style: ImageStyle,
    pub response_format: ImageResponseFormat,
}

impl ImageGenerationPayload {
    pub fn from_request(request: &GenerationRequest, model: &str, n: u32) -> Self {
        Self {
            model: model.to_string(),
            prompt: request.prompt().to_string(),
            n,
            size: request.size(),
            quality: request.quality(),
            style: request.style(),
            response_format: ImageResponseFormat::B64Json,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub data: Vec<ImageData>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImageData {
    #[serde(default)]
    pub b64_json: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

impl ImageResponse {
    /// Base64 payload of the first result, if the provider sent one.
    pub fn first_b64(&self) -> Option<&str> {
        self.data
            .first()
            .and_then(|d| d.b64_json.as_deref())
            .filter(|b64| !b64.is_empty())
    }
}

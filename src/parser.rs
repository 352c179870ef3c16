//! Turns free-form chat text into a [`GenerationRequest`].
//!
//! Parsing never fails: anything that is not a recognised flag becomes part
//! of the prompt, in its original order.

use crate::models::{GenerationRequest, ImageDefaults, ImageQuality, ImageSize, ImageStyle};

const MENTION_MARKER: char = '>';
const EM_DASH: &str = "\u{2014}";
/// An em dash that went through a UTF-8 -> Latin-1 round trip.
const MANGLED_EM_DASH: &str = "\u{e2}\u{20ac}\u{201d}";

#[derive(Debug, Clone, Copy)]
pub struct RequestParser {
    defaults: ImageDefaults,
}

impl RequestParser {
    pub fn new(defaults: ImageDefaults) -> Self {
        Self { defaults }
    }

    pub fn parse(&self, raw_text: &str) -> GenerationRequest {
        parse(raw_text, self.defaults)
    }
}

pub fn parse(raw_text: &str, defaults: ImageDefaults) -> GenerationRequest {
    let normalized = raw_text
        .replace(MANGLED_EM_DASH, "--")
        .replace(EM_DASH, "--");

    let body = match normalized.split_once(MENTION_MARKER) {
        Some((_, after)) => after,
        None => normalized.as_str(),
    };

    let mut size = defaults.size;
    let mut style = defaults.style;
    let mut quality = defaults.quality;
    let mut prompt_parts: Vec<&str> = Vec::new();

    for token in body.split_whitespace() {
        if let Some(s) = ImageSize::from_flag(token) {
            size = s;
        } else if let Some(s) = ImageStyle::from_flag(token) {
            style = s;
        } else if let Some(q) = ImageQuality::from_flag(token) {
            quality = q;
        } else {
            prompt_parts.push(token);
        }
    }

    GenerationRequest::new(prompt_parts.join(" "), size, style, quality)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ImageDefaults {
        ImageDefaults::default()
    }

    #[test]
    fn test_mention_prefix_is_stripped() {
        let request = parse("<@U123BOT> a cat --portrait", defaults());
        assert_eq!(request.prompt(), "a cat");
        assert_eq!(request.size(), ImageSize::Portrait);
        assert_eq!(request.style(), ImageStyle::Vivid);
        assert_eq!(request.quality(), ImageQuality::Hd);
    }

    #[test]
    fn test_only_first_marker_splits() {
        let request = parse("<@U1> draw an arrow -> pointing right", defaults());
        assert_eq!(request.prompt(), "draw an arrow -> pointing right");
    }

    #[test]
    fn test_text_without_marker_is_parsed_whole() {
        let request = parse("sunset over the sea --landscape --natural", defaults());
        assert_eq!(request.prompt(), "sunset over the sea");
        assert_eq!(request.size(), ImageSize::Landscape);
        assert_eq!(request.style(), ImageStyle::Natural);
    }

    #[test]
    fn test_last_flag_wins_per_category() {
        let request = parse("a dog --hd --standard", defaults());
        assert_eq!(request.prompt(), "a dog");
        assert_eq!(request.quality(), ImageQuality::Standard);

        let request = parse("--portrait a dog --square", defaults());
        assert_eq!(request.size(), ImageSize::Square);
        assert_eq!(request.prompt(), "a dog");
    }

    #[test]
    fn test_unknown_flags_stay_in_prompt() {
        let request = parse("draw --foo a fox", defaults());
        assert_eq!(request.prompt(), "draw --foo a fox");
        assert_eq!(request.size(), ImageSize::Square);
    }

    #[test]
    fn test_em_dash_normalized() {
        let request = parse("<@U1> a fox \u{2014}portrait", defaults());
        assert_eq!(request.size(), ImageSize::Portrait);
        assert_eq!(request.prompt(), "a fox");

        let mangled = format!("a fox {}natural", MANGLED_EM_DASH);
        let request = parse(&mangled, defaults());
        assert_eq!(request.style(), ImageStyle::Natural);
        assert_eq!(request.prompt(), "a fox");
    }

    #[test]
    fn test_flags_only_gives_empty_prompt() {
        let request = parse("<@U1> --landscape --hd", defaults());
        assert_eq!(request.prompt(), "");
        assert_eq!(request.size(), ImageSize::Landscape);
    }

    #[test]
    fn test_configured_defaults_used() {
        let parser = RequestParser::new(ImageDefaults {
            size: ImageSize::Landscape,
            style: ImageStyle::Natural,
            quality: ImageQuality::Standard,
        });
        let request = parser.parse("a  quiet   harbor");
        assert_eq!(request.prompt(), "a quiet harbor");
        assert_eq!(request.size(), ImageSize::Landscape);
        assert_eq!(request.style(), ImageStyle::Natural);
        assert_eq!(request.quality(), ImageQuality::Standard);
    }
}

//! Partial attribute updates for elements.

use serde::{Deserialize, Deserializer, Serialize};

use super::{
    Element, ElementContent, FontStyle, ImageAttributes, SquareAttributes, TextAlign,
    TextAttributes, VideoAttributes,
};
use crate::color::HexColor;

/// Sets a field when the patch carries a value for it.
fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

/// Reads a field that is present (even as `null`) as `Some`, so a
/// missing field and an explicit `null` stay distinct.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextPatch {
    pub content: Option<String>,
    pub font_family: Option<String>,
    pub font_fallback: Option<Vec<String>>,
    pub font_weight: Option<u16>,
    pub font_size: Option<f32>,
    pub font_style: Option<FontStyle>,
    pub color: Option<HexColor>,
    pub background_color: Option<HexColor>,
    pub letter_spacing: Option<String>,
    pub line_height: Option<f32>,
    pub text_align: Option<TextAlign>,
}

impl TextPatch {
    fn apply(&self, attrs: &mut TextAttributes) {
        merge(&mut attrs.content, &self.content);
        merge(&mut attrs.font_family, &self.font_family);
        merge(&mut attrs.font_fallback, &self.font_fallback);
        merge(&mut attrs.font_weight, &self.font_weight);
        merge(&mut attrs.font_size, &self.font_size);
        merge(&mut attrs.font_style, &self.font_style);
        merge(&mut attrs.color, &self.color);
        merge(&mut attrs.background_color, &self.background_color);
        merge(&mut attrs.letter_spacing, &self.letter_spacing);
        merge(&mut attrs.line_height, &self.line_height);
        merge(&mut attrs.text_align, &self.text_align);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePatch {
    pub src: Option<String>,
    pub alt: Option<String>,
}

impl ImagePatch {
    fn apply(&self, attrs: &mut ImageAttributes) {
        merge(&mut attrs.src, &self.src);
        merge(&mut attrs.alt, &self.alt);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoPatch {
    pub src: Option<String>,
    /// `Some(None)` removes the poster; in JSON that is `"poster": null`.
    #[serde(
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub poster: Option<Option<String>>,
    #[serde(rename = "loop")]
    pub loop_playback: Option<bool>,
}

impl VideoPatch {
    fn apply(&self, attrs: &mut VideoAttributes) {
        merge(&mut attrs.src, &self.src);
        merge(&mut attrs.poster, &self.poster);
        merge(&mut attrs.loop_playback, &self.loop_playback);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SquarePatch {
    pub background_color: Option<HexColor>,
}

impl SquarePatch {
    fn apply(&self, attrs: &mut SquareAttributes) {
        merge(&mut attrs.background_color, &self.background_color);
    }
}

/// Type-specific half of an [`ElementPatch`], tagged like [`ElementContent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPatch {
    Text(TextPatch),
    Image(ImagePatch),
    Square(SquarePatch),
    Video(VideoPatch),
}

impl ContentPatch {
    /// Applies to matching content only; a text patch leaves a square untouched.
    fn apply(&self, content: &mut ElementContent) {
        match (self, content) {
            (Self::Text(p), ElementContent::Text(attrs)) => p.apply(attrs),
            (Self::Image(p), ElementContent::Image(attrs)) => p.apply(attrs),
            (Self::Square(p), ElementContent::Square(attrs)) => p.apply(attrs),
            (Self::Video(p), ElementContent::Video(attrs)) => p.apply(attrs),
            _ => {}
        }
    }
}

/// A shallow merge into an element's attributes.
///
/// Absent fields are left as they are. A patch can never change an
/// element's id or type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation_angle: Option<f32>,
    pub is_fullbleed: Option<bool>,
    pub content: Option<ContentPatch>,
}

impl ElementPatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn rotation(angle: f32) -> Self {
        Self {
            rotation_angle: Some(angle),
            ..Self::default()
        }
    }

    pub fn fullbleed(is_fullbleed: bool) -> Self {
        Self {
            is_fullbleed: Some(is_fullbleed),
            ..Self::default()
        }
    }

    pub fn text(patch: TextPatch) -> Self {
        Self {
            content: Some(ContentPatch::Text(patch)),
            ..Self::default()
        }
    }

    pub fn square(patch: SquarePatch) -> Self {
        Self {
            content: Some(ContentPatch::Square(patch)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges this patch into `element`.
    pub fn apply(&self, element: &mut Element) {
        let frame = &mut element.frame;
        merge(&mut frame.x, &self.x);
        merge(&mut frame.y, &self.y);
        merge(&mut frame.width, &self.width);
        merge(&mut frame.height, &self.height);
        merge(&mut frame.rotation_angle, &self.rotation_angle);
        merge(&mut frame.is_fullbleed, &self.is_fullbleed);
        if let Some(content) = &self.content {
            content.apply(&mut element.content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementType, Frame};

    #[test]
    fn test_video_poster_null_removes_poster() {
        let patch: VideoPatch = serde_json::from_str(r#"{"poster": null}"#).unwrap();
        assert_eq!(patch.poster, Some(None));

        let patch: VideoPatch = serde_json::from_str(r#"{"src": "clip.mp4"}"#).unwrap();
        assert_eq!(patch.poster, None);

        let removal = VideoPatch {
            poster: Some(None),
            ..VideoPatch::default()
        };
        let json = serde_json::to_string(&removal).unwrap();
        let read_back: VideoPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(read_back, removal);

        let untouched = serde_json::to_value(VideoPatch::default()).unwrap();
        assert!(untouched.get("poster").is_none());
    }

    #[test]
    fn test_video_poster_removal_applies_through_element_patch() {
        let mut attrs = VideoAttributes {
            poster: Some("still.png".into()),
            ..VideoAttributes::default()
        };
        let patch: ContentPatch =
            serde_json::from_str(r#"{"type": "video", "poster": null}"#).unwrap();
        let ContentPatch::Video(video) = patch else {
            panic!("expected a video patch");
        };
        video.apply(&mut attrs);
        assert_eq!(attrs.poster, None);
    }

    #[test]
    fn test_frame_fields_merge() {
        let mut element = Element::square("a").with_frame(Frame {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
            ..Frame::default()
        });
        ElementPatch::position(10.0, 20.0).apply(&mut element);
        assert_eq!(
            element.frame,
            Frame {
                x: 10.0,
                y: 20.0,
                width: 3.0,
                height: 4.0,
                ..Frame::default()
            }
        );
    }

    #[test]
    fn test_content_patch_merges_matching_type() {
        let mut element = Element::text("t", "Hello");
        ElementPatch::text(TextPatch {
            font_size: Some(32.0),
            color: Some(HexColor::rgb(255, 0, 0)),
            ..TextPatch::default()
        })
        .apply(&mut element);

        let ElementContent::Text(text) = &element.content else {
            panic!("expected text content");
        };
        assert_eq!(text.content, "Hello");
        assert!((text.font_size - 32.0).abs() < f32::EPSILON);
        assert_eq!(text.color, HexColor::rgb(255, 0, 0));
        assert_eq!(text.font_family, "Arial");
    }

    #[test]
    fn test_mismatched_content_patch_is_ignored() {
        let mut element = Element::square("s");
        let before = element.clone();
        ElementPatch::text(TextPatch {
            content: Some("nope".to_string()),
            ..TextPatch::default()
        })
        .apply(&mut element);
        assert_eq!(element, before);
        assert_eq!(element.element_type(), ElementType::Square);
    }

    #[test]
    fn test_video_poster_can_be_removed() {
        let mut element = Element::new(
            "v",
            ElementContent::Video(VideoAttributes {
                src: "a.mp4".to_string(),
                poster: Some("a.jpg".to_string()),
                loop_playback: false,
            }),
        );
        let patch = ElementPatch {
            content: Some(ContentPatch::Video(VideoPatch {
                poster: Some(None),
                ..VideoPatch::default()
            })),
            ..ElementPatch::default()
        };
        patch.apply(&mut element);
        let ElementContent::Video(video) = &element.content else {
            panic!("expected video content");
        };
        assert_eq!(video.poster, None);
        assert_eq!(video.src, "a.mp4");
    }

    #[test]
    fn test_patch_from_json() {
        let json = r##"{"rotationAngle": 45, "content": {"type": "square", "backgroundColor": "#00ff00"}}"##;
        let patch: ElementPatch = serde_json::from_str(json).unwrap();
        assert_eq!(patch.rotation_angle, Some(45.0));
        assert_eq!(
            patch.content,
            Some(ContentPatch::Square(SquarePatch {
                background_color: Some(HexColor::rgb(0, 255, 0)),
            }))
        );
        assert!(!patch.is_empty());
        assert!(ElementPatch::default().is_empty());
    }
}

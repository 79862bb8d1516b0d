use serde::{Deserialize, Serialize};

/// Paper size. Serialised as `"A4"` / `"Letter"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageFormat {
    #[default]
    #[serde(alias = "a4")]
    A4,
    #[serde(alias = "letter")]
    Letter,
}

impl PageFormat {
    /// (width, height) in inches.
    pub fn size_inches(self) -> (f32, f32) {
        match self {
            PageFormat::A4 => (8.27, 11.69),
            PageFormat::Letter => (8.5, 11.0),
        }
    }

    pub fn css_name(self) -> &'static str {
        match self {
            PageFormat::A4 => "A4",
            PageFormat::Letter => "letter",
        }
    }
}

/// Page margins in inches. Omitted sides keep their default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 0.4,
            right: 0.55,
            bottom: 0.4,
            left: 0.55,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageConfig {
    pub format: PageFormat,
    pub margins: Margins,
}

impl PageConfig {
    #[cfg(test)]
    pub fn for_format(format: PageFormat) -> Self {
        Self {
            format,
            margins: Margins::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_format_accepts_either_case() {
        let upper: PageFormat = serde_json::from_str(r#""Letter""#).unwrap();
        let lower: PageFormat = serde_json::from_str(r#""a4""#).unwrap();
        assert_eq!(upper, PageFormat::Letter);
        assert_eq!(lower, PageFormat::A4);
    }

    #[test]
    fn test_partial_margins_keep_defaults_for_missing_sides() {
        let margins: Margins = serde_json::from_str(r#"{"top": 1.0, "left": 0.25}"#).unwrap();
        assert_eq!(margins.top, 1.0);
        assert_eq!(margins.left, 0.25);
        assert_eq!(margins.right, 0.55);
        assert_eq!(margins.bottom, 0.4);
    }

    #[test]
    fn test_letter_is_wider_and_shorter_than_a4() {
        let (aw, ah) = PageFormat::A4.size_inches();
        let (lw, lh) = PageFormat::Letter.size_inches();
        assert!(lw > aw);
        assert!(lh < ah);
    }
}

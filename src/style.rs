//! Text styling model: content, size, font family, fill color and shadow.
//!
//! Hosts mutate a [`TextStyleSpec`] through the session; everything here is
//! plain data with validation at the boundary, so the render path can assume
//! in-range values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{UnderlayError, UnderlayResult};

/// Smallest accepted font size in pixels.
pub const FONT_SIZE_MIN_PX: u32 = 1;
/// Largest accepted font size in pixels.
pub const FONT_SIZE_MAX_PX: u32 = 200;
/// Largest accepted shadow blur radius in pixels.
pub const SHADOW_BLUR_MAX_PX: u32 = 20;
/// Largest accepted shadow offset magnitude in pixels, per axis.
pub const SHADOW_OFFSET_MAX_PX: i32 = 20;

/// The closed set of font families offered to hosts.
///
/// Families resolve against the session's [`FontCatalog`]; a family with no
/// usable face falls back at render time instead of failing.
///
/// [`FontCatalog`]: crate::fonts::FontCatalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontFamily {
    Roboto,
    OpenSans,
    Lato,
    Montserrat,
    Poppins,
    Oswald,
    SourceSansPro,
    Raleway,
    Ubuntu,
    Merriweather,
}

impl FontFamily {
    /// Every offered family, in display order.
    pub const ALL: [FontFamily; 10] = [
        FontFamily::Roboto,
        FontFamily::OpenSans,
        FontFamily::Lato,
        FontFamily::Montserrat,
        FontFamily::Poppins,
        FontFamily::Oswald,
        FontFamily::SourceSansPro,
        FontFamily::Raleway,
        FontFamily::Ubuntu,
        FontFamily::Merriweather,
    ];

    /// Canonical family name as it appears in font metadata.
    pub fn name(self) -> &'static str {
        match self {
            FontFamily::Roboto => "Roboto",
            FontFamily::OpenSans => "Open Sans",
            FontFamily::Lato => "Lato",
            FontFamily::Montserrat => "Montserrat",
            FontFamily::Poppins => "Poppins",
            FontFamily::Oswald => "Oswald",
            FontFamily::SourceSansPro => "Source Sans Pro",
            FontFamily::Raleway => "Raleway",
            FontFamily::Ubuntu => "Ubuntu",
            FontFamily::Merriweather => "Merriweather",
        }
    }
}

impl Default for FontFamily {
    fn default() -> Self {
        FontFamily::Roboto
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FontFamily {
    type Err = UnderlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn fold(s: &str) -> String {
            s.chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| c.to_ascii_lowercase())
                .collect()
        }

        let wanted = fold(s);
        FontFamily::ALL
            .into_iter()
            .find(|family| fold(family.name()) == wanted)
            .ok_or_else(|| UnderlayError::validation(format!("unknown font family \"{s}\"")))
    }
}

impl Serialize for FontFamily {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for FontFamily {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Straight-alpha RGB color, serialized as `#rrggbb`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (case-insensitive, leading `#` optional).
    pub fn from_hex(s: &str) -> UnderlayResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> UnderlayResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| UnderlayError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        if s.len() != 6 || !s.is_ascii() {
            return Err(UnderlayError::validation(
                "hex color must be #RRGGBB (case-insensitive)",
            ));
        }
        Ok(Self {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
        })
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = UnderlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Shadow parameters, only meaningful while a shadow is attached to a style.
///
/// Detaching the shadow (`TextStyleSpec::shadow = None`) keeps no residue:
/// there is no ambient shadow state anywhere in the render path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowSpec {
    pub color: Rgb,
    pub blur_px: u32,
    pub offset_x_px: i32,
    pub offset_y_px: i32,
}

impl Default for ShadowSpec {
    fn default() -> Self {
        Self {
            color: Rgb::new(0, 0, 0),
            blur_px: 4,
            offset_x_px: 2,
            offset_y_px: 2,
        }
    }
}

impl ShadowSpec {
    pub fn validate(&self) -> UnderlayResult<()> {
        if self.blur_px > SHADOW_BLUR_MAX_PX {
            return Err(UnderlayError::validation(format!(
                "shadow blur_px must be within 0..={SHADOW_BLUR_MAX_PX}"
            )));
        }
        if self.offset_x_px.abs() > SHADOW_OFFSET_MAX_PX
            || self.offset_y_px.abs() > SHADOW_OFFSET_MAX_PX
        {
            return Err(UnderlayError::validation(format!(
                "shadow offsets must be within -{SHADOW_OFFSET_MAX_PX}..={SHADOW_OFFSET_MAX_PX}"
            )));
        }
        Ok(())
    }
}

/// Full description of the text layer.
///
/// `content` is free-form (empty renders nothing); the numeric fields are
/// range-checked by [`validate`](Self::validate).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyleSpec {
    pub content: String,
    pub font_size_px: u32,
    pub font_family: FontFamily,
    pub fill: Rgb,
    pub shadow: Option<ShadowSpec>,
}

impl Default for TextStyleSpec {
    fn default() -> Self {
        Self {
            content: "Your Text Here".to_owned(),
            font_size_px: 48,
            font_family: FontFamily::Roboto,
            fill: Rgb::new(0, 0, 0),
            shadow: None,
        }
    }
}

impl TextStyleSpec {
    pub fn validate(&self) -> UnderlayResult<()> {
        if !(FONT_SIZE_MIN_PX..=FONT_SIZE_MAX_PX).contains(&self.font_size_px) {
            return Err(UnderlayError::validation(format!(
                "font_size_px must be within {FONT_SIZE_MIN_PX}..={FONT_SIZE_MAX_PX}"
            )));
        }
        if let Some(shadow) = &self.shadow {
            shadow.validate()?;
        }
        Ok(())
    }
}

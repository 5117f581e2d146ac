//! Game rendertypes.
//!
//! Materials name the rendertype they replace. Current files store the
//! numeric value, older ones the name.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

macro_rules! rendertypes {
    ($($variant:ident = $value:literal => $name:literal,)+) => {
        /// A rendertype of the game's renderer.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum Rendertype {
            $($variant = $value,)+
        }

        impl Rendertype {
            /// Every rendertype, in numeric order.
            pub const ALL: &'static [Rendertype] = &[$(Self::$variant,)+];

            /// Name as it appears in munged files.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Look up a stored numeric value.
            pub fn from_raw(value: u32) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl FromStr for Rendertype {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Error> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(Error::UnknownRendertype(format!("{s:?}"))),
                }
            }
        }
    };
}

rendertypes! {
    Decal = 0 => "decal",
    Filtercopy = 1 => "filtercopy",
    Flare = 2 => "flare",
    Hdr = 3 => "hdr",
    Interface = 4 => "interface",
    Normal = 5 => "normal",
    Normalmapadder = 6 => "normalmapadder",
    Lightbeam = 7 => "lightbeam",
    Ocean = 8 => "ocean",
    Particle = 9 => "particle",
    Perpixeldiffuselighting = 10 => "perpixeldiffuselighting",
    Prereflection = 11 => "prereflection",
    Rain = 12 => "rain",
    Refraction = 13 => "refraction",
    Sample = 14 => "sample",
    Shadowquad = 15 => "shadowquad",
    Shield = 16 => "shield",
    Skyfog = 17 => "skyfog",
    Specularlighting = 18 => "specularlighting",
    Sprite = 19 => "sprite",
    Stencilshadow = 20 => "stencilshadow",
    Terrain2 = 21 => "Terrain2",
    Water = 22 => "water",
    Zprepass = 23 => "zprepass",
    FixedfuncColorFill = 24 => "fixedfunc_color_fill",
    FixedfuncDamageOverlay = 25 => "fixedfunc_damage_overlay",
    FixedfuncPlainTexture = 26 => "fixedfunc_plain_texture",
    FixedfuncSceneBlur = 27 => "fixedfunc_scene_blur",
    FixedfuncZoomBlur = 28 => "fixedfunc_zoom_blur",
}

impl Rendertype {
    /// Value stored in current material files.
    pub fn to_raw(self) -> u32 {
        self as u32
    }

    /// Decode a stored value, failing on values outside the table.
    pub fn try_from_raw(value: u32) -> Result<Self, Error> {
        Self::from_raw(value).ok_or_else(|| Error::UnknownRendertype(value.to_string()))
    }
}

impl fmt::Display for Rendertype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for Rendertype {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serialize")]
impl<'de> serde::Deserialize<'de> for Rendertype {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for &rendertype in Rendertype::ALL {
            assert_eq!(rendertype.as_str().parse::<Rendertype>().unwrap(), rendertype);
            assert_eq!(Rendertype::from_raw(rendertype.to_raw()), Some(rendertype));
        }
    }

    #[test]
    fn test_values_are_dense() {
        for (i, rendertype) in Rendertype::ALL.iter().enumerate() {
            assert_eq!(rendertype.to_raw(), i as u32);
        }
    }

    #[test]
    fn test_case_sensitive_names() {
        assert_eq!("Terrain2".parse::<Rendertype>().unwrap(), Rendertype::Terrain2);
        assert!("terrain2".parse::<Rendertype>().is_err());
        assert!("Normal".parse::<Rendertype>().is_err());
    }

    #[test]
    fn test_unknown_value() {
        let err = Rendertype::try_from_raw(0x7fff_ffff).unwrap_err();
        assert_eq!(err.to_string(), "2147483647 is not a valid rendertype");
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_serde_as_name() {
        let json = serde_json::to_string(&Rendertype::Interface).unwrap();
        assert_eq!(json, "\"interface\"");
        let parsed: Rendertype = serde_json::from_str("\"water\"").unwrap();
        assert_eq!(parsed, Rendertype::Water);
        assert!(serde_json::from_str::<Rendertype>("\"lava\"").is_err());
    }
}

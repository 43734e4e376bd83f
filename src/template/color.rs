//! Color schemes and their precedence rules.
//!
//! Colors are HSL triples written the way the editor stores them,
//! `"220 87% 56%"` (hue in degrees, saturation and lightness in percent).
//!
//! Precedence, highest first:
//!
//! 1. `scheme == "custom"`: the caller's custom colors, with each missing
//!    channel falling back to [`CUSTOM_DEFAULTS`];
//! 2. any other scheme except `"default"`: a named palette;
//! 3. otherwise `None`, meaning "use the template's own colors".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Template;

/// Scheme name that selects the caller's custom colors.
pub const CUSTOM_SCHEME: &str = "custom";

/// Scheme name that defers to the template.
pub const DEFAULT_SCHEME: &str = "default";

/// Per-channel fallbacks for the custom scheme.
pub const CUSTOM_DEFAULTS: ColorScheme = ColorScheme {
    primary: Hsl::new(220.0, 87.0, 56.0),
    secondary: Hsl::new(220.0, 70.0, 40.0),
    accent: Hsl::new(220.0, 90.0, 70.0),
};

// ============================================================================
// HSL
// ============================================================================

/// An HSL color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    /// CSS functional notation, e.g. `hsl(220 87% 56%)`.
    pub fn to_css(&self) -> String {
        format!("hsl({})", self)
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}% {}%", self.h, self.s, self.l)
    }
}

impl FromStr for Hsl {
    type Err = String;

    /// Accepts `"220 87% 56%"`, with or without an `hsl(...)` wrapper and
    /// with commas or spaces as separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s.trim();
        let inner = inner
            .strip_prefix("hsl(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(inner);

        let parts: Vec<&str> = inner
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .collect();
        let [h, s_part, l_part] = parts.as_slice() else {
            return Err(format!("invalid HSL color '{}': expected 3 components", s));
        };

        let h: f32 = h
            .trim_end_matches("deg")
            .parse()
            .map_err(|_| format!("invalid hue in '{}'", s))?;
        let sat = parse_percent(s_part).ok_or_else(|| format!("invalid saturation in '{}'", s))?;
        let light = parse_percent(l_part).ok_or_else(|| format!("invalid lightness in '{}'", s))?;

        if !(0.0..=360.0).contains(&h) {
            return Err(format!("hue out of range in '{}'", s));
        }
        Ok(Hsl::new(h, sat, light))
    }
}

fn parse_percent(s: &str) -> Option<f32> {
    let v: f32 = s.strip_suffix('%')?.parse().ok()?;
    (0.0..=100.0).contains(&v).then_some(v)
}

impl TryFrom<String> for Hsl {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hsl> for String {
    fn from(value: Hsl) -> Self {
        value.to_string()
    }
}

// ============================================================================
// SCHEMES
// ============================================================================

/// A resolved `{primary, secondary, accent}` triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub primary: Hsl,
    pub secondary: Hsl,
    pub accent: Hsl,
}

impl ColorScheme {
    /// Color for a `colorRole` / `strokeRole` attribute value.
    pub fn role(&self, role: &str) -> Option<Hsl> {
        match role {
            "primary" => Some(self.primary),
            "secondary" => Some(self.secondary),
            "accent" => Some(self.accent),
            _ => None,
        }
    }
}

/// Caller-supplied colors for the custom scheme. Any channel may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomColors {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub secondary: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
}

/// Named palettes selectable by scheme name.
static PALETTES: &[(&str, ColorScheme)] = &[
    (
        "blue",
        ColorScheme {
            primary: Hsl::new(217.0, 91.0, 60.0),
            secondary: Hsl::new(221.0, 83.0, 53.0),
            accent: Hsl::new(213.0, 94.0, 68.0),
        },
    ),
    (
        "green",
        ColorScheme {
            primary: Hsl::new(142.0, 71.0, 45.0),
            secondary: Hsl::new(142.0, 76.0, 36.0),
            accent: Hsl::new(141.0, 69.0, 58.0),
        },
    ),
    (
        "red",
        ColorScheme {
            primary: Hsl::new(0.0, 84.0, 60.0),
            secondary: Hsl::new(0.0, 72.0, 51.0),
            accent: Hsl::new(0.0, 91.0, 71.0),
        },
    ),
    (
        "purple",
        ColorScheme {
            primary: Hsl::new(271.0, 91.0, 65.0),
            secondary: Hsl::new(272.0, 72.0, 47.0),
            accent: Hsl::new(270.0, 95.0, 75.0),
        },
    ),
    (
        "orange",
        ColorScheme {
            primary: Hsl::new(25.0, 95.0, 53.0),
            secondary: Hsl::new(21.0, 90.0, 48.0),
            accent: Hsl::new(27.0, 96.0, 61.0),
        },
    ),
    (
        "slate",
        ColorScheme {
            primary: Hsl::new(215.0, 25.0, 27.0),
            secondary: Hsl::new(217.0, 33.0, 17.0),
            accent: Hsl::new(215.0, 20.0, 65.0),
        },
    ),
];

/// Look up a named palette.
pub fn palette(name: &str) -> Option<ColorScheme> {
    PALETTES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, scheme)| *scheme)
}

/// Names of all palettes.
pub fn palette_names() -> Vec<&'static str> {
    PALETTES.iter().map(|(n, _)| *n).collect()
}

/// Apply the precedence rules. `None` means the template's colors apply.
pub fn resolve_colors(scheme: Option<&str>, custom: Option<&CustomColors>) -> Option<ColorScheme> {
    match scheme.map(str::trim) {
        Some(CUSTOM_SCHEME) => Some(custom_scheme(custom)),
        Some(name) if !name.is_empty() && name != DEFAULT_SCHEME => {
            let found = palette(name);
            if found.is_none() {
                tracing::warn!(scheme = name, "unknown color scheme, using template colors");
            }
            found
        }
        _ => None,
    }
}

/// The colors a document ends up with: the resolved scheme, or the
/// template's built-in triple when resolution defers.
pub fn effective_colors(
    scheme: Option<&str>,
    custom: Option<&CustomColors>,
    template: &Template,
) -> ColorScheme {
    resolve_colors(scheme, custom).unwrap_or(template.colors)
}

fn custom_scheme(custom: Option<&CustomColors>) -> ColorScheme {
    let Some(custom) = custom else {
        return CUSTOM_DEFAULTS;
    };
    ColorScheme {
        primary: channel("primary", custom.primary.as_deref(), CUSTOM_DEFAULTS.primary),
        secondary: channel("secondary", custom.secondary.as_deref(), CUSTOM_DEFAULTS.secondary),
        accent: channel("accent", custom.accent.as_deref(), CUSTOM_DEFAULTS.accent),
    }
}

fn channel(name: &str, value: Option<&str>, fallback: Hsl) -> Hsl {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => fallback,
        Some(v) => v.parse().unwrap_or_else(|err| {
            tracing::warn!(channel = name, error = %err, "ignoring invalid custom color");
            fallback
        }),
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::color::Rgba8;
use crate::foundation::error::{MotionError, MotionResult};

/// How binned points are turned into colors.
///
/// Serialized externally tagged: `{"continuous": ["#000000", "#ffffff"]}` or
/// `{"categorical": {"Riots": "#ffff00"}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMapping {
    /// Ordered palette indexed by histogram-equalized bin intensity.
    Continuous(Vec<Rgba8>),
    /// Category label to color.
    Categorical(BTreeMap<String, Rgba8>),
}

impl ColorMapping {
    /// Fresh copy of the default black-red-yellow-white heat palette.
    pub fn fire() -> Self {
        Self::Continuous(
            [
                (0x00, 0x00, 0x00),
                (0x3b, 0x0a, 0x00),
                (0x7a, 0x0f, 0x00),
                (0xb3, 0x1f, 0x00),
                (0xe2, 0x3b, 0x00),
                (0xff, 0x6a, 0x00),
                (0xff, 0x9e, 0x1a),
                (0xff, 0xd1, 0x5c),
                (0xff, 0xff, 0xff),
            ]
            .into_iter()
            .map(|(r, g, b)| Rgba8::rgb(r, g, b))
            .collect(),
        )
    }

    /// Categorical mapping from `(label, color)` pairs; duplicate labels are rejected.
    pub fn categorical<I, S>(pairs: I) -> MotionResult<Self>
    where
        I: IntoIterator<Item = (S, Rgba8)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (label, color) in pairs {
            let label = label.into();
            if map.insert(label.clone(), color).is_some() {
                return Err(MotionError::validation(format!(
                    "duplicate category '{label}' in color mapping"
                )));
            }
        }
        let mapping = Self::Categorical(map);
        mapping.validate()?;
        Ok(mapping)
    }

    /// Reject empty palettes and empty category maps.
    pub fn validate(&self) -> MotionResult<()> {
        match self {
            Self::Continuous(palette) if palette.is_empty() => Err(MotionError::validation(
                "continuous color mapping needs at least one color",
            )),
            Self::Categorical(map) if map.is_empty() => Err(MotionError::validation(
                "categorical color mapping needs at least one category",
            )),
            _ => Ok(()),
        }
    }

    /// Return `true` for categorical mappings.
    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::Categorical(_))
    }
}

impl Default for ColorMapping {
    fn default() -> Self {
        Self::fire()
    }
}

/// Sample a palette at `t ∈ [0, 1]`, interpolating linearly between adjacent stops.
pub fn sample_palette(palette: &[Rgba8], t: f64) -> Rgba8 {
    match palette {
        [] => Rgba8::TRANSPARENT,
        [only] => *only,
        _ => {
            let pos = t.clamp(0.0, 1.0) * (palette.len() - 1) as f64;
            let i = (pos.floor() as usize).min(palette.len() - 2);
            palette[i].lerp(palette[i + 1], pos - i as f64)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/colormap.rs"]
mod tests;

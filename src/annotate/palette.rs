use crate::error::{DecorateError, Result};
use crate::taxonomy::TaxonRank;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Result<Self> {
        let invalid = || DecorateError::InvalidColour {
            value: value.to_string(),
        };
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation in sRGB: `t = 0` is `self`, `t = 1` is `other`.
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }

    /// Relative brightness in `0.0..=1.0` (Rec. 709 weights on sRGB values).
    pub fn brightness(self) -> f64 {
        (0.2126 * self.r as f64 + 0.7152 * self.g as f64 + 0.0722 * self.b as f64) / 255.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Tableau 20 categorical palette.
pub const TABLEAU_20: [Rgb; 20] = [
    Rgb::new(0x1f, 0x77, 0xb4),
    Rgb::new(0xae, 0xc7, 0xe8),
    Rgb::new(0xff, 0x7f, 0x0e),
    Rgb::new(0xff, 0xbb, 0x78),
    Rgb::new(0x2c, 0xa0, 0x2c),
    Rgb::new(0x98, 0xdf, 0x8a),
    Rgb::new(0xd6, 0x27, 0x28),
    Rgb::new(0xff, 0x98, 0x96),
    Rgb::new(0x94, 0x67, 0xbd),
    Rgb::new(0xc5, 0xb0, 0xd5),
    Rgb::new(0x8c, 0x56, 0x4b),
    Rgb::new(0xc4, 0x9c, 0x94),
    Rgb::new(0xe3, 0x77, 0xc2),
    Rgb::new(0xf7, 0xb6, 0xd2),
    Rgb::new(0x7f, 0x7f, 0x7f),
    Rgb::new(0xc7, 0xc7, 0xc7),
    Rgb::new(0xbc, 0xbd, 0x22),
    Rgb::new(0xdb, 0xdb, 0x8d),
    Rgb::new(0x17, 0xbe, 0xcf),
    Rgb::new(0x9e, 0xda, 0xe5),
];

/// One shade per rank from phylum to species.
pub const DEFAULT_SHADE_COUNT: usize = 6;

/// `shades` colours going from `base` toward white; shade `i` is `base`
/// mixed with white by `i / shades`, so the last shade never reaches white.
pub fn color_ramp(base: Rgb, shades: usize) -> Vec<Rgb> {
    (0..shades)
        .map(|i| base.mix(Rgb::WHITE, i as f64 / shades as f64))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteOptions {
    pub base: Vec<Rgb>,
    pub shade_count: usize,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            base: TABLEAU_20.to_vec(),
            shade_count: DEFAULT_SHADE_COUNT,
        }
    }
}

/// Phylum name to its colour ramp, in assignment order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PhylumPalette {
    ramps: IndexMap<String, Vec<Rgb>>,
}

impl PhylumPalette {
    pub fn ramp(&self, phylum: &str) -> Option<&[Rgb]> {
        self.ramps.get(phylum).map(Vec::as_slice)
    }

    /// Base colour of a phylum (its first shade).
    pub fn base(&self, phylum: &str) -> Option<Rgb> {
        self.ramp(phylum).and_then(|ramp| ramp.first().copied())
    }

    /// Shade for a taxon at `rank` within `phylum`: phylum 0, class 1, ...
    /// species 5. Ranks beyond the ramp use its lightest shade; domain has none.
    pub fn shade(&self, phylum: &str, rank: TaxonRank) -> Option<Rgb> {
        let idx = rank.index().checked_sub(TaxonRank::Phylum.index())?;
        let ramp = self.ramp(phylum)?;
        ramp.get(idx).or_else(|| ramp.last()).copied()
    }

    pub fn len(&self) -> usize {
        self.ramps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ramps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rgb])> {
        self.ramps.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Assigns each distinct phylum, in the order given, the next base colour
/// (cycling through the palette) and expands it into a ramp.
pub fn get_phylum_colours<'a>(
    phyla: impl IntoIterator<Item = &'a str>,
    options: &PaletteOptions,
) -> PhylumPalette {
    let base: &[Rgb] = if options.base.is_empty() {
        &TABLEAU_20
    } else {
        &options.base
    };

    let mut ramps = IndexMap::new();
    for phylum in phyla {
        if ramps.contains_key(phylum) {
            continue;
        }
        let colour = base[ramps.len() % base.len()];
        ramps.insert(phylum.to_string(), color_ramp(colour, options.shade_count));
    }
    PhylumPalette { ramps }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip_and_errors() {
        let colour = Rgb::from_hex("#1f77b4").unwrap();
        assert_eq!(colour, TABLEAU_20[0]);
        assert_eq!(colour.to_hex(), "#1f77b4");
        assert_eq!(Rgb::from_hex("FF7F0E").unwrap(), TABLEAU_20[2]);

        for bad in ["#12345", "#gg0000", "", "#1234567"] {
            assert!(Rgb::from_hex(bad).is_err(), "{} should fail", bad);
        }
    }

    #[test]
    fn test_ramp_gets_lighter() {
        let ramp = color_ramp(TABLEAU_20[0], DEFAULT_SHADE_COUNT);
        assert_eq!(ramp.len(), 6);
        assert_eq!(ramp[0], TABLEAU_20[0]);
        for pair in ramp.windows(2) {
            assert!(pair[1].brightness() > pair[0].brightness());
        }
        assert_ne!(*ramp.last().unwrap(), Rgb::WHITE);
        assert!(color_ramp(TABLEAU_20[0], 0).is_empty());
    }

    #[test]
    fn test_colours_cycle_and_are_deterministic() {
        let phyla: Vec<String> = (0..25).map(|i| format!("p__{}", i)).collect();
        let options = PaletteOptions::default();
        let first = get_phylum_colours(phyla.iter().map(String::as_str), &options);
        let second = get_phylum_colours(phyla.iter().map(String::as_str), &options);

        assert_eq!(first, second);
        assert_eq!(first.len(), 25);
        assert_eq!(first.base("p__0"), Some(TABLEAU_20[0]));
        assert_eq!(first.base("p__20"), Some(TABLEAU_20[0]));
        assert_eq!(first.base("p__21"), Some(TABLEAU_20[1]));
        assert_ne!(first.base("p__0"), first.base("p__1"));
    }

    #[test]
    fn test_repeated_phylum_keeps_first_colour() {
        let palette = get_phylum_colours(["p__a", "p__b", "p__a"], &PaletteOptions::default());
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.base("p__b"), Some(TABLEAU_20[1]));
    }

    #[test]
    fn test_shade_by_rank() {
        let options = PaletteOptions {
            base: vec![Rgb::new(0, 0, 0)],
            shade_count: 3,
        };
        let palette = get_phylum_colours(["p__a"], &options);
        assert_eq!(palette.shade("p__a", TaxonRank::Phylum), Some(Rgb::new(0, 0, 0)));
        assert_eq!(palette.shade("p__a", TaxonRank::Class), Some(Rgb::new(85, 85, 85)));
        // past the end of a short ramp
        assert_eq!(palette.shade("p__a", TaxonRank::Species), Some(Rgb::new(170, 170, 170)));
        assert_eq!(palette.shade("p__a", TaxonRank::Domain), None);
        assert_eq!(palette.shade("p__z", TaxonRank::Class), None);
    }
}

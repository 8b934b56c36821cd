//! Preset interchange record
//!
//! A preset is either a list of parametric bands or a list of graphic
//! gains. The tagged form only exists here; the engine keeps both band
//! arrays separately and untagged.
//!
//! Serialized shape: `{ name, mode, parametricBands?, graphicGains? }`.

use eq_core::{EqError, EqMode, EqResult, ParametricBand, clamp_gain_db};
use eq_dsp::map_graphic_gains;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Longest preset name kept after sanitizing
pub const MAX_NAME_LEN: usize = 50;
/// Name used when sanitizing leaves nothing
pub const FALLBACK_NAME: &str = "Imported Preset";

/// Band data of a preset
#[derive(Debug, Clone, PartialEq)]
pub enum PresetData {
    Parametric(Vec<ParametricBand>),
    Graphic(Vec<f64>),
}

/// Named equalizer preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PresetRecord", into = "PresetRecord")]
pub struct Preset {
    pub name: String,
    pub data: PresetData,
}

/// Wire form of [`Preset`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresetRecord {
    name: String,
    #[serde(alias = "type")]
    mode: EqMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parametric_bands: Option<Vec<ParametricBand>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    graphic_gains: Option<Vec<f64>>,
}

impl TryFrom<PresetRecord> for Preset {
    type Error = EqError;

    fn try_from(record: PresetRecord) -> EqResult<Self> {
        let data = match record.mode {
            EqMode::Parametric => match (record.parametric_bands, record.graphic_gains) {
                (Some(bands), _) => PresetData::Parametric(bands),
                (None, Some(_)) => {
                    return Err(EqError::InvalidPreset(format!(
                        "'{}': parametric preset carries graphic gains only",
                        record.name
                    )));
                }
                (None, None) => PresetData::Parametric(Vec::new()),
            },
            EqMode::Graphic => match (record.graphic_gains, record.parametric_bands) {
                (Some(gains), _) => PresetData::Graphic(gains),
                (None, Some(_)) => {
                    return Err(EqError::InvalidPreset(format!(
                        "'{}': graphic preset carries parametric bands only",
                        record.name
                    )));
                }
                (None, None) => PresetData::Graphic(Vec::new()),
            },
        };

        Ok(Preset::new(&record.name, data))
    }
}

impl From<Preset> for PresetRecord {
    fn from(preset: Preset) -> Self {
        let mode = preset.mode();
        let (parametric_bands, graphic_gains) = match preset.data {
            PresetData::Parametric(bands) => (Some(bands), None),
            PresetData::Graphic(gains) => (None, Some(gains)),
        };
        Self {
            name: preset.name,
            mode,
            parametric_bands,
            graphic_gains,
        }
    }
}

impl Preset {
    /// Build a preset; the name is sanitized and values clamped into range
    pub fn new(name: &str, data: PresetData) -> Self {
        let data = match data {
            PresetData::Parametric(bands) => {
                PresetData::Parametric(bands.iter().map(ParametricBand::sanitized).collect())
            }
            PresetData::Graphic(gains) => {
                PresetData::Graphic(gains.into_iter().map(clamp_gain_db).collect())
            }
        };
        Self {
            name: sanitize_name(name),
            data,
        }
    }

    pub fn parametric(name: &str, bands: Vec<ParametricBand>) -> Self {
        Self::new(name, PresetData::Parametric(bands))
    }

    pub fn graphic(name: &str, gains: Vec<f64>) -> Self {
        Self::new(name, PresetData::Graphic(gains))
    }

    pub fn mode(&self) -> EqMode {
        match self.data {
            PresetData::Parametric(_) => EqMode::Parametric,
            PresetData::Graphic(_) => EqMode::Graphic,
        }
    }

    pub fn band_count(&self) -> usize {
        match &self.data {
            PresetData::Parametric(bands) => bands.len(),
            PresetData::Graphic(gains) => gains.len(),
        }
    }

    /// Parametric view of the preset; graphic gains go through the fixed centers
    pub fn bands_for_export(&self) -> Vec<ParametricBand> {
        match &self.data {
            PresetData::Parametric(bands) => bands.clone(),
            PresetData::Graphic(gains) => map_graphic_gains(gains),
        }
    }

    pub fn from_json(json: &str) -> EqResult<Self> {
        serde_json::from_str(json).map_err(|e| EqError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> EqResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EqError::Serialization(e.to_string()))
    }

    /// Parse `frequency, gain, q` lines.
    ///
    /// Blank lines, `#` comments and malformed lines are skipped; at least
    /// one band must parse.
    pub fn from_delimited(name: &str, text: &str) -> EqResult<Self> {
        let bands: Vec<ParametricBand> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(parse_band_line)
            .collect();

        if bands.is_empty() {
            return Err(EqError::InvalidPreset(format!(
                "'{name}': no 'frequency, gain, q' lines found"
            )));
        }

        Ok(Self::parametric(name, bands))
    }

    /// One `frequency, gain, q` line per band with a comment header
    pub fn to_delimited(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Preset: {}", self.name);
        let _ = writeln!(out, "# Format: Frequency (Hz), Gain (dB), Q");
        for band in self.bands_for_export() {
            let _ = writeln!(
                out,
                "{}, {}, {}",
                band.center_frequency_hz, band.gain_db, band.q
            );
        }
        out
    }
}

fn parse_band_line(line: &str) -> Option<ParametricBand> {
    let mut fields = line.split(',').map(|f| f.trim().parse::<f64>());
    let freq = fields.next()?.ok()?;
    let gain = fields.next()?.ok()?;
    let q = fields.next()?.ok()?;
    if !(freq.is_finite() && gain.is_finite() && q.is_finite()) {
        return None;
    }
    Some(ParametricBand::new(freq, gain, q))
}

/// Keep letters, digits, whitespace and `-_()[]`; cap the length
pub fn sanitize_name(name: &str) -> String {
    let filtered: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || "-_()[]".contains(*c))
        .collect();
    let trimmed: String = filtered.trim().chars().take(MAX_NAME_LEN).collect();
    let trimmed = trimmed.trim_end();

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

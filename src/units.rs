//! Units for control values, and stream id checks.
//!
//! Control packets carry a bare number; its meaning comes from the packet's
//! content tag. Stages that take a frequency or time option let the user
//! pick the unit, with `stream` meaning "read it from a control stream".

use crate::Float;
use crate::packet::Content;

/// How a frequency-valued option or control packet is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreqUnit {
    /// Cycles per second.
    Hertz,
    /// Wavelength in meters.
    Meter,
    /// Period in samples.
    Samples,
    /// Taken from a control stream at runtime.
    Stream,
}

crate::enum_option!(FreqUnit {
    "hertz" => FreqUnit::Hertz,
    "hz" => FreqUnit::Hertz,
    "meters" => FreqUnit::Meter,
    "meter" => FreqUnit::Meter,
    "m" => FreqUnit::Meter,
    "samples" => FreqUnit::Samples,
    "stream" => FreqUnit::Stream,
});

/// How a time-valued option or control packet is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// Seconds.
    Second,
    /// A count of samples.
    Samples,
    /// Taken from a control stream at runtime.
    Stream,
}

crate::enum_option!(TimeUnit {
    "seconds" => TimeUnit::Second,
    "sec" => TimeUnit::Second,
    "s" => TimeUnit::Second,
    "samples" => TimeUnit::Samples,
    "stream" => TimeUnit::Stream,
});

/// The frequency unit implied by a control packet's content tag.
/// [`FreqUnit::Stream`] for anything that is not a frequency.
pub fn content_freq_unit(content: Content) -> FreqUnit {
    match content {
        Content::Frequency => FreqUnit::Hertz,
        Content::Wavelength => FreqUnit::Meter,
        Content::SampleCount => FreqUnit::Samples,
        _ => FreqUnit::Stream,
    }
}

/// The time unit implied by a control packet's content tag.
pub fn content_time_unit(content: Content) -> TimeUnit {
    match content {
        Content::Time => TimeUnit::Second,
        Content::SampleCount => TimeUnit::Samples,
        _ => TimeUnit::Stream,
    }
}

const SPEED_OF_LIGHT: Float = 299_792_458.0;

/// Convert a frequency in `unit` to cycles per sample. NaN, infinite and
/// [`FreqUnit::Stream`] inputs come back as 0.
pub fn convert_freq(unit: FreqUnit, f: Float, sample_rate: u64) -> Float {
    let f = match unit {
        // c / lambda
        FreqUnit::Meter => SPEED_OF_LIGHT / f / sample_rate as Float,
        FreqUnit::Hertz => f / sample_rate as Float,
        FreqUnit::Samples => 1.0 / f,
        FreqUnit::Stream => return 0.0,
    };

    if f.is_nan() || f.is_infinite() { 0.0 } else { f }
}

/// Convert a time in `unit` to a count of samples. NaN, infinite and
/// [`TimeUnit::Stream`] inputs come back as 0.
pub fn convert_time(unit: TimeUnit, t: Float, sample_rate: u64) -> Float {
    let t = match unit {
        TimeUnit::Second => t * sample_rate as Float,
        TimeUnit::Samples => t,
        TimeUnit::Stream => return 0.0,
    };

    if t.is_nan() || t.is_infinite() { 0.0 } else { t }
}

/// True when `id` fits the packet header's stream id field.
pub fn valid_stream_id(id: u64) -> bool {
    id <= u16::MAX as u64
}

/// Stream id check for ids arriving through float-typed options.
pub fn valid_stream_id_float(id: Float) -> bool {
    id >= 0.0 && id <= u16::MAX as Float && id.fract() == 0.0
}

/// Convert a float-typed option value to a stream id.
pub fn stream_id(id: Float) -> u16 {
    id.floor() as u16
}

//! Wire packet header and payload taxonomy.
//!
//! A stream is a plain concatenation of records: a 16-byte header followed
//! by `size` payload bytes. The header is little-endian on the wire
//! regardless of host byte order; it carries no delimiter and no checksum.

use crate::{Error, Sample};

/// Number of bytes a packet header occupies on the wire.
pub const HEADER_SIZE: usize = 16;

/// Payload interpretation tag carried in every packet header.
///
/// The set is closed; the wire value is the variant index. The canonical
/// textual name is the lowercase form (e.g. `complex_signal`), used both by
/// the option parser and by `Display`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum Content {
    /// Uninterpreted bytes.
    #[default]
    Binary = 0,
    /// UTF-8 text, no terminator.
    String,
    /// A point in time.
    Time,
    /// A frequency in hertz.
    Frequency,
    /// A wavelength in meters.
    Wavelength,
    /// A count of samples.
    SampleCount,
    /// Real samples, 32-bit IEEE-754 floats.
    Signal,
    /// Complex samples, interleaved real-then-imag float pairs.
    ComplexSignal,
    /// Real spectral bins.
    Spectrum,
    /// Complex spectral bins.
    ComplexSpectrum,
}

impl Content {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Content::Binary => "binary",
            Content::String => "string",
            Content::Time => "time",
            Content::Frequency => "frequency",
            Content::Wavelength => "wavelength",
            Content::SampleCount => "sample_count",
            Content::Signal => "signal",
            Content::ComplexSignal => "complex_signal",
            Content::Spectrum => "spectrum",
            Content::ComplexSpectrum => "complex_spectrum",
        }
    }

    /// Decode a wire content tag.
    pub fn from_wire(value: u16) -> Result<Content, Error> {
        Ok(match value {
            0 => Content::Binary,
            1 => Content::String,
            2 => Content::Time,
            3 => Content::Frequency,
            4 => Content::Wavelength,
            5 => Content::SampleCount,
            6 => Content::Signal,
            7 => Content::ComplexSignal,
            8 => Content::Spectrum,
            9 => Content::ComplexSpectrum,
            other => return Err(Error::InvalidContent(other)),
        })
    }
}

impl std::fmt::Display for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

crate::enum_option!(Content {
    "binary" => Content::Binary,
    "string" => Content::String,
    "time" => Content::Time,
    "frequency" => Content::Frequency,
    "wavelength" => Content::Wavelength,
    "sample_count" => Content::SampleCount,
    "signal" => Content::Signal,
    "complex_signal" => Content::ComplexSignal,
    "spectrum" => Content::Spectrum,
    "complex_spectrum" => Content::ComplexSpectrum,
});

/// One packet header.
///
/// `size` is the payload length in bytes; the payload follows the header
/// immediately. `duration` is the nominal duration of the payload in
/// nanoseconds, 0 when unknown; the transport never interprets it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    /// Logical stream identifier.
    pub id: u16,
    /// Payload interpretation.
    pub content: Content,
    /// Payload length in bytes.
    pub size: u32,
    /// Nominal payload duration in nanoseconds.
    pub duration: u64,
}

impl Packet {
    /// Whether the payload length is a whole number of `T` samples.
    pub fn compatible<T: Sample>(&self) -> bool {
        self.size as usize % T::size() == 0
    }

    /// Number of `T` samples in the payload; 0 when not compatible.
    pub fn count<T: Sample>(&self) -> u32 {
        if self.compatible::<T>() {
            self.size / T::size() as u32
        } else {
            0
        }
    }

    /// Encode the header for the wire.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..2].copy_from_slice(&self.id.to_le_bytes());
        out[2..4].copy_from_slice(&(self.content as u16).to_le_bytes());
        out[4..8].copy_from_slice(&self.size.to_le_bytes());
        out[8..16].copy_from_slice(&self.duration.to_le_bytes());
        out
    }

    /// Decode a header read from the wire.
    pub fn from_bytes(data: &[u8; HEADER_SIZE]) -> Result<Packet, Error> {
        Ok(Packet {
            id: u16::from_le_bytes([data[0], data[1]]),
            content: Content::from_wire(u16::from_le_bytes([data[2], data[3]]))?,
            size: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            duration: u64::from_le_bytes([
                data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
            ]),
        })
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: u64, b: u64) -> u64 {
    a / gcd(a, b) * b
}

/// Pick a good payload element count for generated packets.
///
/// Aims for a payload of about two pages. When a sample rate is given, the
/// count is shrunk in `lcm(header, element)` steps until the packet
/// duration is a whole number of nanoseconds, so downstream stages can
/// pace playback exactly.
pub fn optimal_block_size(element_size: u64, sample_rate: u64) -> usize {
    // SAFETY: sysconf has no memory-safety preconditions.
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as u64;

    let mut size = std::cmp::max(1, (2 * page - HEADER_SIZE as u64) / element_size);
    if sample_rate == 0 {
        return size as usize;
    }

    let step = lcm(HEADER_SIZE as u64, element_size) / element_size;
    let limit = std::cmp::max((page - HEADER_SIZE as u64) / element_size, step);

    while size > limit && (size * 1_000_000_000) % sample_rate > 0 {
        size -= step;
    }

    size as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Complex, Float};

    #[test]
    fn header_roundtrip() -> anyhow::Result<()> {
        let pkt = Packet {
            id: 513,
            content: Content::ComplexSignal,
            size: 4096,
            duration: 1_000_000,
        };
        assert_eq!(Packet::from_bytes(&pkt.to_bytes())?, pkt);
        Ok(())
    }

    #[test]
    fn header_layout() {
        let pkt = Packet {
            id: 0x0102,
            content: Content::String,
            size: 0x0a0b0c0d,
            duration: 0x1112131415161718,
        };
        assert_eq!(
            pkt.to_bytes(),
            [
                0x02, 0x01, // id
                0x01, 0x00, // content
                0x0d, 0x0c, 0x0b, 0x0a, // size
                0x18, 0x17, 0x16, 0x15, 0x14, 0x13, 0x12, 0x11, // duration
            ]
        );
    }

    #[test]
    fn header_roundtrip_random() -> anyhow::Result<()> {
        use rand::Rng;
        let mut rng = rand::rng();
        for _ in 0..1000 {
            let pkt = Packet {
                id: rng.random(),
                content: Content::from_wire(rng.random_range(0..10))?,
                size: rng.random(),
                duration: rng.random(),
            };
            assert_eq!(Packet::from_bytes(&pkt.to_bytes())?, pkt);
        }
        Ok(())
    }

    #[test]
    fn invalid_content_tag() {
        let mut data = [0u8; HEADER_SIZE];
        data[2] = 10;
        assert_eq!(Packet::from_bytes(&data), Err(Error::InvalidContent(10)));
    }

    #[test]
    fn compatibility() {
        let pkt = Packet {
            id: 0,
            content: Content::Signal,
            size: 12,
            duration: 0,
        };
        assert!(pkt.compatible::<u8>());
        assert!(pkt.compatible::<Float>());
        assert!(!pkt.compatible::<Complex>());
        assert_eq!(pkt.count::<Float>(), 3);
        assert_eq!(pkt.count::<Complex>(), 0);

        let empty = Packet::default();
        assert!(empty.compatible::<Complex>());
        assert_eq!(empty.count::<Complex>(), 0);
    }

    #[test]
    fn content_names() {
        assert_eq!(Content::ComplexSignal.to_string(), "complex_signal");
        assert_eq!(Content::Binary.to_string(), "binary");
        for tag in 0..10 {
            let content = Content::from_wire(tag).unwrap();
            assert_eq!(content as u16, tag);
        }
    }

    #[test]
    fn block_size_divides_rate() {
        let size = optimal_block_size(8, 48_000);
        assert!(size > 0);
        assert_eq!((size as u64 * 1_000_000_000) % 48_000, 0);

        // Without a rate, just something near two pages.
        assert!(optimal_block_size(4, 0) >= 1);
        assert_eq!(optimal_block_size(1_000_000, 0), 1);
    }
}

#![warn(missing_docs)]
/*! Software defined radio building blocks for Unix pipelines.

Every program in this crate is a small single-purpose stage that reads a
sequence of typed packets on stdin, transforms or filters them, and writes
packets on stdout. Stages are composed by the shell:

```text
gen freq=100k sample_rate=1M mode=real \
    | throttle \
    | inspect stream=0 pass_all=true \
    | unwrap > samples.f32
```

There is no graph scheduler. Concurrency between stages comes from the OS
pipe scheduler: a full pipe blocks the writer, an empty pipe blocks the
reader, and that is all the flow control there is.

# Architecture overview

The core is the transport in [`source::Source`] and [`sink::Sink`]: a
16-byte self-describing header ([`packet::Packet`]) framing a variable
length body on top of a byte stream. The transport classifies its file
descriptors once at construction ([`fd::is_fifo`], [`fd::is_seekable`]) and
picks the cheapest correct transfer primitive for every packet it forwards:
`splice` and `tee` between pipes, `sendfile` out of regular files, seeks to
skip unwanted bodies, buffered I/O when nothing better applies.

Stages declare their configuration with the typed `key=value` option layer
in [`opt`], which understands SI-suffixed numbers, complex literals, and
brace-wrapped collections.

## Modules

* [`packet`] — the wire header and payload taxonomy.
* [`fd`] — file descriptor classification.
* [`source`], [`sink`] — the framed transport.
* [`opt`] — option declarations and parsing.
* [`units`] — frequency/time units for control packets.
* [`stage`] — process setup shared by the stage executables.
 */

pub mod fd;
pub mod opt;
pub mod packet;
pub mod sink;
pub mod source;
pub mod stage;
pub mod units;

pub use packet::{Content, Packet};
pub use sink::Sink;
pub use source::Source;

/// Float type used. Usually f32, but not guaranteed.
pub type Float = f32;

/// Complex (I/Q) data.
pub type Complex = num_complex::Complex<Float>;

/// Pipesdr error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A wire header carried a content tag outside the known enumeration.
    #[error("invalid content tag {0}")]
    InvalidContent(u16),

    /// Sample deserialization was handed the wrong number of bytes.
    #[error("sample data is {got} bytes, want {want}")]
    SampleSize {
        /// Bytes provided.
        got: usize,
        /// Bytes one sample occupies.
        want: usize,
    },
}

/// A trait all sample types must implement.
///
/// Payload samples are native-endian on the wire, unlike the packet header.
pub trait Sample {
    /// The type of the sample.
    type Type;

    /// The serialized size of one sample.
    fn size() -> usize;

    /// Parse one sample.
    fn parse(data: &[u8]) -> Result<Self::Type, Error>;

    /// Serialize one sample.
    fn serialize(&self) -> Vec<u8>;
}

impl Sample for u8 {
    type Type = u8;
    fn size() -> usize {
        1
    }
    fn parse(data: &[u8]) -> Result<u8, Error> {
        if data.len() != Self::size() {
            return Err(Error::SampleSize {
                got: data.len(),
                want: Self::size(),
            });
        }
        Ok(data[0])
    }
    fn serialize(&self) -> Vec<u8> {
        vec![*self]
    }
}

impl Sample for Float {
    type Type = Float;
    fn size() -> usize {
        std::mem::size_of::<Self>()
    }
    fn parse(data: &[u8]) -> Result<Float, Error> {
        if data.len() != Self::size() {
            return Err(Error::SampleSize {
                got: data.len(),
                want: Self::size(),
            });
        }
        Ok(Float::from_ne_bytes([data[0], data[1], data[2], data[3]]))
    }
    fn serialize(&self) -> Vec<u8> {
        Float::to_ne_bytes(*self).to_vec()
    }
}

impl Sample for Complex {
    type Type = Complex;
    fn size() -> usize {
        std::mem::size_of::<Self>()
    }
    fn parse(data: &[u8]) -> Result<Complex, Error> {
        if data.len() != Self::size() {
            return Err(Error::SampleSize {
                got: data.len(),
                want: Self::size(),
            });
        }
        let re = Float::from_ne_bytes([data[0], data[1], data[2], data[3]]);
        let im = Float::from_ne_bytes([data[4], data[5], data[6], data[7]]);
        Ok(Complex::new(re, im))
    }
    fn serialize(&self) -> Vec<u8> {
        let mut ret = Vec::new();
        ret.extend(Float::to_ne_bytes(self.re));
        ret.extend(Float::to_ne_bytes(self.im));
        ret
    }
}

#[cfg(test)]
pub mod tests {
    //! Test helper functions.
    use std::os::fd::{FromRawFd, OwnedFd};

    use super::*;

    /// Create a pipe, returning (read end, write end).
    pub fn pipe() -> (OwnedFd, OwnedFd) {
        let mut fds = [0i32; 2];
        // SAFETY: pipe() fills exactly two descriptors into the array.
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(rc, 0, "pipe() failed");
        // SAFETY: the descriptors are freshly created and owned only here.
        unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
    }

    #[test]
    fn sample_roundtrip_float() -> anyhow::Result<()> {
        #[allow(clippy::approx_constant)]
        for v in [0.0 as Float, 1.0, 3.14, -3.14] {
            assert_eq!(Float::parse(&v.serialize())?, v);
        }
        Ok(())
    }

    #[test]
    fn sample_roundtrip_complex() -> anyhow::Result<()> {
        let v = Complex::new(3.0, -4.5);
        assert_eq!(Complex::parse(&v.serialize())?, v);
        assert_eq!(Complex::size(), 8);
        Ok(())
    }

    #[test]
    fn sample_bad_size() {
        assert!(Float::parse(&[0, 0]).is_err());
        assert_eq!(
            Complex::parse(&[0; 4]),
            Err(Error::SampleSize { got: 4, want: 8 })
        );
    }
}

//! Framed packet writer.

use std::os::fd::RawFd;

use log::debug;

use crate::Sample;
use crate::fd;
use crate::packet::{Content, Packet};

/// Framed packet writer over a file descriptor.
///
/// Stateless between packets: [`send`](Sink::send) writes a header and its
/// body in order and that is the whole protocol. A raw sink suppresses the
/// header, bridging framed stages to plain byte streams. Write errors are
/// absorbed; a broken downstream pipe is a shutdown signal, not a fault.
/// The descriptor is borrowed, never closed.
pub struct Sink {
    fd: RawFd,
    raw: bool,
    fifo: bool,
}

impl Sink {
    /// Framed sink writing a header before every body.
    pub fn new(fd: RawFd) -> Self {
        Self::with_mode(fd, false)
    }

    /// Raw sink: bodies only, no headers.
    pub fn raw(fd: RawFd) -> Self {
        Self::with_mode(fd, true)
    }

    fn with_mode(fd: RawFd, raw: bool) -> Self {
        let fifo = fd::is_fifo(fd);
        debug!("sink fd {fd}: raw={raw} fifo={fifo}");
        Self { fd, raw, fifo }
    }

    /// Write one packet: header (unless raw), then the first `pkt.size`
    /// bytes of `data`. Non-pipe sinks are fdatasync'd after the body so
    /// file output keeps pace with the stream.
    pub fn send(&mut self, pkt: Packet, data: &[u8]) {
        if !self.raw && !fd::write_all(self.fd, &pkt.to_bytes()) {
            return;
        }

        let n = std::cmp::min(data.len(), pkt.size as usize);
        fd::write_all(self.fd, &data[..n]);

        if !self.fifo {
            fd::datasync(self.fd);
        }
    }

    /// Write one packet of samples; the header size field is computed from
    /// the element count.
    pub fn send_samples<T: Sample>(
        &mut self,
        id: u16,
        content: Content,
        duration: u64,
        data: &[T],
    ) {
        let mut bytes = Vec::with_capacity(T::size() * data.len());
        for s in data {
            bytes.extend(s.serialize());
        }
        let pkt = Packet {
            id,
            content,
            size: bytes.len() as u32,
            duration,
        };
        self.send(pkt, &bytes);
    }

    pub(crate) fn fd(&self) -> RawFd {
        self.fd
    }

    pub(crate) fn is_fifo(&self) -> bool {
        self.fifo
    }

    pub(crate) fn is_raw(&self) -> bool {
        self.raw
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::os::fd::AsRawFd;

    use super::*;
    use crate::tests::pipe;
    use crate::{Complex, Float, Source};

    #[test]
    fn send_then_read_back() {
        let (r, w) = pipe();
        let mut sink = Sink::new(w.as_raw_fd());

        let pkt = Packet {
            id: 3,
            content: Content::Binary,
            size: 4,
            duration: 77,
        };
        sink.send(pkt, b"data");
        drop(w);

        let mut src = Source::new(r.as_raw_fd());
        assert!(src.next());
        assert_eq!(*src.packet(), pkt);
        let mut buf = [0u8; 4];
        assert_eq!(src.recv(&mut buf), 4);
        assert_eq!(&buf, b"data");
        assert!(!src.next());
    }

    #[test]
    fn send_samples_sets_size() {
        let (r, w) = pipe();
        let mut sink = Sink::new(w.as_raw_fd());

        sink.send_samples(1, Content::ComplexSignal, 0, &[
            Complex::new(1.0, 2.0),
            Complex::new(-3.0, 4.0),
        ]);
        drop(w);

        let mut src = Source::new(r.as_raw_fd());
        assert!(src.next());
        assert_eq!(src.packet().size, 16);
        assert_eq!(src.packet().count::<Complex>(), 2);
        let got = src.recv_samples::<Complex>();
        assert_eq!(got, vec![Complex::new(1.0, 2.0), Complex::new(-3.0, 4.0)]);
    }

    #[test]
    fn raw_sink_strips_header() {
        let (r, w) = pipe();
        let mut sink = Sink::raw(w.as_raw_fd());

        let pkt = Packet {
            id: 1,
            content: Content::Signal,
            size: 8,
            duration: 0,
        };
        let mut body = Vec::new();
        for v in [0.5f32, -0.5] {
            body.extend(Float::to_ne_bytes(v));
        }
        sink.send(pkt, &body);
        drop(w);

        let mut out = Vec::new();
        std::fs::File::from(r).read_to_end(&mut out).unwrap();
        assert_eq!(out, body);
    }

    #[test]
    fn empty_packet_is_header_only() {
        let (r, w) = pipe();
        let mut sink = Sink::new(w.as_raw_fd());
        let pkt = Packet {
            id: 9,
            content: Content::Time,
            size: 0,
            duration: 123,
        };
        sink.send(pkt, b"");
        drop(w);

        let mut out = Vec::new();
        std::fs::File::from(r).read_to_end(&mut out).unwrap();
        assert_eq!(out, pkt.to_bytes());
    }
}

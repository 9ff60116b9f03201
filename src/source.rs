//! Framed packet reader.

use std::os::fd::RawFd;

use log::debug;

use crate::fd;
use crate::packet::{HEADER_SIZE, Packet};
use crate::sink::Sink;
use crate::{Error, Sample};

/// Framed packet reader over a file descriptor.
///
/// A `Source` owns the reading side of a stream: it parses packet headers,
/// exposes the current header, hands out payload bytes on demand, and can
/// forward ([`pass`](Source::pass)) or duplicate ([`copy`](Source::copy))
/// the unread payload to a [`Sink`] without the caller ever touching the
/// bytes. Transfer primitives are chosen from the descriptor classification
/// cached at construction: `splice`/`tee` when an end is a pipe, `sendfile`
/// and seeks when the source is a regular file, buffered I/O otherwise.
///
/// In raw mode no header is read from the descriptor; the caller supplies a
/// template packet to [`next_raw`](Source::next_raw) instead, which lets
/// framed stages consume unwrapped byte streams and files.
///
/// All OS errors are absorbed: a failed read marks the source
/// [`end`](Source::end)-of-stream, a failed write to a sink loses that one
/// packet and nothing else. The descriptor is borrowed, never closed.
pub struct Source {
    fd: RawFd,
    raw: bool,
    fifo: bool,
    seekable: bool,

    pkt: Packet,
    read: u32,
    eof: bool,

    // Header bytes accumulated by poll() between packets.
    hdr: [u8; HEADER_SIZE],
    hdr_pos: usize,

    // Payload bytes pulled off the descriptor but not yet delivered to the
    // caller; filled by copy() on non-seekable descriptors.
    buffer: Vec<u8>,
    buf_pos: usize,
}

impl Source {
    /// Framed source reading headers from the descriptor.
    pub fn new(fd: RawFd) -> Self {
        Self::with_mode(fd, false)
    }

    /// Raw source: no headers on the descriptor, packets are shaped by the
    /// template handed to [`next_raw`](Source::next_raw).
    pub fn raw(fd: RawFd) -> Self {
        Self::with_mode(fd, true)
    }

    fn with_mode(fd: RawFd, raw: bool) -> Self {
        let fifo = fd::is_fifo(fd);
        let seekable = fd::is_seekable(fd);
        debug!("source fd {fd}: raw={raw} fifo={fifo} seekable={seekable}");
        Self {
            fd,
            raw,
            fifo,
            seekable,
            pkt: Packet::default(),
            read: 0,
            eof: false,
            hdr: [0u8; HEADER_SIZE],
            hdr_pos: 0,
            buffer: Vec::new(),
            buf_pos: 0,
        }
    }

    /// True once the stream has ended. Monotonic.
    pub fn end(&self) -> bool {
        self.eof
    }

    /// Header of the current packet.
    pub fn packet(&self) -> &Packet {
        &self.pkt
    }

    /// Advance to the next framed packet, discarding whatever was left
    /// unread of the previous one. False on end of stream.
    pub fn next(&mut self) -> bool {
        self.advance(Packet::default())
    }

    /// Advance a raw source, adopting `template` as the next header. On a
    /// seekable descriptor the template size is clamped to the bytes left
    /// in the file; false once nothing remains.
    pub fn next_raw(&mut self, template: Packet) -> bool {
        self.advance(template)
    }

    fn advance(&mut self, template: Packet) -> bool {
        self.discard();
        self.read = 0;

        if self.eof {
            self.pkt = Packet::default();
            return false;
        }

        if !self.raw {
            let want = HEADER_SIZE - self.hdr_pos;
            if fd::read_all(self.fd, &mut self.hdr[self.hdr_pos..]) < want {
                self.pkt = Packet::default();
                self.eof = true;
                return false;
            }
            self.hdr_pos = 0;

            match Packet::from_bytes(&self.hdr) {
                Ok(pkt) => self.pkt = pkt,
                Err(e) => {
                    // An unknown tag means the stream is not framed data we
                    // understand; treat it like a broken header.
                    debug!("source fd {}: {e}", self.fd);
                    self.pkt = Packet::default();
                    self.eof = true;
                    return false;
                }
            }
        } else {
            self.pkt = template;

            if self.seekable {
                let pos = fd::seek(self.fd, 0, libc::SEEK_CUR);
                let size = fd::seek(self.fd, 0, libc::SEEK_END);
                fd::seek(self.fd, pos, libc::SEEK_SET);

                if pos == size {
                    self.pkt = Packet::default();
                    return false;
                }

                self.pkt.size = std::cmp::min((size - pos) as u64, u64::from(template.size)) as u32;
            }
        }

        true
    }

    /// Report whether the next [`recv`](Source::recv) or
    /// [`next`](Source::next) will make progress without blocking.
    ///
    /// `timeout_ms` of -1 blocks until progress is possible, 0 peeks.
    /// Seekable descriptors are always ready. Between framed packets this
    /// accumulates header bytes as they trickle in and reports true only
    /// once a whole header is buffered (or the stream ended).
    pub fn poll(&mut self, timeout_ms: i32) -> bool {
        if self.seekable {
            // Seekable descriptor, data is always available.
            return true;
        }

        if !fd::poll_in(self.fd, timeout_ms) {
            return false;
        }

        if self.read >= self.pkt.size && !self.raw {
            // Waiting for a packet boundary.
            if self.hdr_pos == HEADER_SIZE {
                return true;
            }

            let r = fd::read_once(self.fd, &mut self.hdr[self.hdr_pos..]);
            if r <= 0 {
                // EOF, or an error occurred; next() will notice.
                return true;
            }

            self.hdr_pos += r as usize;
            self.hdr_pos == HEADER_SIZE
        } else {
            true
        }
    }

    /// Copy up to `buf.len()` bytes of the current packet's unread payload
    /// into `buf`. Returns the number of bytes delivered, which is short
    /// only when the payload is exhausted or the stream ends.
    pub fn recv(&mut self, buf: &mut [u8]) -> u32 {
        let want = std::cmp::min(buf.len(), (self.pkt.size - self.read) as usize);
        if want == 0 || self.eof {
            return 0;
        }

        let mut got = 0;

        if self.buf_pos != self.buffer.len() {
            got = std::cmp::min(want, self.buffer.len() - self.buf_pos);
            buf[..got].copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + got]);
            self.buf_pos += got;
        }

        if got < want {
            got += fd::read_all(self.fd, &mut buf[got..want]);
            if got < want {
                self.eof = true;
            }
        }

        self.read += got as u32;
        got as u32
    }

    /// Read the remaining payload as samples of `T`. Empty when the packet
    /// size is not a whole number of samples.
    pub fn recv_samples<T: Sample<Type = T>>(&mut self) -> Vec<T> {
        if !self.pkt.compatible::<T>() {
            return Vec::new();
        }

        let mut data = vec![0u8; (self.pkt.size - self.read) as usize];
        let n = self.recv(&mut data) as usize;
        data.truncate(n - n % T::size());

        data.chunks_exact(T::size())
            .map(|c| T::parse(c))
            .collect::<Result<Vec<T>, Error>>()
            .unwrap_or_default()
    }

    /// Discard all unread bytes of the current packet. Idempotent.
    pub fn discard(&mut self) {
        let size = (self.pkt.size - self.read) as usize;

        if self.seekable {
            fd::seek(self.fd, size as i64, libc::SEEK_CUR);
            self.read = self.pkt.size;
        } else {
            if size == 0 || self.eof {
                self.buf_pos = 0;
                self.buffer.clear();
                return;
            }

            let mut done = 0;

            if self.buf_pos != self.buffer.len() {
                done = self.buffer.len() - self.buf_pos;
                self.buf_pos = 0;
                self.buffer.clear();
            }

            if done < size {
                done += fd::splice_all(self.fd, fd::devnull(), size - done);
                if done < size {
                    self.eof = true;
                }
            }

            self.read += done as u32;
        }
    }

    /// Forward the current packet to `sink`, consuming it.
    ///
    /// Only whole packets move: a no-op once any payload has been read, or
    /// after end of stream. The header goes first (suppressed for raw
    /// sinks), then the body over the cheapest path: `splice` when either
    /// end is a pipe, `sendfile` from a seekable source, buffered
    /// read-and-write otherwise. A short write on the sink discards the
    /// rest of the packet from the source; the source itself stays usable.
    pub fn pass(&mut self, sink: &mut Sink) {
        // Cannot pass a packet whose data has already been read.
        if self.read != 0 || self.eof {
            return;
        }

        if !sink.is_raw() && !fd::write_all(sink.fd(), &self.pkt.to_bytes()) {
            // Error on sink.
            self.discard();
            return;
        }

        let size = self.pkt.size as usize;
        let mut done = 0;

        if !self.buffer.is_empty() {
            if !fd::write_all(sink.fd(), &self.buffer[..]) {
                // Error on sink.
                self.discard();
                return;
            }

            done = self.buffer.len();
            self.buf_pos = 0;
            self.buffer.clear();
        }

        if done < size {
            if self.fifo || sink.is_fifo() {
                done += fd::splice_all(self.fd, sink.fd(), size - done);
            } else if self.seekable {
                done += fd::sendfile_all(self.fd, sink.fd(), size - done);
            } else {
                self.buffer.resize(size - done, 0);
                let n = fd::read_all(self.fd, &mut self.buffer);
                fd::write_all(sink.fd(), &self.buffer[..n]);
                self.buffer.clear();
                self.buf_pos = 0;
                done += n;
            }
        }

        self.read = done as u32;

        if done < size {
            // Possible error on sink during splice/sendfile.
            self.discard();
        }

        if !sink.is_fifo() {
            fd::datasync(sink.fd());
        }
    }

    /// Duplicate the current packet to `sink`, keeping the payload readable
    /// on the source.
    ///
    /// Only whole packets: a no-op once any payload has been read, or after
    /// end of stream. When both ends are pipes the body is `tee`'d and the
    /// duplicated bytes pulled into the side-buffer, so later
    /// [`recv`](Source::recv) calls still see the full payload. A pipe or
    /// otherwise unseekable source buffers the whole body instead; a
    /// seekable source moves the bytes and seeks back, leaving the file
    /// offset unchanged.
    pub fn copy(&mut self, sink: &mut Sink) {
        // Cannot copy a packet whose data has already been read.
        if self.read != 0 || self.eof {
            return;
        }

        if !sink.is_raw() && !fd::write_all(sink.fd(), &self.pkt.to_bytes()) {
            // Error on sink.
            return;
        }

        let size = self.pkt.size as usize;
        let mut done = 0;

        if !self.buffer.is_empty() {
            if !fd::write_all(sink.fd(), &self.buffer[..]) {
                // Error on sink.
                return;
            }

            done = self.buffer.len();
        }

        self.buf_pos = 0;

        if self.fifo && sink.is_fifo() {
            // Both ends are pipes: tee, then pull the duplicated bytes into
            // the side-buffer to advance the pipe. The final chunk stays in
            // the pipe for recv to read directly.
            while done < size {
                let copied = fd::tee_once(self.fd, sink.fd(), size - done);
                if copied <= 0 {
                    // EOF, or an error occurred.
                    return;
                }
                let copied = copied as usize;
                done += copied;

                if done < size {
                    let old = self.buffer.len();
                    self.buffer.resize(old + copied, 0);
                    if fd::read_all(self.fd, &mut self.buffer[old..]) < copied {
                        // Error on source.
                        return;
                    }
                }
            }
        } else if (self.fifo || !self.seekable) && done < size {
            // Sink is not a pipe or the source cannot seek: buffer the body
            // before writing, and keep the buffer for the caller.
            let old = self.buffer.len();
            let want = size - done;
            self.buffer.resize(old + want, 0);

            let n = fd::read_all(self.fd, &mut self.buffer[old..]);
            fd::write_all(sink.fd(), &self.buffer[old..old + n]);
            done += n;

            if done < size {
                // EOF, or an error occurred.
                self.buffer.truncate(old + n);
            }
        } else if done < size {
            // Seekable source: move the data and seek back.
            let sent = if sink.is_fifo() {
                fd::splice_all(self.fd, sink.fd(), size - done)
            } else {
                fd::sendfile_all(self.fd, sink.fd(), size - done)
            };

            fd::seek(self.fd, -(sent as i64), libc::SEEK_CUR);
        }

        if !sink.is_fifo() {
            fd::datasync(sink.fd());
        }
    }
}

//! File descriptor classification and low-level byte moving.
//!
//! The transport decides between `splice`, `tee`, `sendfile`, seeks, and
//! plain buffered I/O from two predicates computed once per descriptor:
//! is it pipe-like, and does it seek.

use std::os::fd::RawFd;
use std::sync::OnceLock;

/// True when the descriptor refers to a pipe or a Unix-domain socket.
///
/// These are the descriptors `splice` and `tee` can move bytes through
/// without copying into user space.
pub fn is_fifo(fd: RawFd) -> bool {
    // SAFETY: fstat only writes into the stat buffer we hand it.
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    // SAFETY: see above.
    if unsafe { libc::fstat(fd, &mut st) } != 0 {
        return false;
    }
    let fmt = st.st_mode & libc::S_IFMT;
    fmt == libc::S_IFIFO || fmt == libc::S_IFSOCK
}

/// True when the descriptor admits positioning queries.
pub fn is_seekable(fd: RawFd) -> bool {
    // SAFETY: lseek has no memory-safety preconditions.
    unsafe { libc::lseek(fd, 0, libc::SEEK_CUR) >= 0 }
}

/// Process-wide write descriptor to the bit bucket, opened on first use and
/// never closed. Used to splice away unwanted pipe bytes.
pub(crate) fn devnull() -> RawFd {
    static DEVNULL: OnceLock<RawFd> = OnceLock::new();
    // SAFETY: the path is a valid NUL-terminated string.
    *DEVNULL.get_or_init(|| unsafe { libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY) })
}

/// Reposition the descriptor. Thin lseek wrapper; errors surface as -1.
pub(crate) fn seek(fd: RawFd, offset: i64, whence: libc::c_int) -> i64 {
    // SAFETY: lseek has no memory-safety preconditions.
    unsafe { libc::lseek(fd, offset, whence) }
}

/// One read(2), as much as is available.
pub(crate) fn read_once(fd: RawFd, buf: &mut [u8]) -> isize {
    // SAFETY: the buffer outlives the call and the length matches.
    unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) }
}

/// Read until the buffer is full, EOF, or an error. Returns bytes read.
pub(crate) fn read_all(fd: RawFd, buf: &mut [u8]) -> usize {
    let mut done = 0;
    while done < buf.len() {
        let r = read_once(fd, &mut buf[done..]);
        if r <= 0 {
            break;
        }
        done += r as usize;
    }
    done
}

/// Write the whole buffer. False on a short write.
pub(crate) fn write_all(fd: RawFd, buf: &[u8]) -> bool {
    let mut done = 0;
    while done < buf.len() {
        // SAFETY: the buffer outlives the call and the length matches.
        let w = unsafe {
            libc::write(
                fd,
                buf[done..].as_ptr() as *const libc::c_void,
                buf.len() - done,
            )
        };
        if w <= 0 {
            break;
        }
        done += w as usize;
    }
    done == buf.len()
}

/// Splice up to `size` bytes between descriptors, one of which must be a
/// pipe. Returns bytes moved; short on EOF or error.
pub(crate) fn splice_all(src: RawFd, dst: RawFd, size: usize) -> usize {
    let mut moved = 0;
    while moved < size {
        // SAFETY: null offsets mean both descriptors use their own position.
        let s = unsafe {
            libc::splice(
                src,
                std::ptr::null_mut(),
                dst,
                std::ptr::null_mut(),
                size - moved,
                libc::SPLICE_F_MOVE,
            )
        };
        if s <= 0 {
            break;
        }
        moved += s as usize;
    }
    moved
}

/// Send up to `size` bytes from a seekable descriptor. Returns bytes sent.
pub(crate) fn sendfile_all(src: RawFd, dst: RawFd, size: usize) -> usize {
    let mut size = size;
    let mut sent = 0;
    while sent < size {
        // SAFETY: a null offset makes sendfile use the source position.
        let s = unsafe { libc::sendfile(dst, src, std::ptr::null_mut(), size - sent) };
        if s < 0 {
            // EOVERFLOW means the transfer would cross the maximum offset;
            // retrying one byte shorter converges.
            if std::io::Error::last_os_error().raw_os_error() == Some(libc::EOVERFLOW) && size > 0 {
                size -= 1;
                continue;
            }
            break;
        }
        if s == 0 {
            break;
        }
        sent += s as usize;
    }
    sent
}

/// One tee(2): duplicate up to `size` bytes from one pipe into another
/// without consuming them.
pub(crate) fn tee_once(src: RawFd, dst: RawFd, size: usize) -> isize {
    // SAFETY: tee has no memory-safety preconditions.
    unsafe { libc::tee(src, dst, size, 0) }
}

/// Wait for readability. Timeout in milliseconds; -1 blocks, 0 peeks.
pub(crate) fn poll_in(fd: RawFd, timeout_ms: i32) -> bool {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: poll reads one pollfd and writes its revents.
    unsafe { libc::poll(&mut pfd, 1, timeout_ms) > 0 }
}

/// Flush a non-pipe sink's data to its backing store.
pub(crate) fn datasync(fd: RawFd) {
    // SAFETY: fdatasync has no memory-safety preconditions.
    unsafe { libc::fdatasync(fd) };
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::os::fd::AsRawFd;

    use super::*;
    use crate::tests::pipe;

    #[test]
    fn classify_pipe() {
        let (r, w) = pipe();
        assert!(is_fifo(r.as_raw_fd()));
        assert!(is_fifo(w.as_raw_fd()));
        assert!(!is_seekable(r.as_raw_fd()));
        assert!(!is_seekable(w.as_raw_fd()));
    }

    #[test]
    fn classify_file() -> anyhow::Result<()> {
        let mut f = tempfile::tempfile()?;
        f.write_all(b"hello")?;
        assert!(!is_fifo(f.as_raw_fd()));
        assert!(is_seekable(f.as_raw_fd()));
        Ok(())
    }

    #[test]
    fn classify_socket() -> anyhow::Result<()> {
        let (a, _b) = std::os::unix::net::UnixStream::pair()?;
        assert!(is_fifo(a.as_raw_fd()));
        assert!(!is_seekable(a.as_raw_fd()));
        Ok(())
    }

    #[test]
    fn pipe_byte_moving() {
        let (r1, w1) = pipe();
        let (r2, w2) = pipe();
        assert!(write_all(w1.as_raw_fd(), b"abcdef"));
        assert_eq!(splice_all(r1.as_raw_fd(), w2.as_raw_fd(), 6), 6);
        let mut buf = [0u8; 6];
        assert_eq!(read_all(r2.as_raw_fd(), &mut buf), 6);
        assert_eq!(&buf, b"abcdef");
    }

    #[test]
    fn devnull_accepts_bytes() {
        assert!(write_all(devnull(), b"gone"));
    }
}

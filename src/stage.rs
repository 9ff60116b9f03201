//! Common startup for the stage executables.

/// Prepare a stage process.
///
/// Restores the kernel-default SIGPIPE disposition — the Rust runtime
/// ignores it, but a pipeline stage wants a closed downstream pipe to end
/// the process like any other EOF — and installs the stderr logger.
pub fn init() {
    // SAFETY: resetting a signal disposition to the default involves no
    // handler code and no shared state.
    unsafe { libc::signal(libc::SIGPIPE, libc::SIG_DFL) };

    stderrlog::new().init().ok();
}

/// The stage's argument tokens, program name excluded.
pub fn args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

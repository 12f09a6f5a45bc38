//! Interactive suspend (Ctrl-Z) notification.
//!
//! The shell does not stop on SIGTSTP. It prints a short notice and keeps
//! reading; children are unaffected because the disposition is reset on exec.

use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd;
use std::os::fd::BorrowedFd;

const SUSPEND_NOTICE: &[u8] = b"\n=Ctrl+Z pressed\n";

extern "C" fn on_suspend(_signal: libc::c_int) {
    // Only async-signal-safe calls here: a raw write to fd 1.
    let out = unsafe { BorrowedFd::borrow_raw(libc::STDOUT_FILENO) };
    let _ = unistd::write(out, SUSPEND_NOTICE);
}

/// Install the SIGTSTP handler for the rest of the process lifetime.
///
/// `sigaction` keeps the handler armed after each delivery, and `SA_RESTART`
/// lets a blocking read or wait resume instead of failing with EINTR.
pub fn install_suspend_handler() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_suspend),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { signal::sigaction(Signal::SIGTSTP, &action) }?;
    Ok(())
}

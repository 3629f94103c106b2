//! Self-pipe used to park the event loop and wake it from any thread.
//!
//! The loop blocks in `poll(2)` on the read end; [`Notifier::notify`] writes a
//! single byte to the write end. Only the first notification after a drain
//! touches the pipe, later ones are absorbed by the `armed` flag.

use libc::{
    EAGAIN, EINTR, EWOULDBLOCK, F_GETFD, F_GETFL, F_SETFD, F_SETFL, FD_CLOEXEC, O_NONBLOCK, POLLIN,
    c_int, close, fcntl, pipe, poll, pollfd, read, write,
};
use parking_lot::Mutex;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub(crate) struct Notifier {
    read_fd: c_int,
    write_fd: c_int,
    armed: AtomicBool,
    // serializes concurrent drains; the loop is the only reader in practice
    draining: Mutex<()>,
}

impl Notifier {
    pub(crate) fn new() -> io::Result<Self> {
        let mut fds = [0 as c_int; 2];

        if unsafe { pipe(fds.as_mut_ptr()) } < 0 {
            return Err(io::Error::last_os_error());
        }

        let notifier = Self {
            read_fd: fds[0],
            write_fd: fds[1],
            armed: AtomicBool::new(false),
            draining: Mutex::new(()),
        };

        for fd in fds {
            set_nonblocking(fd)?;
            set_cloexec(fd)?;
        }

        Ok(notifier)
    }

    /// Wakes a loop parked in [`Notifier::wait`]. Safe to call from any thread.
    pub(crate) fn notify(&self) {
        if self.armed.swap(true, Ordering::AcqRel) {
            return;
        }

        let byte = 1u8;
        let res = unsafe { write(self.write_fd, &byte as *const u8 as *const _, 1) };

        // A full pipe already guarantees the reader will wake up.
        if res < 0 {
            let err = errno();
            if err != EAGAIN && err != EWOULDBLOCK {
                self.armed.store(false, Ordering::Release);
            }
        }
    }

    /// Blocks until notified or until `timeout` elapses (`None` blocks indefinitely).
    ///
    /// Returns whether a notification was consumed.
    pub(crate) fn wait(&self, timeout: Option<Duration>) -> io::Result<bool> {
        let mut fd = pollfd {
            fd: self.read_fd,
            events: POLLIN,
            revents: 0,
        };

        let timeout_ms = match timeout {
            Some(duration) => {
                // round up so a sub-millisecond deadline does not spin
                let ms = duration.as_nanos().div_ceil(1_000_000);
                ms.min(c_int::MAX as u128) as c_int
            }
            None => -1,
        };

        let res = unsafe { poll(&mut fd, 1, timeout_ms) };

        if res < 0 {
            if errno() == EINTR {
                return Ok(false);
            }

            return Err(io::Error::last_os_error());
        }

        if res == 0 || fd.revents & POLLIN == 0 {
            return Ok(false);
        }

        self.drain();

        Ok(true)
    }

    fn drain(&self) {
        let _guard = self.draining.lock();
        let mut buf = [0u8; 64];

        loop {
            let res = unsafe { read(self.read_fd, buf.as_mut_ptr() as *mut _, buf.len()) };
            if res <= 0 {
                break;
            }
        }

        self.armed.store(false, Ordering::Release);
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        unsafe {
            close(self.read_fd);
            close(self.write_fd);
        }
    }
}

fn set_nonblocking(fd: c_int) -> io::Result<()> {
    let flags = unsafe { fcntl(fd, F_GETFL) };
    if flags < 0 || unsafe { fcntl(fd, F_SETFL, flags | O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

fn set_cloexec(fd: c_int) -> io::Result<()> {
    let flags = unsafe { fcntl(fd, F_GETFD) };
    if flags < 0 || unsafe { fcntl(fd, F_SETFD, flags | FD_CLOEXEC) } < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

fn errno() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn wait_times_out_without_notification() {
        let notifier = Notifier::new().unwrap();

        let start = Instant::now();
        let notified = notifier.wait(Some(Duration::from_millis(20))).unwrap();

        assert!(!notified);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn notify_before_wait_is_not_lost() {
        let notifier = Notifier::new().unwrap();
        notifier.notify();
        notifier.notify();

        assert!(notifier.wait(Some(Duration::from_secs(5))).unwrap());
        // drained: the next wait times out again
        assert!(!notifier.wait(Some(Duration::from_millis(1))).unwrap());
    }

    #[test]
    fn notify_from_another_thread() {
        let notifier = Arc::new(Notifier::new().unwrap());
        let remote = notifier.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.notify();
        });

        assert!(notifier.wait(Some(Duration::from_secs(5))).unwrap());
        handle.join().unwrap();
    }
}

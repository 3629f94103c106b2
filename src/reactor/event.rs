//! Generic "wait for an event" built on [`Async`].
//!
//! A blocking primitive that wants to park a fiber without handing out the
//! fiber itself calls [`event_wait`]. It receives an [`EventTicket`] while the
//! event is armed, stores it wherever the waker will find it, and is resumed
//! once someone calls [`EventTicket::signal`].

use crate::runtime::fiber::Wakeup;
use crate::sync::signal::{Async, Resume};

/// Wake handle for one pending [`event_wait`].
///
/// Signalling a ticket whose wait already ended is a no-op.
#[derive(Clone, Debug)]
pub(crate) struct EventTicket(Async<()>);

impl EventTicket {
    pub(crate) fn signal(&self) {
        self.0.signal(());
    }
}

/// Parks the current fiber until its ticket is signalled or the fiber is
/// interrupted. `on_start` runs once the event is armed.
pub(crate) async fn event_wait<F>(on_start: F) -> Wakeup
where
    F: FnOnce(EventTicket),
{
    let event = Async::<()>::new();

    match event.wait_with(|armed| on_start(EventTicket(armed.clone()))).await {
        Resume::Value(_) => Ok(()),
        Resume::Raise(reason) => Err(reason),
    }
}

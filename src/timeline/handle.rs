use crate::foundation::core::TimeMs;

/// Teardown handle of a running scheduler session.
///
/// Sessions fire their deferred events only when polled with the controller's elapsed sample.
/// `teardown` cancels everything still outstanding and must be safe to call more than once.
pub trait SessionHandle {
    /// Fire every event due at or before `elapsed`.
    fn poll(&mut self, elapsed: TimeMs);
    /// Cancel outstanding events and release resources. Returns how many events were cancelled;
    /// later calls return 0.
    fn teardown(&mut self) -> usize;
    /// True once `teardown` ran.
    fn is_torn_down(&self) -> bool;
    /// Deferred events still outstanding.
    fn pending(&self) -> usize;
}

//! Monotonic time source

/// Monotonic clock counting milliseconds since device boot
///
/// Implementations must never go backwards. Wrapping is not expected
/// within the lifetime of a device (a `u64` of milliseconds covers
/// several hundred million years).
pub trait Clock {
    /// Milliseconds elapsed since boot
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

//! A generic “mutex” trait and implementations for the usual execution contexts.

use core::cell::RefCell;

/// Common interface for mutex-like wrappers.
///
/// `lock` must hold exclusive access for the whole closure and must not be
/// re-entered from inside it.
pub trait PortMutex {
    type Port;

    fn create(port: Self::Port) -> Self;

    fn lock<R, F: FnOnce(&mut Self::Port) -> R>(&self, f: F) -> R;

    fn into_inner(self) -> Self::Port;
}

/// A simple single-threaded “mutex” using `RefCell`.
///
/// Suitable for many embedded-hal use-cases in a single execution context.
impl<T> PortMutex for RefCell<T> {
    type Port = T;

    fn create(port: Self::Port) -> Self {
        RefCell::new(port)
    }

    fn lock<R, F: FnOnce(&mut Self::Port) -> R>(&self, f: F) -> R {
        let mut borrowed = self.borrow_mut();
        f(&mut borrowed)
    }

    fn into_inner(self) -> Self::Port {
        RefCell::into_inner(self)
    }
}

/// Interrupt-safe sharing on bare metal.
#[cfg(feature = "critical-section")]
impl<T> PortMutex for critical_section::Mutex<RefCell<T>> {
    type Port = T;

    fn create(port: Self::Port) -> Self {
        critical_section::Mutex::new(RefCell::new(port))
    }

    fn lock<R, F: FnOnce(&mut Self::Port) -> R>(&self, f: F) -> R {
        critical_section::with(|cs| {
            let mut borrowed = self.borrow(cs).borrow_mut();
            f(&mut borrowed)
        })
    }

    fn into_inner(self) -> Self::Port {
        critical_section::Mutex::into_inner(self).into_inner()
    }
}

/// Sharing across threads on hosted targets.
#[cfg(any(test, feature = "std"))]
impl<T> PortMutex for std::sync::Mutex<T> {
    type Port = T;

    fn create(port: Self::Port) -> Self {
        std::sync::Mutex::new(port)
    }

    fn lock<R, F: FnOnce(&mut Self::Port) -> R>(&self, f: F) -> R {
        // Poison is ignored: every `set` starts by driving the master low.
        let mut guard = std::sync::Mutex::lock(self).unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    fn into_inner(self) -> Self::Port {
        std::sync::Mutex::into_inner(self).unwrap_or_else(|e| e.into_inner())
    }
}

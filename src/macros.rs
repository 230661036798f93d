/// Helper macro for locking items
///
/// ```rust, ignore
///  let mut data = lock!(my_mutex);
///  data.some_field = 42;
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().expect("Failed to acquire lock")
    };
}

/// Helper macro for waiting on a condition variable with a held guard
///
/// ```rust, ignore
///  guard = wait!(self.condvar, guard);
/// ```
macro_rules! wait {
    ($condvar:expr, $guard:expr) => {
        $condvar.wait($guard).expect("Failed to re-acquire lock")
    };
}

use core::sync::atomic::{AtomicBool, Ordering};

/// Single writer (BLE event handling), single reader (main loop).
///
/// Disconnects are latched until the loop takes them, so a connection that
/// opens and drops between two snapshots is still seen as a disconnect.
pub struct ConnectionManager {
    connected: AtomicBool,
    dropped: AtomicBool,
}

impl ConnectionManager {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            dropped: AtomicBool::new(false),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        if connected {
            self.connected.store(true, Ordering::Release);
        } else if self.connected.swap(false, Ordering::AcqRel) {
            self.dropped.store(true, Ordering::Release);
        }
    }

    pub fn snapshot(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// True once per disconnect since the previous call.
    pub fn take_dropped(&self) -> bool {
        self.dropped.swap(false, Ordering::AcqRel)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    JustConnected,
    JustDisconnected,
    SteadyConnected,
    SteadyDisconnected,
}

impl Transition {
    pub fn classify(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => Transition::JustConnected,
            (true, false) => Transition::JustDisconnected,
            (true, true) => Transition::SteadyConnected,
            (false, false) => Transition::SteadyDisconnected,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConnectionTracker {
    previous: bool,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self { previous: false }
    }

    pub fn previous(&self) -> bool {
        self.previous
    }

    /// Classifies `current` against the last observation and remembers it.
    /// `dropped` reports a disconnect latched since then; a connection the
    /// loop never saw still counts as one that just ended.
    pub fn observe(&mut self, current: bool, dropped: bool) -> Transition {
        let previous = self.previous || (dropped && !current);
        let transition = Transition::classify(previous, current);
        self.previous = current;
        transition
    }
}

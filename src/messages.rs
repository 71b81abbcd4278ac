use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_sync::watch::Watch;

use crate::battery::BATTERY_TEXT_LEN;
use crate::connection::ConnectionManager;
use crate::led::Alert;
use crate::meeting::LedState;

pub const MEETING_STATE_RECEIVERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Meeting(LedState),
    Battery([u8; BATTERY_TEXT_LEN]),
}

// Connection flag, written by the peripheral, read by the indicator loop
pub static CONNECTION: ConnectionManager = ConnectionManager::new();

// Channel declarations
pub static MEETING_STATE_WATCH: Watch<CriticalSectionRawMutex, LedState, MEETING_STATE_RECEIVERS> =
    Watch::new();
pub static ALERT_CHANNEL: Channel<CriticalSectionRawMutex, Alert, 1> = Channel::new();
pub static ALERT_DONE: Signal<CriticalSectionRawMutex, ()> = Signal::new();
pub static NOTIFY_CHANNEL: Channel<CriticalSectionRawMutex, Notification, 4> = Channel::new();
pub static ADVERTISE_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

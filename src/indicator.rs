use embassy_time::{Duration, Timer};
use log::*;

use crate::battery::{encode_percentage, BatteryCalibration, BatterySensor, BATTERY_TEXT_LEN};
use crate::config::{ADVERTISING_GRACE, NOTIFY_PACING};
use crate::connection::{ConnectionTracker, Transition};
use crate::led::Alert;
use crate::meeting::LedState;
use crate::messages::{
    Notification, ADVERTISE_SIGNAL, ALERT_CHANNEL, ALERT_DONE, CONNECTION, MEETING_STATE_WATCH,
    NOTIFY_CHANNEL,
};

/// Everything the loop needs from the outside world.
#[allow(async_fn_in_trait)]
pub trait Platform {
    fn is_connected(&self) -> bool;
    /// Whether a disconnect happened since the last call.
    fn take_dropped(&mut self) -> bool;
    fn led_state(&self) -> LedState;
    fn read_battery_raw(&mut self) -> u16;

    async fn notify_meeting(&mut self, state: LedState);
    async fn notify_battery(&mut self, text: [u8; BATTERY_TEXT_LEN]);
    /// Fire-and-forget; the outcome is never checked.
    async fn restart_advertising(&mut self);
    /// Returns once the whole pattern has played.
    async fn play_alert(&mut self, alert: Alert);
    async fn pause(&mut self, duration: Duration);
}

pub struct Indicator<P> {
    platform: P,
    tracker: ConnectionTracker,
    calibration: BatteryCalibration,
}

impl<P: Platform> Indicator<P> {
    pub fn new(platform: P, calibration: BatteryCalibration) -> Self {
        Self {
            platform,
            tracker: ConnectionTracker::new(),
            calibration,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn previous(&self) -> bool {
        self.tracker.previous()
    }

    pub async fn tick(&mut self) -> Transition {
        let current = self.platform.is_connected();
        let dropped = self.platform.take_dropped();
        let transition = self.tracker.observe(current, dropped);

        match transition {
            Transition::JustConnected => {
                info!("[Indicator] Central connected");
                self.platform.play_alert(Alert::Connected).await;
            }
            Transition::JustDisconnected => {
                info!("[Indicator] Central disconnected, restarting advertising");
                self.platform.pause(ADVERTISING_GRACE).await;
                self.platform.restart_advertising().await;
                self.platform.play_alert(Alert::Disconnected).await;
            }
            Transition::SteadyConnected => self.notify_cycle().await,
            Transition::SteadyDisconnected => {
                debug!("[Indicator] Waiting for a central");
                self.platform.play_alert(Alert::Waiting).await;
            }
        }

        transition
    }

    async fn notify_cycle(&mut self) {
        let state = self.platform.led_state();
        self.platform.notify_meeting(state).await;
        self.platform.pause(NOTIFY_PACING).await;

        let raw = self.platform.read_battery_raw();
        let percentage = self.calibration.percentage(raw);
        debug!("[Indicator] Battery raw={} -> {}%", raw, percentage);
        self.platform.notify_battery(encode_percentage(percentage)).await;
        self.platform.pause(NOTIFY_PACING).await;
    }

    /// Ticks forever.
    pub async fn run(&mut self) {
        info!("[Indicator] Main loop started");
        loop {
            self.tick().await;
        }
    }
}

/// [`Platform`] backed by the shared channels in [`crate::messages`].
pub struct SignalPlatform<S> {
    battery: S,
}

impl<S: BatterySensor> SignalPlatform<S> {
    pub fn new(battery: S) -> Self {
        Self { battery }
    }

    fn push(&self, notification: Notification) {
        if let Err(e) = NOTIFY_CHANNEL.try_send(notification) {
            warn!("[Indicator] Notification queue full, dropping {:?}", e);
        }
    }
}

impl<S: BatterySensor> Platform for SignalPlatform<S> {
    fn is_connected(&self) -> bool {
        CONNECTION.snapshot()
    }

    fn take_dropped(&mut self) -> bool {
        CONNECTION.take_dropped()
    }

    fn led_state(&self) -> LedState {
        MEETING_STATE_WATCH.try_get().unwrap_or_default()
    }

    fn read_battery_raw(&mut self) -> u16 {
        self.battery.read_raw()
    }

    async fn notify_meeting(&mut self, state: LedState) {
        self.push(Notification::Meeting(state));
    }

    async fn notify_battery(&mut self, text: [u8; BATTERY_TEXT_LEN]) {
        self.push(Notification::Battery(text));
    }

    async fn restart_advertising(&mut self) {
        ADVERTISE_SIGNAL.signal(());
    }

    async fn play_alert(&mut self, alert: Alert) {
        ALERT_DONE.reset();
        ALERT_CHANNEL.send(alert).await;
        ALERT_DONE.wait().await;
    }

    async fn pause(&mut self, duration: Duration) {
        Timer::after(duration).await;
    }
}

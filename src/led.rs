use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::watch::Receiver;
use embassy_time::{Duration, Instant, Timer};
use log::*;

use crate::config::{ALERT_PHASE, ALERT_REPETITIONS, WAITING_PHASE};
use crate::meeting::LedState;
use crate::messages::{ALERT_CHANNEL, ALERT_DONE, MEETING_STATE_WATCH, MEETING_STATE_RECEIVERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedChannel {
    Warm,
    Cold,
}

/// Digital output for the two LED channels.
pub trait LedOutput {
    fn set(&mut self, channel: LedChannel, on: bool);
}

/// One step of an alert: both channel levels, held for `hold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkFrame {
    pub cold: bool,
    pub warm: bool,
    pub hold: Duration,
}

impl BlinkFrame {
    const fn new(cold: bool, warm: bool, hold: Duration) -> Self {
        Self { cold, warm, hold }
    }
}

const WAITING_FRAMES: [BlinkFrame; 4] = [
    BlinkFrame::new(true, false, WAITING_PHASE),
    BlinkFrame::new(true, true, WAITING_PHASE),
    BlinkFrame::new(false, true, WAITING_PHASE),
    BlinkFrame::new(false, false, WAITING_PHASE),
];

const fn both_toggle_frames() -> [BlinkFrame; 2 * ALERT_REPETITIONS] {
    let mut frames = [BlinkFrame::new(false, false, ALERT_PHASE); 2 * ALERT_REPETITIONS];
    let mut i = 0;
    while i < ALERT_REPETITIONS {
        frames[2 * i] = BlinkFrame::new(true, true, ALERT_PHASE);
        i += 1;
    }
    frames
}

const TOGGLE_FRAMES: [BlinkFrame; 2 * ALERT_REPETITIONS] = both_toggle_frames();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    Waiting,
    Connected,
    Disconnected,
}

impl Alert {
    pub fn frames(self) -> &'static [BlinkFrame] {
        match self {
            Alert::Waiting => &WAITING_FRAMES,
            Alert::Connected | Alert::Disconnected => &TOGGLE_FRAMES,
        }
    }

    pub fn duration(self) -> Duration {
        self.frames()
            .iter()
            .fold(Duration::from_ticks(0), |total, frame| total + frame.hold)
    }
}

/// Owns the pins and the persisted [`LedState`].
///
/// Alerts only drive the pins transiently. State requests that arrive while
/// an alert plays are recorded and shown by [`LedDriver::finish_alert`].
pub struct LedDriver<O> {
    output: O,
    state: LedState,
    alert_active: bool,
}

impl<O: LedOutput> LedDriver<O> {
    pub fn new(mut output: O) -> Self {
        output.set(LedChannel::Cold, false);
        output.set(LedChannel::Warm, false);
        Self {
            output,
            state: LedState::Off,
            alert_active: false,
        }
    }

    pub fn state(&self) -> LedState {
        self.state
    }

    pub fn alert_active(&self) -> bool {
        self.alert_active
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Returns `false` for redundant requests, which leave the pins untouched.
    pub fn apply(&mut self, state: LedState) -> bool {
        if state == self.state {
            return false;
        }
        self.state = state;
        if !self.alert_active {
            self.write(state.is_on(), state.is_on());
        }
        true
    }

    pub fn begin_alert(&mut self) {
        self.alert_active = true;
    }

    pub fn show(&mut self, frame: &BlinkFrame) {
        self.write(frame.cold, frame.warm);
    }

    pub fn finish_alert(&mut self) {
        self.alert_active = false;
        let on = self.state.is_on();
        self.write(on, on);
    }

    fn write(&mut self, cold: bool, warm: bool) {
        self.output.set(LedChannel::Cold, cold);
        self.output.set(LedChannel::Warm, warm);
    }
}

async fn play_alert<O: LedOutput>(
    leds: &mut LedDriver<O>,
    alert: Alert,
    state_receiver: &mut Receiver<'_, CriticalSectionRawMutex, LedState, MEETING_STATE_RECEIVERS>,
) {
    leds.begin_alert();
    for frame in alert.frames() {
        leds.show(frame);
        let deadline = Instant::now() + frame.hold;
        loop {
            match select(Timer::at(deadline), state_receiver.changed()).await {
                Either::First(_) => break,
                Either::Second(state) => {
                    if leds.apply(state) {
                        debug!("[LED] Meeting state {:?} deferred until alert ends", state);
                    }
                }
            }
        }
    }
    leds.finish_alert();
}

pub async fn led_task<O: LedOutput>(leds: &mut LedDriver<O>) {
    let mut state_receiver = MEETING_STATE_WATCH
        .receiver()
        .expect("[LED] Meeting state Watch receiver returned None - watch not initialized");
    let alert_receiver = ALERT_CHANNEL.receiver();

    // Restarted after being dropped mid-alert: show the persisted state again
    if leds.alert_active() {
        warn!("[LED] Previous alert was interrupted, restoring meeting state");
        leds.finish_alert();
    }
    ALERT_CHANNEL.clear();

    loop {
        match select(state_receiver.changed(), alert_receiver.receive()).await {
            Either::First(state) => {
                if leds.apply(state) {
                    info!("[LED] Meeting state set to {:?}", state);
                }
            }
            Either::Second(alert) => {
                info!("[LED] Playing {:?} alert", alert);
                play_alert(leds, alert, &mut state_receiver).await;
                ALERT_DONE.signal(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingOutput {
        writes: Vec<(LedChannel, bool)>,
        cold: bool,
        warm: bool,
    }

    impl LedOutput for RecordingOutput {
        fn set(&mut self, channel: LedChannel, on: bool) {
            self.writes.push((channel, on));
            match channel {
                LedChannel::Cold => self.cold = on,
                LedChannel::Warm => self.warm = on,
            }
        }
    }

    fn driver() -> LedDriver<RecordingOutput> {
        let mut leds = LedDriver::new(RecordingOutput::default());
        leds.output.writes.clear();
        leds
    }

    #[test]
    fn starts_off_with_both_pins_low() {
        let leds = LedDriver::new(RecordingOutput::default());
        assert_eq!(leds.state(), LedState::Off);
        assert_eq!(
            leds.output().writes,
            vec![(LedChannel::Cold, false), (LedChannel::Warm, false)]
        );
    }

    #[test]
    fn repeated_apply_writes_once() {
        let mut leds = driver();
        assert!(leds.apply(LedState::On));
        assert!(!leds.apply(LedState::On));
        assert_eq!(
            leds.output().writes,
            vec![(LedChannel::Cold, true), (LedChannel::Warm, true)]
        );
        assert_eq!(leds.state(), LedState::On);
    }

    #[test]
    fn redundant_off_is_a_noop() {
        let mut leds = driver();
        assert!(!leds.apply(LedState::Off));
        assert!(leds.output().writes.is_empty());
    }

    #[test]
    fn alert_restores_persisted_state() {
        let mut leds = driver();
        leds.apply(LedState::On);
        leds.begin_alert();
        for frame in Alert::Connected.frames() {
            leds.show(frame);
        }
        // last toggle frame leaves both pins low
        assert!(!leds.output().cold && !leds.output().warm);
        leds.finish_alert();
        assert!(leds.output().cold && leds.output().warm);
        assert_eq!(leds.state(), LedState::On);
    }

    #[test]
    fn request_during_alert_is_deferred() {
        let mut leds = driver();
        leds.begin_alert();
        leds.show(&Alert::Waiting.frames()[0]);
        let writes_before = leds.output().writes.len();

        assert!(leds.apply(LedState::On));
        assert_eq!(leds.output().writes.len(), writes_before);
        assert_eq!(leds.state(), LedState::On);

        leds.finish_alert();
        assert!(!leds.alert_active());
        assert!(leds.output().cold && leds.output().warm);
    }

    #[test]
    fn waiting_steps_cold_then_warm() {
        let levels: Vec<(bool, bool)> = Alert::Waiting
            .frames()
            .iter()
            .map(|frame| (frame.cold, frame.warm))
            .collect();
        assert_eq!(
            levels,
            vec![(true, false), (true, true), (false, true), (false, false)]
        );
        assert!(Alert::Waiting
            .frames()
            .iter()
            .all(|frame| frame.hold == Duration::from_secs(2)));
    }

    #[test]
    fn connect_and_disconnect_toggle_both_four_times() {
        for alert in [Alert::Connected, Alert::Disconnected] {
            let frames = alert.frames();
            assert_eq!(frames.len(), 8);
            for pair in frames.chunks(2) {
                assert!(pair[0].cold && pair[0].warm);
                assert!(!pair[1].cold && !pair[1].warm);
                assert_eq!(pair[0].hold, Duration::from_secs(1));
                assert_eq!(pair[1].hold, Duration::from_secs(1));
            }
        }
    }

    #[test]
    fn every_alert_lasts_eight_seconds() {
        for alert in [Alert::Waiting, Alert::Connected, Alert::Disconnected] {
            assert_eq!(alert.duration(), Duration::from_secs(8));
        }
    }
}

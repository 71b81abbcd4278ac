use esp_hal::analog::adc::{Adc, AdcPin};
use esp_hal::gpio::{Level, Output};
use esp_hal::peripherals::{ADC1, GPIO1};
use esp_hal::Blocking;
use log::*;

use crate::battery::BatterySensor;
use crate::led::{LedChannel, LedOutput};

/// Warm and cold LED channels on two push-pull outputs.
pub struct DualLed<'d> {
    warm: Output<'d>,
    cold: Output<'d>,
}

impl<'d> DualLed<'d> {
    pub fn new(warm: Output<'d>, cold: Output<'d>) -> Self {
        Self { warm, cold }
    }
}

impl LedOutput for DualLed<'_> {
    fn set(&mut self, channel: LedChannel, on: bool) {
        let output = match channel {
            LedChannel::Warm => &mut self.warm,
            LedChannel::Cold => &mut self.cold,
        };
        output.set_level(Level::from(on));
    }
}

/// Battery divider sampled through ADC1 on GPIO1.
pub struct AdcBatterySensor {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    pin: AdcPin<GPIO1<'static>, ADC1<'static>>,
}

impl AdcBatterySensor {
    pub fn new(
        adc: Adc<'static, ADC1<'static>, Blocking>,
        pin: AdcPin<GPIO1<'static>, ADC1<'static>>,
    ) -> Self {
        Self { adc, pin }
    }
}

impl BatterySensor for AdcBatterySensor {
    fn read_raw(&mut self) -> u16 {
        match nb::block!(self.adc.read_oneshot(&mut self.pin)) {
            Ok(raw) => raw,
            Err(e) => {
                // Reads as an empty battery rather than stalling the loop
                warn!("[Battery] ADC read failed: {:?}", e);
                0
            }
        }
    }
}

use core::fmt::Write as _;

use heapless::String;

/// Width of the ASCII percentage payload, e.g. `"100.00"` or `" 42.50"`.
pub const BATTERY_TEXT_LEN: usize = 6;

/// Source of raw battery samples.
pub trait BatterySensor {
    fn read_raw(&mut self) -> u16;
}

/// Converter constants for the battery sense divider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryCalibration {
    /// Largest value the converter returns.
    pub full_scale: u16,
    /// Voltage at `full_scale`.
    pub reference_voltage: f32,
    /// Compensates the external resistive divider.
    pub divider_factor: f32,
    /// Empirical correction added to the reconstructed voltage.
    pub offset: f32,
    pub empty_voltage: f32,
    pub full_voltage: f32,
}

impl BatteryCalibration {
    /// Battery voltage for a raw sample. Samples above `full_scale` saturate.
    pub fn voltage(&self, raw: u16) -> f32 {
        let raw = raw.min(self.full_scale);
        (raw as f32 / self.full_scale as f32) * self.reference_voltage * self.divider_factor
            + self.offset
    }

    /// Charge level in percent, always within `[0, 100]`.
    pub fn percentage(&self, raw: u16) -> f32 {
        let voltage = self.voltage(raw);
        if voltage <= self.empty_voltage {
            return 0.0;
        }
        if voltage >= self.full_voltage {
            return 100.0;
        }
        linear_map(voltage, self.empty_voltage, self.full_voltage, 0.0, 100.0).clamp(0.0, 100.0)
    }
}

pub fn linear_map(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Fixed width ASCII rendering with two decimals.
pub fn encode_percentage(percentage: f32) -> [u8; BATTERY_TEXT_LEN] {
    let mut text: String<BATTERY_TEXT_LEN> = String::new();
    let mut out = [b' '; BATTERY_TEXT_LEN];

    if write!(text, "{:>6.2}", percentage.clamp(0.0, 100.0)).is_err() {
        log::warn!("[Battery] Could not format {} as percentage", percentage);
        out[BATTERY_TEXT_LEN - 4..].copy_from_slice(b"0.00");
        return out;
    }

    let bytes = text.as_bytes();
    out[BATTERY_TEXT_LEN - bytes.len()..].copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BATTERY_CALIBRATION;

    fn raw_for_voltage(calibration: &BatteryCalibration, voltage: f32) -> u16 {
        let fraction = (voltage - calibration.offset)
            / (calibration.reference_voltage * calibration.divider_factor);
        (fraction * calibration.full_scale as f32) as u16
    }

    #[test]
    fn zero_sample_is_offset_only_and_empty() {
        let calibration = BATTERY_CALIBRATION;
        assert!((calibration.voltage(0) - 0.52).abs() < 1e-6);
        assert_eq!(calibration.percentage(0), 0.0);
    }

    #[test]
    fn full_scale_sample_is_full() {
        let calibration = BATTERY_CALIBRATION;
        // 3.3 * 2 + 0.52 = 7.12 V, well above 4.2 V
        assert_eq!(calibration.percentage(4095), 100.0);
        assert_eq!(calibration.percentage(u16::MAX), 100.0);
    }

    #[test]
    fn percentage_stays_in_range_and_never_decreases() {
        let calibration = BATTERY_CALIBRATION;
        let mut last = 0.0;
        for raw in 0..=calibration.full_scale {
            let percentage = calibration.percentage(raw);
            assert!((0.0..=100.0).contains(&percentage), "raw {raw} -> {percentage}");
            assert!(percentage >= last, "raw {raw}: {percentage} < {last}");
            last = percentage;
        }
    }

    #[test]
    fn thresholds_clamp_exactly() {
        let calibration = BATTERY_CALIBRATION;
        let below_empty = raw_for_voltage(&calibration, 2.7);
        let above_full = raw_for_voltage(&calibration, 4.3);
        assert_eq!(calibration.percentage(below_empty), 0.0);
        assert_eq!(calibration.percentage(above_full), 100.0);
    }

    #[test]
    fn midpoint_maps_linearly() {
        let calibration = BatteryCalibration {
            full_scale: 1000,
            reference_voltage: 1.0,
            divider_factor: 4.0,
            offset: 0.0,
            empty_voltage: 3.0,
            full_voltage: 4.0,
        };
        // 875 / 1000 * 4 = 3.5 V, halfway between empty and full
        assert!((calibration.percentage(875) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn linear_map_interpolates() {
        assert_eq!(linear_map(5.0, 0.0, 10.0, 0.0, 100.0), 50.0);
        assert_eq!(linear_map(0.0, 0.0, 10.0, 20.0, 40.0), 20.0);
        assert_eq!(linear_map(10.0, 0.0, 10.0, 20.0, 40.0), 40.0);
    }

    #[test]
    fn encodes_fixed_width_text() {
        assert_eq!(&encode_percentage(100.0), b"100.00");
        assert_eq!(&encode_percentage(42.5), b" 42.50");
        assert_eq!(&encode_percentage(0.0), b"  0.00");
        assert_eq!(&encode_percentage(7.126), b"  7.13");
    }

    #[test]
    fn encoding_clamps_out_of_range_input() {
        assert_eq!(&encode_percentage(250.0), b"100.00");
        assert_eq!(&encode_percentage(-3.0), b"  0.00");
    }
}

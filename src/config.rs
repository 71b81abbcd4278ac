use bt_hci::uuid::descriptors;
use embassy_time::Duration;
use trouble_host::prelude::*;

use crate::battery::{BatteryCalibration, BATTERY_TEXT_LEN};
use crate::meeting::MEETING_OFF;

// Configuration constants
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
pub const DEVICE_NAME: &str = "MeetingSignal";
pub const DEVICE_ADDRESS: [u8; 6] = [0xff, 0x8f, 0x1b, 0x05, 0xe4, 0x4d];

// Max connections and channels
pub const CONNECTIONS_MAX: usize = 1;
pub const L2CAP_CHANNELS_MAX: usize = 2; // Signal + att

// BLE UUIDs
pub const MEETING_SERVICE: u128 = 0x4fafc2011fb5459e8fccc5c9c331914b;
pub const MEETING_STATE_CHARACTERISTIC: u128 = 0xbeb5483e36e14688b7f5ea07361b26a8;
pub const BATTERY_LEVEL_CHARACTERISTIC: u16 = 0x2A19;

// Peripheral Connection Interval Range hint (1.25 ms units), helps iOS centrals
pub const AD_TYPE_CONNECTION_INTERVAL_RANGE: u8 = 0x12;
pub const PREFERRED_CONNECTION_INTERVAL_MIN: u16 = 0x06;
pub const PREFERRED_CONNECTION_INTERVAL_MAX: u16 = 0x12;

// Timing
/// Gap between consecutive notification pushes, the controller congests below this.
pub const NOTIFY_PACING: Duration = Duration::from_secs(2);
/// Settle time for the host stack after a disconnect before advertising again.
pub const ADVERTISING_GRACE: Duration = Duration::from_millis(500);
pub const WAITING_PHASE: Duration = Duration::from_secs(2);
pub const ALERT_PHASE: Duration = Duration::from_secs(1);
pub const ALERT_REPETITIONS: usize = 4;

// Battery calibration
pub const ADC_FULL_SCALE: u16 = 4095;
pub const ADC_REFERENCE_VOLTAGE: f32 = 3.3;
pub const BATTERY_DIVIDER_FACTOR: f32 = 2.0;
pub const BATTERY_CALIBRATION_OFFSET: f32 = 0.52;
pub const BATTERY_EMPTY_VOLTAGE: f32 = 2.8;
pub const BATTERY_FULL_VOLTAGE: f32 = 4.2;

pub const BATTERY_CALIBRATION: BatteryCalibration = BatteryCalibration {
    full_scale: ADC_FULL_SCALE,
    reference_voltage: ADC_REFERENCE_VOLTAGE,
    divider_factor: BATTERY_DIVIDER_FACTOR,
    offset: BATTERY_CALIBRATION_OFFSET,
    empty_voltage: BATTERY_EMPTY_VOLTAGE,
    full_voltage: BATTERY_FULL_VOLTAGE,
};

//GATT Server config

#[gatt_service(uuid = MEETING_SERVICE.to_le_bytes())]
pub struct MeetingService {
    #[descriptor(uuid = descriptors::CHARACTERISTIC_USER_DESCRIPTION, read, value = "Meeting state")]
    #[characteristic(uuid = MEETING_STATE_CHARACTERISTIC.to_le_bytes(), read, write, notify, indicate, value = MEETING_OFF)]
    pub meeting_state: u8,
    #[descriptor(uuid = descriptors::CHARACTERISTIC_USER_DESCRIPTION, read, value = "Battery level")]
    #[characteristic(uuid = BATTERY_LEVEL_CHARACTERISTIC.to_le_bytes(), read, notify, indicate)]
    pub battery_level: [u8; BATTERY_TEXT_LEN],
}

#[gatt_server]
pub struct Server {
    pub meeting_service: MeetingService,
}

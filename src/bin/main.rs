#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_futures::select::{select4, Either4};
use meeting_signal::bluetooth::ble_peripheral_task;
use meeting_signal::board::{AdcBatterySensor, DualLed};
use meeting_signal::config::{
    Server, BATTERY_CALIBRATION, CONNECTIONS_MAX, DEVICE_ADDRESS, DEVICE_NAME, L2CAP_CHANNELS_MAX,
    LOG_LEVEL,
};
use meeting_signal::indicator::{Indicator, SignalPlatform};
use meeting_signal::led::{led_task, LedDriver};

use bt_hci::{controller::ExternalController, uuid::appearance};

use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::timer::systimer::SystemTimer;
use esp_hal::timer::timg::TimerGroup;

use esp_wifi::ble::controller::BleConnector;

use log::*;

use embassy_executor::Spawner;

use esp_backtrace as _;
use trouble_host::Address;
use trouble_host::{
    gap::{GapConfig, PeripheralConfig},
    prelude::DefaultPacketPool,
    Host, HostResources,
};

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[esp_hal_embassy::main]
async fn main(_spawner: Spawner) {
    esp_println::logger::init_logger(LOG_LEVEL);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::_80MHz);
    let peripherals = esp_hal::init(config);

    let mut leds = {
        let warm = Output::new(peripherals.GPIO13, Level::Low, OutputConfig::default());
        let cold = Output::new(peripherals.GPIO12, Level::Low, OutputConfig::default());
        LedDriver::new(DualLed::new(warm, cold))
    };

    let battery = {
        let mut adc_config = AdcConfig::new();
        let pin = adc_config.enable_pin(peripherals.GPIO1, Attenuation::_11dB);
        AdcBatterySensor::new(Adc::new(peripherals.ADC1, adc_config), pin)
    };

    esp_alloc::heap_allocator!(size: 64 * 1024);

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);
    let rng = esp_hal::rng::Rng::new(peripherals.RNG);
    let timer1 = TimerGroup::new(peripherals.TIMG0);
    let wifi_init = esp_wifi::init(timer1.timer0, rng)
        .expect("[Main] Failed to initialize WIFI/BLE controller");

    let transport = BleConnector::new(&wifi_init, peripherals.BT);
    let controller = ExternalController::<_, 20>::new(transport);
    let address = Address::random(DEVICE_ADDRESS);

    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();
    let stack = trouble_host::new(controller, &mut resources).set_random_address(address);

    let server = match Server::new_with_config(GapConfig::Peripheral(PeripheralConfig {
        name: DEVICE_NAME,
        appearance: &appearance::power_device::GENERIC_POWER_DEVICE,
    })) {
        Ok(result) => result,
        Err(e) => {
            error!("[Main] Failed to setup GATT server: {:?}", e);
            return;
        }
    };

    let mut indicator = Indicator::new(SignalPlatform::new(battery), BATTERY_CALIBRATION);
    info!("[Main] Setup complete....");

    loop {
        let Host {
            mut runner,
            mut peripheral,
            ..
        } = stack.build();

        match select4(
            runner.run(),
            led_task(&mut leds),
            ble_peripheral_task(&server, &mut peripheral),
            indicator.run(),
        )
        .await
        {
            Either4::First(result) => match result {
                Ok(()) => info!("[Main] Runner Task ended."),
                Err(e) => error!("[Main] Runner task encounterd an error: {:?}", e),
            },
            Either4::Second(_) => {
                info!("[Main] Led Task ended.")
            }
            Either4::Third(_) => {
                info!("[Main] BLE Peripheral Task ended.")
            }
            Either4::Fourth(_) => {
                info!("[Main] Indicator loop ended.")
            }
        };
        info!("[Main] Restarting BLE host and tasks");
    }
}

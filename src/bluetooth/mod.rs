mod peripheral;

pub use peripheral::ble_peripheral_task;

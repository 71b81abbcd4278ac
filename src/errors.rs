use thiserror::Error;
use trouble_host::{BleHostError, Error};

#[derive(Error, Debug)]
pub enum PeripheralError<E>
where
    E: core::fmt::Debug, // Bound only on the inner error type
{
    #[error("Failed to create advertiser: {0:?}")]
    AdvertiserError(BleHostError<E>),

    #[error("Failed to encode advertising data")]
    AdStructureError,

    #[error("Failed to accept connection: {0:?}")]
    ConnectionError(Error),

    #[error("Failed to attach GATT server to connection: {0:?}")]
    GattConnectionError(Error),
}

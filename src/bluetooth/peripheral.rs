use embassy_futures::select::{select, Either};
use embedded_io::ErrorType;
use log::*;
use trouble_host::{
    gatt::{GattConnection, GattConnectionEvent, GattEvent},
    prelude::{
        AdStructure, Advertisement, AttErrorCode, DefaultPacketPool, Peripheral,
        BR_EDR_NOT_SUPPORTED, LE_GENERAL_DISCOVERABLE,
    },
    Controller, PacketPool,
};

use crate::{
    config::{
        Server, AD_TYPE_CONNECTION_INTERVAL_RANGE, DEVICE_NAME, MEETING_SERVICE,
        PREFERRED_CONNECTION_INTERVAL_MAX, PREFERRED_CONNECTION_INTERVAL_MIN,
    },
    errors::PeripheralError,
    meeting::{LedState, MeetingWrite},
    messages::{Notification, ADVERTISE_SIGNAL, CONNECTION, MEETING_STATE_WATCH, NOTIFY_CHANNEL},
};

/// Peripheral Connection Interval Range AD payload: min and max, little endian.
fn connection_interval_hint() -> [u8; 4] {
    let min = PREFERRED_CONNECTION_INTERVAL_MIN.to_le_bytes();
    let max = PREFERRED_CONNECTION_INTERVAL_MAX.to_le_bytes();
    [min[0], min[1], max[0], max[1]]
}

async fn advertise<'values, 'server, C>(
    name: &'values str,
    peripheral: &mut Peripheral<'values, C, DefaultPacketPool>,
    server: &'server Server<'values>,
) -> Result<
    GattConnection<'values, 'server, DefaultPacketPool>,
    PeripheralError<<C as ErrorType>::Error>,
>
where
    C: Controller,
{
    let mut advertiser_data = [0; 31];
    let adv_len = AdStructure::encode_slice(
        &[
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::ServiceUuids128(&[MEETING_SERVICE.to_le_bytes()]),
        ],
        &mut advertiser_data[..],
    )
    .map_err(|_| PeripheralError::AdStructureError)?;

    let interval_hint = connection_interval_hint();
    let mut scan_response_data = [0; 31];
    let scan_len = AdStructure::encode_slice(
        &[
            AdStructure::CompleteLocalName(name.as_bytes()),
            AdStructure::Unknown {
                ty: AD_TYPE_CONNECTION_INTERVAL_RANGE,
                data: &interval_hint,
            },
        ],
        &mut scan_response_data[..],
    )
    .map_err(|_| PeripheralError::AdStructureError)?;

    let advertiser = peripheral
        .advertise(
            &Default::default(),
            Advertisement::ConnectableScannableUndirected {
                adv_data: &advertiser_data[..adv_len],
                scan_data: &scan_response_data[..scan_len],
            },
        )
        .await
        .map_err(|e| PeripheralError::AdvertiserError(e))?;

    info!("[Peripheral] BLE advertising started...");

    let connection = advertiser
        .accept()
        .await
        .map_err(|e| PeripheralError::ConnectionError(e))?;

    let gatt_connection = connection
        .with_attribute_server(server)
        .map_err(|e| PeripheralError::GattConnectionError(e))?;

    // Anything queued for the previous central is stale
    NOTIFY_CHANNEL.clear();
    ADVERTISE_SIGNAL.reset();
    CONNECTION.set_connected(true);

    info!("[Peripheral] Central connection established");
    Ok(gatt_connection)
}

/// Stores the normalised status code so reads mirror the LED state.
fn store_meeting_state(server: &Server<'_>, state: LedState) {
    if let Err(e) = server.set(&server.meeting_service.meeting_state, &state.code()) {
        warn!("[Peripheral] Could not store meeting state: {:?}", e);
    }
}

async fn gatt_events_task<P: PacketPool>(
    server: &Server<'_>,
    gatt_connection: &GattConnection<'_, '_, P>,
) {
    let meeting_state = server.meeting_service.meeting_state;
    let sender = MEETING_STATE_WATCH.sender();

    let reason = loop {
        match gatt_connection.next().await {
            GattConnectionEvent::Disconnected { reason } => {
                CONNECTION.set_connected(false);
                break reason;
            }
            GattConnectionEvent::Gatt { event } => {
                let write = match &event {
                    GattEvent::Write(write) if write.handle() == meeting_state.handle => {
                        Some(MeetingWrite::from_payload(write.data()))
                    }
                    _ => None,
                };

                let reply = match write {
                    Some(write) if write.is_rejected() => {
                        warn!("[Peripheral] Rejecting oversized meeting state write");
                        event.reject(AttErrorCode::INVALID_ATTRIBUTE_VALUE_LENGTH)
                    }
                    _ => event.accept(),
                };
                match reply {
                    Ok(reply) => reply.send().await,
                    Err(e) => warn!("[Peripheral] Error sending GATT response: {:?}", e),
                };

                if let Some(write) = write {
                    let current = MEETING_STATE_WATCH.try_get().unwrap_or_default();
                    match write {
                        MeetingWrite::Apply(state) => {
                            info!("[Peripheral] Meeting state requested: {:?}", state);
                            sender.send(state);
                        }
                        MeetingWrite::Ignored => {
                            debug!("[Peripheral] Ignoring empty meeting state write")
                        }
                        MeetingWrite::Rejected => {}
                    }
                    // The attribute table may have taken the raw payload
                    store_meeting_state(server, write.stored_state(current));
                }
            }
            _ => {}
        }
    };
    info!("[Peripheral] GATT connection disconnected: {:?}", reason);
}

async fn gatt_notify_task<P: PacketPool>(
    server: &Server<'_>,
    gatt_connection: &GattConnection<'_, '_, P>,
) {
    let receiver = NOTIFY_CHANNEL.receiver();
    loop {
        let result = match receiver.receive().await {
            Notification::Meeting(state) => {
                server
                    .meeting_service
                    .meeting_state
                    .notify(gatt_connection, &state.code())
                    .await
            }
            Notification::Battery(text) => {
                server
                    .meeting_service
                    .battery_level
                    .notify(gatt_connection, &text)
                    .await
            }
        };

        if let Err(e) = result {
            error!("[Peripheral] Could not send notification: {:?}", e);
        }
    }
}

pub async fn ble_peripheral_task<'a, 'server, C>(
    server: &'server Server<'a>,
    peripheral: &mut Peripheral<'a, C, DefaultPacketPool>,
) where
    C: Controller,
{
    info!("[Peripheral] Starting advertising and GATT service");
    // A restarted host has no link, whatever the last run left behind
    CONNECTION.set_connected(false);
    loop {
        match advertise(DEVICE_NAME, peripheral, server).await {
            Ok(gatt_connection) => {
                match select(
                    gatt_events_task(server, &gatt_connection),
                    gatt_notify_task(server, &gatt_connection),
                )
                .await
                {
                    Either::First(_) => {
                        info!("[Peripheral] Gatt Event Task ended.")
                    }
                    Either::Second(_) => {
                        info!("[Peripheral] Gatt Notify Task ended.")
                    }
                }
                CONNECTION.set_connected(false);

                // The indicator loop decides when advertising resumes
                ADVERTISE_SIGNAL.wait().await;
            }
            Err(e) => {
                error!("[Peripheral] {:?}", e);
                continue;
            }
        }
    }
}

#![allow(clippy::unwrap_used)]
// UdpRadio against a fake radio daemon on loopback.

use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::UdpSocket;

use lorafeed_core::radio::DriverSettings;
use lorafeed_core::{Radio, RadioConfiguration, RadioEvent, UdpRadio, UdpRadioConfig};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn recv_json(socket: &UdpSocket) -> Value {
    let mut buf = vec![0u8; 8192];
    let len = tokio::time::timeout(TIMEOUT, socket.recv(&mut buf))
        .await
        .unwrap()
        .unwrap();
    serde_json::from_slice(&buf[..len]).unwrap()
}

async fn connected_pair() -> (UdpRadio, UdpSocket) {
    let daemon = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let radio = UdpRadio::bind(&UdpRadioConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        peer: daemon.local_addr().unwrap(),
    })
    .await
    .unwrap();
    daemon.connect(radio.local_addr().unwrap()).await.unwrap();
    (radio, daemon)
}

#[tokio::test]
async fn test_commands_reach_daemon() {
    let (mut radio, daemon) = connected_pair().await;
    let config = RadioConfiguration::default();

    radio
        .initialize(&DriverSettings::new(&config))
        .await
        .unwrap();
    let init = recv_json(&daemon).await;
    assert_eq!(init["command"], "initialize");
    assert_eq!(init["config"]["spreading_factor"], "SF7");
    assert_eq!(init["config"]["rx_payload_crc_on"], true);

    let _events = radio.receive(b"gw01").await.unwrap();
    let receive = recv_json(&daemon).await;
    assert_eq!(
        receive,
        json!({ "command": "receive", "address": [103, 119, 48, 49] })
    );
}

#[tokio::test]
async fn test_daemon_events_become_radio_events() {
    let (mut radio, daemon) = connected_pair().await;
    let mut events = radio.receive(b"gw01").await.unwrap();
    let _ = recv_json(&daemon).await;

    daemon.send(b"not json at all").await.unwrap();
    daemon
        .send(
            json!({
                "event": "received",
                "address": [110, 48, 49],
                "data": [116, 32, 50, 49],
                "snr": 6.5,
                "packet_rssi": -71,
                "rssi": -110
            })
            .to_string()
            .as_bytes(),
        )
        .await
        .unwrap();
    daemon
        .send(json!({ "event": "transmitted" }).to_string().as_bytes())
        .await
        .unwrap();

    let first = tokio::time::timeout(TIMEOUT, events.recv())
        .await
        .unwrap()
        .unwrap();
    let RadioEvent::Received(frame) = first else {
        panic!("expected a received frame, got {first:?}");
    };
    assert_eq!(frame.address, b"n01");
    assert_eq!(frame.data, b"t 21");
    assert_eq!(frame.link.packet_rssi, -71);

    let second = tokio::time::timeout(TIMEOUT, events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second, RadioEvent::Transmitted);
}

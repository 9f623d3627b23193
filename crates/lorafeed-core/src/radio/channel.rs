// In-process radio: frames are pushed through a `FrameInjector`.

use tokio::sync::mpsc;
use tracing::debug;

use crate::config::RadioConfiguration;
use crate::error::CoreError;
use crate::model::InboundFrame;

use super::{DriverSettings, EVENT_CHANNEL_CAPACITY, Radio, RadioEvent};

/// Radio backed by an mpsc channel.
///
/// Embedders (and tests) keep the paired [`FrameInjector`] and push
/// frames into it. Dropping every injector ends the event stream.
#[derive(Debug)]
pub struct ChannelRadio {
    events: Option<mpsc::Receiver<RadioEvent>>,
    initialized: Option<RadioConfiguration>,
    listen_address: Option<Vec<u8>>,
}

/// Sending half of a [`ChannelRadio`].
#[derive(Debug, Clone)]
pub struct FrameInjector {
    tx: mpsc::Sender<RadioEvent>,
}

impl ChannelRadio {
    pub fn new() -> (Self, FrameInjector) {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, FrameInjector) {
        let (tx, rx) = mpsc::channel(capacity);
        let radio = Self {
            events: Some(rx),
            initialized: None,
            listen_address: None,
        };
        (radio, FrameInjector { tx })
    }

    /// Configuration passed to the last `initialize`.
    pub fn initialized(&self) -> Option<&RadioConfiguration> {
        self.initialized.as_ref()
    }

    pub fn listen_address(&self) -> Option<&[u8]> {
        self.listen_address.as_deref()
    }
}

impl Radio for ChannelRadio {
    async fn initialize(&mut self, settings: &DriverSettings<'_>) -> Result<(), CoreError> {
        debug!(frequency = settings.radio.frequency, "channel radio initialised");
        self.initialized = Some(settings.radio.clone());
        Ok(())
    }

    async fn receive(&mut self, address: &[u8]) -> Result<mpsc::Receiver<RadioEvent>, CoreError> {
        if self.initialized.is_none() {
            return Err(CoreError::radio("receive called before initialize"));
        }
        self.listen_address = Some(address.to_vec());
        self.events
            .take()
            .ok_or_else(|| CoreError::radio("event stream already taken"))
    }
}

impl FrameInjector {
    /// Deliver a received frame.
    pub async fn inject(&self, frame: InboundFrame) -> Result<(), CoreError> {
        self.tx
            .send(RadioEvent::Received(frame))
            .await
            .map_err(|_| CoreError::RadioClosed)
    }

    /// Deliver a transmit-completion notification.
    pub async fn transmitted(&self) -> Result<(), CoreError> {
        self.tx
            .send(RadioEvent::Transmitted)
            .await
            .map_err(|_| CoreError::RadioClosed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::LinkQuality;

    #[tokio::test]
    async fn receive_requires_initialize() {
        let (mut radio, _injector) = ChannelRadio::new();
        let err = radio.receive(b"gw").await.unwrap_err();
        assert!(matches!(err, CoreError::Radio { .. }));
    }

    #[tokio::test]
    async fn injected_frames_arrive_in_order() {
        let (mut radio, injector) = ChannelRadio::new();
        let config = RadioConfiguration::default();
        radio.initialize(&DriverSettings::new(&config)).await.unwrap();
        let mut events = radio.receive(b"gw").await.unwrap();
        assert_eq!(radio.listen_address(), Some(&b"gw"[..]));

        let first = InboundFrame::new("a", "t 1", LinkQuality::default());
        injector.inject(first.clone()).await.unwrap();
        injector.transmitted().await.unwrap();
        drop(injector);

        assert_eq!(events.recv().await, Some(RadioEvent::Received(first)));
        assert_eq!(events.recv().await, Some(RadioEvent::Transmitted));
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test]
    async fn stream_is_handed_out_once() {
        let (mut radio, _injector) = ChannelRadio::new();
        let config = RadioConfiguration::default();
        radio.initialize(&DriverSettings::new(&config)).await.unwrap();
        radio.receive(b"gw").await.unwrap();
        assert!(radio.receive(b"gw").await.is_err());
    }

    #[tokio::test]
    async fn inject_after_radio_dropped_reports_closed() {
        let (radio, injector) = ChannelRadio::new();
        drop(radio);
        let err = injector
            .inject(InboundFrame::new("a", "t 1", LinkQuality::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RadioClosed));
    }
}

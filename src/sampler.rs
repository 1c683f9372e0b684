//! Continuous sampling on top of the forced-mode state machine.
//!
//! The [`Sampler`] wraps a [`Bme68x`] in an async mutex and splits operation
//! into a spawn-once worker future ([`Sampler::run`]) and control methods,
//! the same shape as the radio/network runners embassy applications spawn at
//! startup. [`Sampler::start`] begins a sampling session inside the worker,
//! [`Sampler::stop`] ends it and puts the device to sleep, and readings are
//! handed over through a single-slot channel: the producer waits until the
//! consumer has taken the previous reading, so delivery is in acquisition
//! order with at most one value in flight.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use embedded_hal_async::delay::DelayNs;

use crate::error::{Bme68xError, Result};
use crate::transport::Bme68xBus;
use crate::{Bme68x, Measurement};

/// Supervised continuous sampling around an exclusive device.
///
/// At most one sampling session is active per device. The device mutex
/// serializes every bus transaction between the session's cycles and
/// foreground [`Sampler::sense`] calls, so the bus never sees interleaved
/// cycles.
pub struct Sampler<M: RawMutex, B: Bme68xBus, D> {
    device: Mutex<M, Bme68x<B, D>>,
    /// Serializes start/stop so the termination handshake has one consumer.
    control: Mutex<M, ()>,
    /// Session requests picked up by the worker, carrying the interval.
    command: Signal<M, Duration>,
    /// Cancellation request for the active session.
    stop: Signal<M, ()>,
    /// Acknowledgement that a session has terminated.
    done: Signal<M, ()>,
    /// Error that permanently terminated a session.
    faults: Signal<M, Bme68xError<B::Error>>,
    /// Single-slot hand-off to the consumer.
    readings: Channel<M, Measurement, 1>,
    sampling: AtomicBool,
}

impl<M, B, D> Sampler<M, B, D>
where
    M: RawMutex,
    B: Bme68xBus,
    B::Error: Send,
    D: DelayNs,
{
    pub fn new(device: Bme68x<B, D>) -> Self {
        Sampler {
            device: Mutex::new(device),
            control: Mutex::new(()),
            command: Signal::new(),
            stop: Signal::new(),
            done: Signal::new(),
            faults: Signal::new(),
            readings: Channel::new(),
            sampling: AtomicBool::new(false),
        }
    }

    /// The worker future. Spawn it once; it never returns.
    ///
    /// Sessions requested via [`Sampler::start`] run inside this future. A
    /// session ends on [`Sampler::stop`], on a restart, or permanently on a
    /// transport error, which is published through [`Sampler::fault`].
    /// Sessions do not auto-restart.
    pub async fn run(&self) -> ! {
        loop {
            match select(self.command.wait(), self.stop.wait()).await {
                Either::First(interval) => {
                    let outcome = self.session(interval).await;
                    self.sampling.store(false, Ordering::Release);
                    if let Err(fault) = outcome {
                        self.faults.signal(fault);
                    }
                    self.done.signal(());
                }
                // A stop can land between sessions; it still gets its
                // acknowledgement so the requester never hangs.
                Either::Second(()) => self.done.signal(()),
            }
        }
    }

    /// Begins a sampling session with the given interval.
    ///
    /// A measurement runs immediately, then once per interval. If a session
    /// is already active it is stopped first and its termination awaited, so
    /// the new session's first cycle never overlaps the old one. A reading
    /// the previous session left undelivered is discarded.
    pub async fn start(&self, interval: Duration) {
        let _control = self.control.lock().await;
        if self.sampling.load(Ordering::Acquire) {
            self.done.reset();
            self.stop.signal(());
            self.done.wait().await;
        }
        while self.readings.try_receive().is_ok() {}
        self.stop.reset();
        self.sampling.store(true, Ordering::Release);
        self.command.signal(interval);
    }

    /// Stops the active session and puts the device to sleep.
    ///
    /// Idempotent: stopping while nothing runs is a no-op. The cancellation
    /// is observed at the session's interval wait and at a blocked publish,
    /// so shutdown never waits out a full extra cycle.
    pub async fn stop(&self) -> Result<(), B::Error> {
        let _control = self.control.lock().await;
        if !self.sampling.load(Ordering::Acquire) {
            return Ok(());
        }
        self.done.reset();
        self.stop.signal(());
        self.done.wait().await;
        let mut device = self.device.lock().await;
        device.sleep().await
    }

    /// Runs a one-shot measurement.
    ///
    /// Fails with [`Bme68xError::AlreadySampling`], without touching the
    /// bus, while a continuous session owns the device.
    pub async fn sense(&self) -> Result<Measurement, B::Error> {
        if self.sampling.load(Ordering::Acquire) {
            return Err(Bme68xError::AlreadySampling);
        }
        let mut device = self.device.lock().await;
        device.measure().await
    }

    /// Receives the next reading, in strict acquisition order.
    pub async fn next_reading(&self) -> Measurement {
        self.readings.receive().await
    }

    /// Waits for a session-terminating error.
    pub async fn fault(&self) -> Bme68xError<B::Error> {
        self.faults.wait().await
    }

    /// Whether a continuous session is active.
    pub fn is_sampling(&self) -> bool {
        self.sampling.load(Ordering::Acquire)
    }

    async fn session(&self, interval: Duration) -> Result<(), B::Error> {
        loop {
            // Exclusive device access for the measurement only; the lock is
            // released before the publish so a slow consumer cannot hold up
            // a foreground sense() any longer than the measurement itself.
            let reading = {
                let mut device = self.device.lock().await;
                device.measure().await?
            };

            // Hand-off: blocks while the slot is still occupied. A stop
            // request arriving here abandons the reading.
            match select(self.readings.send(reading), self.stop.wait()).await {
                Either::First(()) => {}
                Either::Second(()) => return Ok(()),
            }

            // The pause runs from the end of the cycle; slow consumers
            // stretch the effective period instead of causing overlap.
            match select(Timer::after(interval), self.stop.wait()).await {
                Either::First(()) => {}
                Either::Second(()) => return Ok(()),
            }
        }
    }
}

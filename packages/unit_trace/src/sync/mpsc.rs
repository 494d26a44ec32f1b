//! Bounded channel whose blocked senders and receivers are reported as
//! `chan send` and `chan receive`.

use std::panic::Location;

pub use tokio::sync::mpsc::error::{SendError, TryRecvError};

use crate::park::park_at;

pub fn channel<T>(buffer: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = tokio::sync::mpsc::channel(buffer);
    (Sender { inner: tx }, Receiver { inner: rx })
}

#[derive(Debug)]
pub struct Sender<T> {
    inner: tokio::sync::mpsc::Sender<T>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Sender<T> {
    #[track_caller]
    pub fn send(&self, value: T) -> impl Future<Output = Result<(), SendError<T>>> {
        park_at(
            "unit_trace::sync::mpsc::Sender::send",
            "chan send".to_string(),
            Location::caller(),
            self.inner.send(value),
        )
    }
}

#[derive(Debug)]
pub struct Receiver<T> {
    inner: tokio::sync::mpsc::Receiver<T>,
}

impl<T> Receiver<T> {
    #[track_caller]
    pub fn recv(&mut self) -> impl Future<Output = Option<T>> {
        park_at(
            "unit_trace::sync::mpsc::Receiver::recv",
            "chan receive".to_string(),
            Location::caller(),
            self.inner.recv(),
        )
    }

    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.inner.try_recv()
    }

    pub fn close(&mut self) {
        self.inner.close();
    }
}

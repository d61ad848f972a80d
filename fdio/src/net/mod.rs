//! Socket resources.
//!
//! This module provides [`StreamSocketServer`], a Unix-domain stream
//! listener. Accepted connections are plain [`Descriptor`](crate::Descriptor)s.
//!
//! The listener can be registered with a [`Monitor`](crate::Monitor): it
//! becomes readable when a connection is pending.
mod unix;

pub use unix::StreamSocketServer;

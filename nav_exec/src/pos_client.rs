//! # Position Client
//!
//! The position client requests fixes of the vehicle's marker from the position server (the
//! overhead camera).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::Utc;
use comms_if::{
    eqpt::pos::{PosFix, PosRequest, PosResponse},
    net::{self, zmq, NetError, SocketOptions},
};
use log::debug;

use crate::loc::{LocError, PositionSource};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The position client
pub struct PosClient {
    socket: zmq::Socket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PosClientError {
    #[error("Socket error: {0}")]
    SocketError(NetError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PosClient {
    /// Create a new client connected to the position server at `endpoint`.
    ///
    /// This does not block until the server is available. Each request waits at most
    /// `recv_timeout_ms` for the server's reply.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        recv_timeout_ms: i32,
    ) -> Result<Self, PosClientError> {
        let socket = net::create_socket(
            ctx,
            zmq::REQ,
            &SocketOptions::client(recv_timeout_ms),
            endpoint,
        )
        .map_err(PosClientError::SocketError)?;

        Ok(Self { socket })
    }
}

impl PositionSource for PosClient {
    fn get_fix(&mut self) -> Result<PosFix, LocError> {
        let response: PosResponse = net::request(&self.socket, &PosRequest::AcqFix)
            .map_err(|e| LocError::PositionUnavailable(format!("{}", e)))?;

        match response {
            PosResponse::Fix(f) => {
                let age_ms = Utc::now()
                    .signed_duration_since(f.timestamp)
                    .num_milliseconds();
                debug!(
                    "Position fix: ({:.3}, {:.3}) {:?}, {} ms old",
                    f.x, f.y, f.unit, age_ms
                );
                Ok(f)
            }
            PosResponse::NoFix => Err(LocError::PositionUnavailable(
                "the marker was not detected".into(),
            )),
            PosResponse::ServerError(e) => Err(LocError::PositionUnavailable(format!(
                "position server error: {}",
                e
            ))),
        }
    }
}

//! # Network Module
//!
//! This module provides networking abstractions over ZMQ, the networking library chosen for the
//! software. All equipment links are request-reply pairs carrying JSON strings.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use zmq::{Context, Socket, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network endpoints used by the navigation executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Endpoint of the position server (observer camera), which the client connects to.
    pub pos_endpoint: String,

    /// Endpoint of the mechanisms server (motor driver), which the client connects to.
    pub mech_endpoint: String,

    /// Endpoint the telecommand socket binds to.
    pub tc_endpoint: String,
}

/// Represents options which can be set on a socket.
///
/// Most options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Indicates if the socket should bind itself to the endpoint. Servers should have this value
    /// set as `true`, clients should have it set as `false`.
    pub bind: bool,

    /// `ZMQ_REQ_CORRELATE`: Match replies with requests
    pub req_correlate: bool,

    /// `ZMQ_REQ_RELAXED`: relax strict alternation between request and reply
    pub req_relaxed: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`: Set reconnection interval
    pub reconnect_ivl: i32,

    /// `ZMQ_CONNECT_TIMEOUT`: Set `connect()` timeout
    pub connect_timeout: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// `ZMQ_HEARTBEAT_IVL`: Set interval between sending ZMTP heartbeats
    pub heartbeat_ivl: i32,

    /// `ZMQ_HEARTBEAT_TIMEOUT`: Set timeout for ZMTP heartbeats
    pub heartbeat_timeout: i32,

    /// `ZMQ_HEARTBEAT_TTL`: Set the TTL (time to live) value for ZMTP heartbeats
    pub heartbeat_ttl: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not connect the socket to {0}: {1}")]
    CouldNotConnect(String, zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),

    #[error("Could not send the message: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message: {0}")]
    RecvError(zmq::Error),

    #[error("Timed out waiting for a message")]
    Timeout,

    #[error("Recieved a message which was not valid UTF-8")]
    NonUtf8Message,

    #[error("Could not serialize the data: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the message: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SocketOptions {
    /// Options suited to a client which must never block the control loop for long.
    ///
    /// `recv_timeout_ms` bounds how long a request waits for its reply.
    pub fn client(recv_timeout_ms: i32) -> Self {
        Self {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: recv_timeout_ms,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        }
    }

    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), NetError> {
        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_heartbeat_ivl, self.heartbeat_ivl),
            (set_heartbeat_timeout, self.heartbeat_timeout),
            (set_heartbeat_ttl, self.heartbeat_ttl),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        // If the socket is a req type set the req-specific options
        if let Ok(SocketType::REQ) = socket.get_socket_type() {
            set_sockopts!(
                socket,
                (set_req_correlate, self.req_correlate),
                (set_req_relaxed, self.req_relaxed)
            );
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // Defaults for sockopts taken from http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            connect_timeout: 0,
            heartbeat_ivl: 0,
            heartbeat_timeout: 0,
            heartbeat_ttl: 0,
            linger: 30_000,
            reconnect_ivl: 100,
            recv_timeout: -1,
            req_correlate: false,
            req_relaxed: false,
            send_timeout: -1,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a socket, apply the options and connect (or bind) it to the endpoint.
///
/// Connecting is asynchronous in ZMQ, so a client socket is returned before the server is
/// reachable. Requests made while the server is down time out rather than fail.
pub fn create_socket(
    ctx: &Context,
    socket_type: SocketType,
    options: &SocketOptions,
    endpoint: &str,
) -> Result<Socket, NetError> {
    let socket = ctx
        .socket(socket_type)
        .map_err(NetError::CreateSocketError)?;

    options.set(&socket)?;

    match options.bind {
        false => socket.connect(endpoint),
        true => socket.bind(endpoint),
    }
    .map_err(|e| NetError::CouldNotConnect(endpoint.into(), e))?;

    debug!(
        "{:?} socket {} {}",
        socket_type,
        if options.bind { "bound to" } else { "connecting to" },
        endpoint
    );

    Ok(socket)
}

/// Serialize a value to JSON and send it on the socket.
pub fn send_json<T: Serialize>(socket: &Socket, value: &T) -> Result<(), NetError> {
    let msg = serde_json::to_string(value).map_err(NetError::SerializationError)?;

    socket.send(&msg, 0).map_err(|e| match e {
        zmq::Error::EAGAIN => NetError::Timeout,
        e => NetError::SendError(e),
    })
}

/// Receive a JSON message from the socket.
///
/// Returns `Ok(None)` if no message arrived within the socket's receive timeout.
pub fn recv_json<T: DeserializeOwned>(socket: &Socket) -> Result<Option<T>, NetError> {
    let msg = match socket.recv_string(0) {
        Ok(Ok(s)) => s,
        Ok(Err(_)) => return Err(NetError::NonUtf8Message),
        Err(zmq::Error::EAGAIN) => return Ok(None),
        Err(e) => return Err(NetError::RecvError(e)),
    };

    serde_json::from_str(&msg)
        .map(Some)
        .map_err(NetError::DeserializeError)
}

/// Perform one request-reply exchange on a REQ socket.
///
/// A reply which doesn't arrive within the receive timeout is reported as
/// [`NetError::Timeout`]. The socket must have `req_relaxed` set so that the next request can be
/// sent after a timeout.
pub fn request<Req, Rep>(socket: &Socket, request: &Req) -> Result<Rep, NetError>
where
    Req: Serialize,
    Rep: DeserializeOwned,
{
    send_json(socket, request)?;

    match recv_json(socket)? {
        Some(r) => Ok(r),
        None => Err(NetError::Timeout),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    enum Ping {
        Ping(u32),
        Pong(u32),
    }

    #[test]
    fn test_inproc_request_reply() {
        let ctx = Context::new();

        let server = create_socket(
            &ctx,
            zmq::REP,
            &SocketOptions {
                bind: true,
                recv_timeout: 1000,
                ..Default::default()
            },
            "inproc://net_test_reqrep",
        )
        .unwrap();

        let client = create_socket(
            &ctx,
            zmq::REQ,
            &SocketOptions::client(1000),
            "inproc://net_test_reqrep",
        )
        .unwrap();

        send_json(&client, &Ping::Ping(7)).unwrap();

        let req: Option<Ping> = recv_json(&server).unwrap();
        assert_eq!(req, Some(Ping::Ping(7)));
        send_json(&server, &Ping::Pong(7)).unwrap();

        let rep: Option<Ping> = recv_json(&client).unwrap();
        assert_eq!(rep, Some(Ping::Pong(7)));
    }

    #[test]
    fn test_request_times_out_without_server() {
        let ctx = Context::new();

        let client = create_socket(
            &ctx,
            zmq::REQ,
            &SocketOptions::client(20),
            "tcp://127.0.0.1:59998",
        )
        .unwrap();

        let r: Result<Ping, _> = request(&client, &Ping::Ping(1));
        assert!(matches!(r, Err(NetError::Timeout)));
    }
}

//! # Telecommand Client

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{self, zmq, NetError, SocketOptions},
    tc::{NavTc, TcResponse},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telecommand client
pub struct TcClient {
    socket: zmq::Socket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TcClientError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not recieve a telecommand: {0}")]
    RecvError(NetError),

    #[error("Could not send the response: {0}")]
    SendError(NetError),

    #[error("Could not parse the recieved telecommand: {0}")]
    TcParseError(NetError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TcClient {
    /// Create a new instance of the TC Client, bound to `endpoint`.
    ///
    /// This function will not block until the server connects.
    pub fn new(ctx: &zmq::Context, endpoint: &str) -> Result<Self, TcClientError> {
        let socket_options = SocketOptions {
            bind: true,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = net::create_socket(ctx, zmq::REP, &socket_options, endpoint)
            .map_err(TcClientError::SocketError)?;

        Ok(Self { socket })
    }

    /// Recieve a single TC from the server.
    ///
    /// Call this in a loop until `Ok(None)` is returned, indicating that there are no more
    /// pending TCs right now.
    ///
    /// After recieving a valid TC a response must be sent using `.send_response()` before
    /// attempting to recieve another TC. If the TC could not be parsed the `Invalid` response is
    /// sent automatically by this function.
    pub fn receive_tc(&self) -> Result<Option<NavTc>, TcClientError> {
        match net::recv_json(&self.socket) {
            Ok(tc) => Ok(tc),
            Err(e @ NetError::NonUtf8Message) | Err(e @ NetError::DeserializeError(_)) => {
                self.send_response(TcResponse::Invalid)?;
                Err(TcClientError::TcParseError(e))
            }
            Err(e) => Err(TcClientError::RecvError(e)),
        }
    }

    /// Send the given response back to the server.
    pub fn send_response(&self, response: TcResponse) -> Result<(), TcClientError> {
        net::send_json(&self.socket, &response).map_err(TcClientError::SendError)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_receive_tcs() {
        let ctx = zmq::Context::new();
        let endpoint = "inproc://tc_client_test";

        let client = TcClient::new(&ctx, endpoint).unwrap();
        let server =
            net::create_socket(&ctx, zmq::REQ, &SocketOptions::client(1000), endpoint).unwrap();

        // Nothing pending
        assert!(client.receive_tc().unwrap().is_none());

        net::send_json(&server, &NavTc::Stop).unwrap();
        assert_eq!(client.receive_tc().unwrap(), Some(NavTc::Stop));
        client.send_response(TcResponse::Ok).unwrap();

        let rep: TcResponse = net::recv_json(&server).unwrap().unwrap();
        assert_eq!(rep, TcResponse::Ok);
    }

    #[test]
    fn test_invalid_tc() {
        let ctx = zmq::Context::new();
        let endpoint = "inproc://tc_client_invalid_test";

        let client = TcClient::new(&ctx, endpoint).unwrap();
        let server =
            net::create_socket(&ctx, zmq::REQ, &SocketOptions::client(1000), endpoint).unwrap();

        server.send(r#"{"Launch":{}}"#, 0).unwrap();
        assert!(matches!(
            client.receive_tc(),
            Err(TcClientError::TcParseError(_))
        ));

        let rep: TcResponse = net::recv_json(&server).unwrap().unwrap();
        assert_eq!(rep, TcResponse::Invalid);
    }
}

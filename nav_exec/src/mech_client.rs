//! # Mechanisms Client
//!
//! This module provides networking abstractions to connect to the mechanisms server, which drives
//! the motors.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::mech::{MechDemsResponse, WheelDems, WheelId},
    net::{self, zmq, NetError, SocketOptions},
};

use crate::drive_ctrl::{ActuatorError, MotorActuator};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct MechClient {
    dems_socket: zmq::Socket,

    /// The demands last sent to the server, used to send single wheel changes
    dems: WheelDems,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MechClientError {
    #[error("Socket error: {0}")]
    SocketError(NetError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MechClient {
    /// Create a new instance of the mechanisms client.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        recv_timeout_ms: i32,
    ) -> Result<Self, MechClientError> {
        let dems_socket = net::create_socket(
            ctx,
            zmq::REQ,
            &SocketOptions::client(recv_timeout_ms),
            endpoint,
        )
        .map_err(MechClientError::SocketError)?;

        Ok(Self {
            dems_socket,
            dems: WheelDems::stop(),
        })
    }
}

impl MotorActuator for MechClient {
    fn set_throttle(&mut self, wheel: WheelId, throttle: f64) -> Result<(), ActuatorError> {
        let mut dems = self.dems;
        dems.set(wheel, throttle);
        self.set_dems(&dems)
    }

    /// Send both wheel demands in a single request.
    fn set_dems(&mut self, dems: &WheelDems) -> Result<(), ActuatorError> {
        let response: MechDemsResponse = net::request(&self.dems_socket, dems)
            .map_err(|e| ActuatorError::CommsError(format!("{}", e)))?;

        match response {
            MechDemsResponse::DemsOk => {
                self.dems = *dems;
                Ok(())
            }
            MechDemsResponse::DemsInvalid => Err(ActuatorError::DemsRejected),
            MechDemsResponse::EqptInvalid => Err(ActuatorError::EqptInvalid),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn test_send_demands() {
        let ctx = zmq::Context::new();
        let endpoint = "inproc://mech_client_test";

        let server = net::create_socket(
            &ctx,
            zmq::REP,
            &SocketOptions {
                bind: true,
                recv_timeout: 2000,
                ..Default::default()
            },
            endpoint,
        )
        .unwrap();

        let handle = thread::spawn(move || {
            let mut received = Vec::new();
            for r in vec![
                MechDemsResponse::DemsOk,
                MechDemsResponse::DemsOk,
                MechDemsResponse::DemsInvalid,
                MechDemsResponse::EqptInvalid,
            ] {
                let dems: WheelDems = net::recv_json(&server).unwrap().unwrap();
                received.push(dems);
                net::send_json(&server, &r).unwrap();
            }
            received
        });

        let mut client = MechClient::new(&ctx, endpoint, 2000).unwrap();

        client
            .set_dems(&WheelDems {
                left: 0.5,
                right: -0.5,
            })
            .unwrap();

        // A single wheel change keeps the other wheel's last demand
        client.set_throttle(WheelId::Right, 0.25).unwrap();

        assert!(matches!(
            client.set_dems(&WheelDems::stop()),
            Err(ActuatorError::DemsRejected)
        ));
        assert!(matches!(
            client.set_dems(&WheelDems::stop()),
            Err(ActuatorError::EqptInvalid)
        ));

        let received = handle.join().unwrap();
        assert_eq!(received[0], WheelDems { left: 0.5, right: -0.5 });
        assert_eq!(received[1], WheelDems { left: 0.5, right: 0.25 });
        assert_eq!(received[2], WheelDems::stop());
    }

    #[test]
    fn test_no_server() {
        let ctx = zmq::Context::new();
        let mut client = MechClient::new(&ctx, "tcp://127.0.0.1:59996", 20).unwrap();

        assert!(matches!(
            client.set_dems(&WheelDems::stop()),
            Err(ActuatorError::CommsError(_))
        ));
    }
}

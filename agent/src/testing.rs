use std::{cell::RefCell, collections::VecDeque, time::Duration};

use bricks_common::{HardwareError, OneWirePort};

use crate::transport::{HttpResponse, Transport, TransportError};

/// Transport answering from a queue and recording every request it saw.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    pub requests: RefCell<Vec<Vec<(String, String)>>>,
}

impl ScriptedTransport {
    pub fn reply(self, body: &str) -> Self {
        self.responses.borrow_mut().push_back(Ok(HttpResponse {
            status: 200,
            body: body.to_string(),
        }));
        self
    }

    pub fn time_out(self) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(TransportError::Timeout {
                endpoint: "http://controller.test".to_string(),
                timeout: Duration::from_secs(30),
            }));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    async fn fetch(&self, params: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(params.to_vec());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left"))
    }
}

/// One-wire bus where only `28-a` answers.
pub struct FixedOneWire;

impl OneWirePort for FixedOneWire {
    fn read_temperature(&mut self, sensor_id: &str) -> Result<f64, HardwareError> {
        match sensor_id {
            "28-a" => Ok(18.5),
            _ => Err(HardwareError::NotFound {
                device: sensor_id.to_string(),
            }),
        }
    }
}

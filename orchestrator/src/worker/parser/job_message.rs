use omniqueue::Delivery;

use crate::error::event::{EventSystemError, EventSystemResult};
use crate::error::ConsumptionError;
use crate::types::jobs::JobMessage;
use crate::worker::traits::message::MessageParser;

/// Decode the JSON body of a delivery into a [`JobMessage`]
pub fn parse_job_message(payload: &[u8]) -> EventSystemResult<JobMessage> {
    serde_json::from_slice(payload).map_err(|e| EventSystemError::PayloadSerdeError(e.to_string()))
}

impl MessageParser for JobMessage {
    fn parse_message(message: &Delivery) -> EventSystemResult<Box<Self>> {
        let payload =
            message.borrow_payload().ok_or_else(|| ConsumptionError::Other("Empty payload".to_string()))?;
        Ok(Box::new(parse_job_message(payload)?))
    }
}

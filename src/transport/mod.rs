//! Transport layer: HTTP and wire-format details (serialization/deserialization).

mod response;
mod send_sms;

pub use send_sms::{REQUEST_ID_FIELD, encode_send_sms_form, request_id, serialize_form};

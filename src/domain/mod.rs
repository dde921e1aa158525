//! Domain layer: strong types with validation and invariants (no I/O).

mod options;
mod request;
mod response;
mod validation;
mod value;

pub(crate) use options::lock_flag;
pub use options::{GatewayOptions, OptionKey};
pub use request::{Recipient, SendOptions, SmsMessage};
pub use response::{FailureReason, GatewayResponse};
pub use validation::ValidationError;
pub use value::{MessageText, PhoneNumber, Sender};

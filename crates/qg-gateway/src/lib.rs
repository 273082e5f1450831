//! Signed, retrying request gateway for REST trading venues.
//!
//! Every venue call goes through [`Gateway`], which:
//! - signs POST bodies with the next credential in the rotation
//! - retries transient failures with exponential backoff
//! - optionally routes attempts through rotating egress tunnels
//! - bounds the whole attempt sequence by an overall deadline
//!
//! Pagination helpers accumulate offset/limit pages on top of single calls.

pub mod egress;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod nonce;
pub mod pagination;
pub mod retry;
pub mod signer;
pub mod state;
pub mod transport;

pub use egress::{CommandEgress, EgressRoute, EgressStrategy, RecordingEgress, StaticEgress};
pub use envelope::Envelope;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, GatewayConfig};
pub use nonce::{Clock, NonceManager, SystemClock};
pub use pagination::{collect_depth, collect_pages};
pub use retry::RetryPolicy;
pub use signer::{Credentials, SignedPayload, APIKEY_HEADER, PAYLOAD_HEADER, SIGNATURE_HEADER};
pub use state::GatewayState;
pub use transport::{
    BoxFuture, HttpMethod, HttpTransport, MockTransport, RawResponse, Transport, VenueRequest,
};

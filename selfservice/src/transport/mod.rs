mod connection;
mod errors;
mod response;

pub use connection::{Connection, Params, accept_language_headers, transport_security_warning};
pub use errors::TransportError;
pub use response::{RemoteErrorDetail, RemoteReply, RemoteResponse, RemoteResult, is_truthy};

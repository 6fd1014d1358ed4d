//! HTTP transport layer: request construction, the unary and streaming request
//! engines, and status classification.

mod http;
mod error;
mod reqwest;
pub mod endpoints;
mod request;
mod response;
mod api_client;

pub use http::{HttpTransport, HttpMethod, HttpRequest, HttpResponse, ChunkedStream, StreamingResponse};
pub use error::TransportError;
pub use reqwest::ReqwestTransport;
pub use request::{RequestBody, RequestBuilder, RequestDescriptor, SERVER_TIMEOUT_HEADER};
pub use response::{HttpEnvelope, ResponseParser};
pub use api_client::ApiClient;

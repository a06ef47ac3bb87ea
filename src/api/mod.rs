// Re-export the API module components
pub use self::{
    client::{ApiClient, API_KEY_HEADER},
    endpoints::{Endpoints, BASE_URL, SOCKET_URL, UPLOAD_URL},
    errors::ApiClientError,
    models::{JobStatus, ListenOutcome, UploadOutcome},
};

// Module declarations
mod client;
mod endpoints;
mod errors;
mod listen;
mod models;

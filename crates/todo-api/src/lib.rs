pub mod handlers;
pub mod models;
pub mod oauth;
pub mod responses;
pub mod router;
pub mod state;

pub use models::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
pub use router::route;
pub use state::AppState;

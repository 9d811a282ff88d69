mod fetch;
mod response;

pub use fetch::fetch;
pub use response::Response;

/// Builds the HTTP client shared by all requests of a provider.
pub fn build_client(user_agent: &str) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().user_agent(user_agent).build()
}

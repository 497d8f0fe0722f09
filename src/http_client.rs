use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const USER_AGENT: &str = concat!("gegenpress-companion/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

// The first caller's timeout wins; every caller reads it from the same config.
pub fn http_client(timeout: Duration) -> reqwest::Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
    })
}

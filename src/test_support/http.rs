use httpmock::prelude::*;
use httpmock::MockServer;

/// Start a fresh `httpmock::MockServer` instance for use in unit tests.
pub fn start_mock_server() -> MockServer {
    MockServer::start()
}

/// A mock origin serving each `(path, body)` pair with status 200.
pub fn asset_server(assets: &[(&str, &str)]) -> MockServer {
    let server = start_mock_server();
    for (path, body) in assets {
        server.mock(|when, then| {
            when.method(GET).path(*path);
            then.status(200).body(*body);
        });
    }
    server
}

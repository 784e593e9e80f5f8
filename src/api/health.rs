/// Liveness probe: responds as long as the server is running.
pub async fn ping() -> &'static str {
    "PONG"
}

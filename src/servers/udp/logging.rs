//! Logging for UDP Tracker requests and responses.
use std::net::SocketAddr;
use std::time::Duration;

use super::handlers::RequestId;
use super::protocol::request::Request;
use super::protocol::response::Response;
use super::UDP_TRACKER_LOG_TARGET;

pub fn log_request(request: &Request, request_id: &RequestId, server_socket_addr: &SocketAddr) {
    let action = map_action_name(request);
    let transaction_id = request.transaction_id();

    match request {
        Request::Connect(_) => {
            tracing::debug!(
                target: UDP_TRACKER_LOG_TARGET,
                %server_socket_addr, action, %transaction_id, %request_id, "request");
        }
        Request::Announce(announce_request) => {
            tracing::debug!(
                target: UDP_TRACKER_LOG_TARGET,
                %server_socket_addr,
                action,
                %transaction_id,
                %request_id,
                connection_id = %announce_request.connection_id,
                info_hash = %announce_request.info_hash,
                event = %announce_request.event,
                "request");
        }
        Request::Scrape(scrape_request) => {
            tracing::debug!(
                target: UDP_TRACKER_LOG_TARGET,
                %server_socket_addr,
                action,
                %transaction_id,
                %request_id,
                connection_id = %scrape_request.connection_id,
                torrents = scrape_request.info_hashes.len(),
                "request");
        }
    }
}

fn map_action_name(request: &Request) -> &'static str {
    match request {
        Request::Connect(_) => "CONNECT",
        Request::Announce(_) => "ANNOUNCE",
        Request::Scrape(_) => "SCRAPE",
    }
}

pub fn log_response(response: &Response, request_id: &RequestId, server_socket_addr: &SocketAddr, latency: Duration) {
    tracing::debug!(
        target: UDP_TRACKER_LOG_TARGET,
        %server_socket_addr,
        action = %response.action(),
        transaction_id = %response.transaction_id(),
        %request_id,
        latency_ms = %latency.as_millis(),
        "response");
}

pub fn log_dropped(request_id: &RequestId, server_socket_addr: &SocketAddr, latency: Duration) {
    tracing::debug!(
        target: UDP_TRACKER_LOG_TARGET,
        %server_socket_addr,
        %request_id,
        latency_ms = %latency.as_millis(),
        "dropped");
}

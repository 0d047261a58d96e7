use fleetlog::core::remote::{RemoteStore, RestRemote};
use fleetlog::errors::AppError;
use fleetlog::models::table::Table;
use serde_json::json;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

/// Read one HTTP request (headers + Content-Length body) off the socket.
fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|l| {
                    let (k, v) = l.split_once(':')?;
                    k.eq_ignore_ascii_case("content-length")
                        .then(|| v.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

/// One-shot server answering with `response`, then closing the connection.
fn serve_once(response: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        request
    });
    (url, handle)
}

#[test]
fn test_error_status_carries_body() {
    let (url, server) = serve_once(
        "HTTP/1.1 409 Conflict\r\nContent-Length: 9\r\nConnection: close\r\n\r\nduplicate",
    );
    let remote = RestRemote::new(&url, Some("k3y".into()), Duration::from_secs(5)).unwrap();

    let err = remote
        .insert(Table::Trips, &json!({"id": "t1", "agreed_price": 1000.0}))
        .unwrap_err();

    match err {
        AppError::RemoteStatus { status, body } => {
            assert_eq!(status, 409);
            assert_eq!(body, "duplicate");
        }
        other => panic!("unexpected error {other:?}"),
    }

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /rest/v1/trips"));
    assert!(request.contains("apikey: k3y"));
}

#[test]
fn test_unreadable_error_body_is_reported() {
    // the body is cut short: Content-Length promises more than is sent
    let (url, server) = serve_once(
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\nConnection: close\r\n\r\noops",
    );
    let remote = RestRemote::new(&url, None, Duration::from_secs(5)).unwrap();

    let err = remote.delete(Table::Expenses, "e1").unwrap_err();
    server.join().unwrap();

    match err {
        AppError::RemoteStatus { status, body } => {
            assert_eq!(status, 500);
            assert!(body.starts_with("<unreadable body:"), "body was {body:?}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_rest_remote_reachability() {
    let (url, server) = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
    let remote = RestRemote::new(&url, None, Duration::from_secs(5)).unwrap();
    // any answer counts, whatever the status
    assert!(remote.is_reachable());
    server.join().unwrap();

    // nobody listens here any more
    let closed = TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_url = format!("http://{}", closed.local_addr().unwrap());
    drop(closed);
    let remote = RestRemote::new(&dead_url, None, Duration::from_secs(2)).unwrap();
    assert!(!remote.is_reachable());
}

use serde_json::{json, Map, Value};
use smdbg::client::transport::{Endpoint, HttpTransport, Transport};
use smdbg::client::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Read one HTTP request from a socket, return its body.
async fn read_request(stream: &mut tokio::net::TcpStream) -> Vec<u8> {
    let mut data = vec![];
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before request end");
        data.extend_from_slice(&buf[..n]);

        let Some(headers_end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&data[..headers_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|len| len.trim().parse::<usize>().unwrap())
            .unwrap_or(0);

        let body_start = headers_end + 4;
        if data.len() >= body_start + content_length {
            return data[body_start..body_start + content_length].to_vec();
        }
    }
}

/// Serve exactly one request with given status line and body, return the request body.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
        serde_json::from_slice(&request).unwrap()
    });

    (format!("http://{addr}/api"), handle)
}

fn transport(url: &str) -> HttpTransport {
    HttpTransport::new(Endpoint::parse(url).unwrap())
}

#[tokio::test]
async fn test_call_success() {
    let (url, server) = serve_once("200 OK", r#"{"debugSessionId": "abc"}"#).await;
    let transport = transport(&format!("{url}#tools/dbg"));

    let mut args = Map::new();
    args.insert("trace".to_string(), json!(true));
    let response = transport.call("setTrace", args).await.unwrap();
    assert_eq!(response, json!({"debugSessionId": "abc"}));

    let request = server.await.unwrap();
    assert_eq!(
        request,
        json!({
            "trace": true,
            "address": {"target": "tools/dbg", "handler": "setTrace"},
        })
    );
}

#[tokio::test]
async fn test_exception_is_not_a_transport_error() {
    let (url, server) = serve_once("200 OK", r#"{"exception": {"detailMessage": "x"}}"#).await;

    let response = transport(&url).call("go", Map::new()).await.unwrap();
    assert!(response.get("exception").is_some());
    assert_eq!(
        server.await.unwrap()["address"],
        json!({"target": "debugger", "handler": "go"})
    );
}

#[tokio::test]
async fn test_server_status_error() {
    let (url, _server) = serve_once("500 Internal Server Error", "{}").await;

    let err = transport(&url).call("go", Map::new()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::ServerStatus { code: 500, ref message } if message == "Internal Server Error"
    ));
    assert!(!err.is_network());
}

#[tokio::test]
async fn test_server_status_keeps_reason_phrase() {
    let (url, _server) = serve_once("503 Debugger Is Busy", "{}").await;

    let err = transport(&url).call("go", Map::new()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::ServerStatus { code: 503, ref message } if message == "Debugger Is Busy"
    ));
}

#[tokio::test]
async fn test_malformed_response() {
    let (url, _server) = serve_once("200 OK", "not json").await;

    let err = transport(&url).call("go", Map::new()).await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[tokio::test]
async fn test_connection_refused() {
    // bind and drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let err = transport(&format!("http://{addr}/api"))
        .call("go", Map::new())
        .await
        .unwrap_err();
    assert!(err.is_network());
}

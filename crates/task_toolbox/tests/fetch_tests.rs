use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use reqwest::blocking::Client;
use task_toolbox::{FetchError, Fetcher};

/// Serve exactly one HTTP response on a loopback port.
fn serve_once(status_line: &'static str, body: &'static [u8]) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let address = listener.local_addr().expect("listener should have an address");

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("client should connect");
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut chunk).expect("request should be readable");
            if read == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..read]);
        }

        let head = format!(
            "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream
            .write_all(head.as_bytes())
            .expect("head should be written");
        stream.write_all(body).expect("body should be written");
    });

    (format!("http://{address}/exports/report.csv"), handle)
}

fn fetcher(temp_dir: PathBuf) -> Fetcher {
    let client = Client::builder()
        .no_proxy()
        .build()
        .expect("client should build");
    Fetcher::with_client(client).with_temp_dir(temp_dir)
}

#[test]
fn ok_response_is_written_and_reported_once() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let (url, server) = serve_once("200 OK", b"id,total\n1,42\n");
    let destination = dir.path().join("report.csv");

    let mut calls = Vec::new();
    let download = fetcher(dir.path().to_path_buf())
        .download_then(&url, Some(&destination), |source, path| {
            calls.push((source.to_string(), path.to_path_buf()));
        })
        .expect("download should succeed");
    server.join().expect("server thread should finish");

    assert_eq!(download.path, destination);
    assert_eq!(calls, vec![(url.clone(), destination.clone())]);
    assert_eq!(
        fs::read(&destination).expect("download should exist"),
        b"id,total\n1,42\n"
    );
}

#[test]
fn missing_destination_lands_in_temp_dir_with_extension() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let (url, server) = serve_once("200 OK", b"payload");

    let download = fetcher(dir.path().to_path_buf())
        .download(&url, None)
        .expect("download should succeed");
    server.join().expect("server thread should finish");

    assert_eq!(download.path.parent(), Some(dir.path()));
    assert_eq!(
        download.path.extension().and_then(|ext| ext.to_str()),
        Some("csv")
    );
    assert_eq!(fs::read(&download.path).expect("file should exist"), b"payload");
}

#[test]
fn non_ok_status_is_an_error_and_skips_callback() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let (url, server) = serve_once("404 Not Found", b"missing");
    let destination = dir.path().join("never.csv");

    let mut called = false;
    let error = fetcher(dir.path().to_path_buf())
        .download_then(&url, Some(&destination), |_, _| called = true)
        .expect_err("404 should fail");
    server.join().expect("server thread should finish");

    assert!(!called);
    assert!(matches!(error, FetchError::UnexpectedStatus { status: 404, .. }));
    assert!(!destination.exists());
}

//! End-to-end pipeline tests against an in-process HTTP server.
//!
//! A minimal HTTP/1.1 responder on a random local port plays the SOMS
//! endpoint, so the full chain (normalize → URL → request → extract →
//! CSV sinks) runs without any external service.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use soms_lookup::models::{Config, ExtractMode};
use soms_lookup::output::{RequestLog, ResultsWriter};
use soms_lookup::pipeline::{RunStats, run_lookup};
use soms_lookup::services::SomsClient;

// ---------------------------------------------------------------------------
// In-process SOMS stub
// ---------------------------------------------------------------------------

/// One-connection-per-request HTTP responder.
///
/// The responder closure maps a request target (`/path?query`) to a
/// `(status, body)` pair; returning `None` drops the socket without a
/// response to simulate a transport failure.
struct SomsStub {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl SomsStub {
    async fn spawn<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Option<(u16, String)> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };

                let head = read_head(&mut socket).await;
                let target = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or_default()
                    .to_string();
                seen.lock().unwrap().push(target.clone());

                match respond(&target) {
                    Some((status, body)) => {
                        let response = format!(
                            "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\n\
                             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                            reason(status),
                            body.len(),
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                    None => drop(socket),
                }
            }
        });

        Self { addr, requests }
    }

    fn base_url(&self) -> String {
        format!("http://{}/ws/BusquedaCliente", self.addr)
    }

    fn seen(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Read the request head; GET requests carry no body.
async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_config(base_url: &str, sleep_secs: u64, mode: ExtractMode) -> Config {
    let mut config = Config::default();
    config.endpoint.base_url = base_url.to_string();
    config.endpoint.id_usuario = "U1".to_string();
    config.runner.sleep_secs = sleep_secs;
    config.extract = mode;
    config
}

/// Response body with one client per `(id, nombre1, ap_pat)` triple.
fn clientes_body(clients: &[(&str, &str, &str)]) -> String {
    let clientes: Vec<_> = clients
        .iter()
        .map(|(id, nombre1, ap_pat)| {
            json!({"DatosSOMS": {"IdCliente": id, "Nombre1": nombre1, "Ap-Pat": ap_pat}})
        })
        .collect();
    json!({"BusquedaClienteResponse": {"Clientes": clientes}}).to_string()
}

/// Run the pipeline against the stub; returns stats plus both CSV bodies.
async fn run_against(
    stub: &SomsStub,
    entries: &[&str],
    mode: ExtractMode,
    sleep_secs: u64,
) -> (RunStats, String, String) {
    let dir = tempfile::TempDir::new().unwrap();
    let results_path = dir.path().join("output.csv");
    let log_path = dir.path().join("log_requests.csv");

    let config = test_config(&stub.base_url(), sleep_secs, mode);
    let soms = SomsClient::new(&config).unwrap();
    let mut results = ResultsWriter::create(&results_path, mode).unwrap();
    let mut audit = RequestLog::create(&log_path).unwrap();

    let entries: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
    let stats = run_lookup(&config, &soms, &entries, &mut results, &mut audit)
        .await
        .unwrap();

    let results_out = std::fs::read_to_string(&results_path).unwrap();
    let log_out = std::fs::read_to_string(&log_path).unwrap();
    (stats, results_out, log_out)
}

/// Parse CSV content into data records (header stripped).
fn rows(content: &str) -> Vec<csv::StringRecord> {
    csv::Reader::from_reader(content.as_bytes())
        .records()
        .map(|r| r.unwrap())
        .collect()
}

// Audit log column indexes.
const COL_RAW: usize = 0;
const COL_STATUS: usize = 6;
const COL_OK: usize = 7;
const COL_EXTRAIDOS: usize = 8;
const COL_ERROR: usize = 9;

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_entry_gets_exactly_one_audit_row() {
    // 2 successes, 2 invalid phones, 1 transport failure.
    let stub = SomsStub::spawn(|target| {
        if target.contains("telefono=12345678") {
            Some((200, clientes_body(&[("A1", "Ligia", "Caballero")])))
        } else if target.contains("telefono=71234567") {
            None // drop the connection mid-request
        } else {
            Some((200, clientes_body(&[("B2", "Marco", "Ruiz")])))
        }
    })
    .await;

    let entries = [
        "55 1234-5678",
        "123",
        "555555555555",
        "55-7123-4567",
        "5599887766",
    ];
    let (stats, results_out, log_out) =
        run_against(&stub, &entries, ExtractMode::IdCliente, 0).await;

    let log = rows(&log_out);
    assert_eq!(log.len(), 5, "one audit row per entry");
    for (row, raw) in log.iter().zip(entries) {
        assert_eq!(&row[COL_RAW], raw, "audit rows keep input order");
    }

    assert_eq!(&log[0][COL_OK], "1");
    assert_eq!(&log[0][COL_EXTRAIDOS], "A1");

    assert_eq!(&log[1][COL_OK], "0");
    assert_eq!(&log[1][COL_ERROR], "SKIPPED: telefono invalido (<10 digitos)");
    assert_eq!(&log[1][COL_STATUS], "");

    assert_eq!(&log[2][COL_OK], "0");
    assert_eq!(&log[2][COL_ERROR], "SKIPPED: telefono invalido (>11 digitos)");

    assert_eq!(&log[3][COL_OK], "0");
    assert!(
        log[3][COL_ERROR].starts_with("request: "),
        "unexpected error: {}",
        &log[3][COL_ERROR]
    );
    assert_eq!(&log[3][COL_STATUS], "");

    assert_eq!(&log[4][COL_OK], "1");
    assert_eq!(&log[4][COL_EXTRAIDOS], "B2");

    let results = rows(&results_out);
    assert_eq!(results.len(), 2);
    assert_eq!(&results[0][0], "55 1234-5678");
    assert_eq!(&results[0][4], "A1");
    assert_eq!(&results[1][4], "B2");

    assert_eq!(stats.entries, 5);
    assert_eq!(stats.invalid, 2);
    assert_eq!(stats.requests, 3);
    assert_eq!(stats.transport_errors, 1);
    assert_eq!(stats.ok_with_records, 2);
    assert_eq!(stats.rows_written, 2);

    // Every entry lands in exactly one outcome bucket.
    assert_eq!(stats.ok_count(), 2);
    assert_eq!(stats.failure_count(), 3);
    assert_eq!(stats.ok_count() + stats.failure_count(), stats.entries);

    // The invalid phones never reached the wire.
    assert_eq!(stub.seen().len(), 3);
}

#[tokio::test]
async fn querystring_matches_endpoint_contract() {
    let stub = SomsStub::spawn(|_| Some((200, clientes_body(&[])))).await;

    let (_, _, log_out) = run_against(&stub, &["55 1234-5678"], ExtractMode::IdCliente, 0).await;

    let seen = stub.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0],
        "/ws/BusquedaCliente?lada=055&telefono=12345678&idUsuario=U1\
         &nombre=&evento=&estado=&calle=&colonia=&cp="
    );

    let log = rows(&log_out);
    let url = &log[0][5];
    assert!(url.starts_with("http://"));
    assert!(url.ends_with(seen[0].as_str()));
}

#[tokio::test]
async fn http_error_logs_truncated_body() {
    let stub = SomsStub::spawn(|_| Some((500, "x".repeat(300)))).await;

    let (stats, results_out, log_out) =
        run_against(&stub, &["5512345678"], ExtractMode::IdCliente, 0).await;

    let log = rows(&log_out);
    assert_eq!(&log[0][COL_OK], "0");
    assert_eq!(&log[0][COL_STATUS], "500");
    assert_eq!(log[0][COL_ERROR].chars().count(), 200);
    assert_eq!(stats.http_errors, 1);
    assert_eq!(rows(&results_out).len(), 0);
}

#[tokio::test]
async fn non_json_success_body_is_flagged() {
    let stub = SomsStub::spawn(|_| Some((200, "esto no es json".to_string()))).await;

    let (stats, _, log_out) = run_against(&stub, &["5512345678"], ExtractMode::IdCliente, 0).await;

    let log = rows(&log_out);
    assert_eq!(&log[0][COL_OK], "0");
    assert_eq!(&log[0][COL_STATUS], "200");
    assert_eq!(&log[0][COL_ERROR], "Respuesta no es JSON");
    assert_eq!(stats.invalid_json, 1);
}

#[tokio::test]
async fn empty_clientes_is_ok_without_result_rows() {
    let stub = SomsStub::spawn(|_| Some((200, clientes_body(&[])))).await;

    let (stats, results_out, log_out) =
        run_against(&stub, &["5512345678"], ExtractMode::IdCliente, 0).await;

    let log = rows(&log_out);
    assert_eq!(&log[0][COL_OK], "1");
    assert_eq!(&log[0][COL_EXTRAIDOS], "");
    assert_eq!(&log[0][COL_ERROR], "");
    assert_eq!(stats.ok_no_records, 1);
    assert_eq!(rows(&results_out).len(), 0);
}

#[tokio::test]
async fn ambos_mode_pairs_ids_with_names() {
    let stub = SomsStub::spawn(|_| {
        Some((
            200,
            clientes_body(&[("A1", "Ligia", "Caballero"), ("B2", "Marco", "Ruiz")]),
        ))
    })
    .await;

    let (stats, results_out, log_out) =
        run_against(&stub, &["5512345678"], ExtractMode::Ambos, 0).await;

    let results = rows(&results_out);
    assert_eq!(results.len(), 2);
    assert_eq!(&results[0][4], "A1");
    assert_eq!(&results[0][5], "Ligia Caballero");
    assert_eq!(&results[1][4], "B2");
    assert_eq!(&results[1][5], "Marco Ruiz");

    let log = rows(&log_out);
    assert_eq!(&log[0][COL_EXTRAIDOS], "A1::Ligia Caballero|B2::Marco Ruiz");
    assert_eq!(stats.rows_written, 2);
}

#[tokio::test]
async fn invalid_entries_skip_the_pacing_delay() {
    let stub = SomsStub::spawn(|_| Some((200, clientes_body(&[])))).await;

    let started = Instant::now();
    let (stats, _, log_out) =
        run_against(&stub, &["1", "2 3", "abc"], ExtractMode::IdCliente, 20).await;

    assert!(
        started.elapsed() < Duration::from_secs(5),
        "invalid entries must not wait out the delay"
    );
    assert_eq!(stats.requests, 0);
    assert_eq!(rows(&log_out).len(), 3);
    assert!(stub.seen().is_empty());
}

#[tokio::test]
async fn pacing_delay_follows_every_request() {
    let stub = SomsStub::spawn(|_| Some((200, clientes_body(&[])))).await;

    let started = Instant::now();
    let (stats, _, _) = run_against(
        &stub,
        &["5512345678", "5599887766"],
        ExtractMode::IdCliente,
        1,
    )
    .await;

    assert!(
        started.elapsed() >= Duration::from_secs(2),
        "each request attempt must be followed by the delay"
    );
    assert_eq!(stats.requests, 2);
}

#[tokio::test]
async fn connection_refused_is_classified_connect() {
    // Grab a port that nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(
        &format!("http://{addr}/ws/BusquedaCliente"),
        0,
        ExtractMode::IdCliente,
    );
    let soms = SomsClient::new(&config).unwrap();
    let mut results =
        ResultsWriter::create(&dir.path().join("out.csv"), ExtractMode::IdCliente).unwrap();
    let mut audit = RequestLog::create(&dir.path().join("log.csv")).unwrap();

    let entries = vec!["5512345678".to_string()];
    let stats = run_lookup(&config, &soms, &entries, &mut results, &mut audit)
        .await
        .unwrap();

    let log_out = std::fs::read_to_string(dir.path().join("log.csv")).unwrap();
    let log = rows(&log_out);
    assert_eq!(&log[0][COL_OK], "0");
    assert!(
        log[0][COL_ERROR].starts_with("connect: "),
        "unexpected error: {}",
        &log[0][COL_ERROR]
    );
    assert_eq!(&log[0][COL_STATUS], "");
    assert_eq!(stats.transport_errors, 1);
}

#[tokio::test]
async fn truncated_body_keeps_received_status() {
    // Advertise far more body than is sent, then close the socket: the
    // status line arrives intact but reading the body fails.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            read_head(&mut socket).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                      Content-Length: 1000\r\nConnection: close\r\n\r\n{\"Bus",
                )
                .await;
            let _ = socket.shutdown().await;
        }
    });

    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(
        &format!("http://{addr}/ws/BusquedaCliente"),
        0,
        ExtractMode::IdCliente,
    );
    let soms = SomsClient::new(&config).unwrap();
    let mut results =
        ResultsWriter::create(&dir.path().join("out.csv"), ExtractMode::IdCliente).unwrap();
    let mut audit = RequestLog::create(&dir.path().join("log.csv")).unwrap();

    let entries = vec!["5512345678".to_string()];
    let stats = run_lookup(&config, &soms, &entries, &mut results, &mut audit)
        .await
        .unwrap();

    let log_out = std::fs::read_to_string(dir.path().join("log.csv")).unwrap();
    let log = rows(&log_out);
    assert_eq!(&log[0][COL_OK], "0");
    assert_eq!(&log[0][COL_STATUS], "200", "status from the head is kept");
    assert!(
        log[0][COL_ERROR].starts_with("body: "),
        "unexpected error: {}",
        &log[0][COL_ERROR]
    );
    assert_eq!(stats.transport_errors, 1);

    let results_out = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
    assert_eq!(rows(&results_out).len(), 0);
}

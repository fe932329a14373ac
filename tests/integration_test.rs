//! Tests de integración para el servidor
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero sirviendo un
//! directorio temporal, y lo apaga al terminar. Se repiten para los tres
//! modos de despacho.

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use dispatch_server::config::{Config, Mode};
use dispatch_server::error::ServerError;
use dispatch_server::handler::{FileServingApp, Handler, HandlerError, HandlerResult};
use dispatch_server::http::{Request, Response, StatusCode};
use dispatch_server::metrics::MetricsCollector;
use dispatch_server::server::{Server, ShutdownHandle};
use tempfile::TempDir;

const MODES: [Mode; 3] = [Mode::Threads, Mode::Cooperative, Mode::Actor];

const INDEX_HTML: &[u8] = b"<html><body>hola</body></html>\n";

/// Servidor corriendo en un thread aparte
struct Running {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    metrics: MetricsCollector,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl Running {
    fn start(mode: Mode, handler: Arc<dyn Handler>) -> Self {
        let config = Config {
            port: 0,
            workers: 4,
            mode,
            ..Config::default()
        };

        let server = Server::bind(&config, handler).expect("bind");
        Running {
            addr: server.local_addr(),
            shutdown: server.shutdown_handle(),
            metrics: server.metrics(),
            handle: thread::spawn(move || server.run()),
        }
    }

    fn stop(self) -> MetricsCollector {
        self.shutdown.trigger();
        self.handle
            .join()
            .expect("server thread panicked")
            .expect("server returned an error");
        self.metrics
    }
}

/// Directorio temporal con un par de archivos
fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs").join("a.txt"), b"alpha").unwrap();
    dir
}

/// Helper: envía bytes crudos y retorna todo lo que llegue hasta el cierre
fn send_raw(addr: SocketAddr, raw: &[u8]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect(addr)?;

    // Configurar timeouts
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    stream.set_write_timeout(Some(Duration::from_secs(5)))?;

    stream.write_all(raw)?;
    stream.flush()?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response)?;
    Ok(response)
}

/// Helper: envía un GET y retorna la response completa
fn send_request(addr: SocketAddr, path: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    send_raw(addr, format!("GET {} HTTP/1.1\r\nHost: test\r\n\r\n", path).as_bytes())
}

/// Helper: separa status line, headers y body
fn split_response(response: &[u8]) -> (String, Vec<(String, String)>, Vec<u8>) {
    let pos = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response without blank line");

    let head = String::from_utf8(response[..pos].to_vec()).unwrap();
    let mut lines = head.split("\r\n");
    let status = lines.next().unwrap().to_string();
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    (status, headers, response[pos + 4..].to_vec())
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Verifica que la response es HTTP válida y que el body mide lo que dice
fn assert_well_formed(response: &[u8]) -> (String, Vec<(String, String)>, Vec<u8>) {
    let (status, headers, body) = split_response(response);
    assert!(status.starts_with("HTTP/1.1 "), "bad status line: {}", status);

    let length: usize = header(&headers, "Content-Length")
        .expect("missing Content-Length")
        .parse()
        .unwrap();
    assert_eq!(length, body.len());
    assert_eq!(header(&headers, "Connection"), Some("close"));

    (status, headers, body)
}

// ==================== File serving ====================

#[test]
fn test_existing_file_returns_exact_bytes() {
    let root = site();
    for mode in MODES {
        let server = Running::start(mode, Arc::new(FileServingApp::new(root.path())));

        let response = send_request(server.addr, "/index.html").unwrap();
        let (status, headers, body) = assert_well_formed(&response);
        assert_eq!(status, "HTTP/1.1 200 OK", "mode {}", mode);
        assert_eq!(header(&headers, "Content-Type"), Some("text/html"));
        assert_eq!(body, INDEX_HTML, "mode {}", mode);

        let response = send_request(server.addr, "/docs/a.txt?ignored=1").unwrap();
        let (_, _, body) = assert_well_formed(&response);
        assert_eq!(body, b"alpha");

        server.stop();
    }
}

#[test]
fn test_missing_file_returns_404_with_empty_body() {
    let root = site();
    for mode in MODES {
        let server = Running::start(mode, Arc::new(FileServingApp::new(root.path())));

        let response = send_request(server.addr, "/nope.html").unwrap();
        let (status, headers, body) = assert_well_formed(&response);
        assert_eq!(status, "HTTP/1.1 404 Not Found", "mode {}", mode);
        assert_eq!(header(&headers, "Content-Length"), Some("0"));
        assert!(body.is_empty());

        // Un directorio no es un archivo
        let response = send_request(server.addr, "/docs").unwrap();
        assert!(response.starts_with(b"HTTP/1.1 404"));

        // Tampoco se escapa de la raíz
        let response = send_request(server.addr, "/../index.html").unwrap();
        assert!(response.starts_with(b"HTTP/1.1 404"));

        server.stop();
    }
}

// ==================== Concurrency ====================

#[test]
fn test_concurrent_clients_all_get_valid_responses() {
    let root = site();
    for mode in MODES {
        let server = Running::start(mode, Arc::new(FileServingApp::new(root.path())));
        let addr = server.addr;

        let clients: Vec<_> = (0..32)
            .map(|i| {
                thread::spawn(move || {
                    let path = if i % 2 == 0 { "/index.html" } else { "/missing" };
                    send_request(addr, path).map_err(|e| e.to_string())
                })
            })
            .collect();

        for client in clients {
            let response = client.join().unwrap().unwrap();
            assert_well_formed(&response);
        }

        let snapshot = server.stop().snapshot();
        assert_eq!(snapshot.status_codes[&200], 16, "mode {}", mode);
        assert_eq!(snapshot.status_codes[&404], 16, "mode {}", mode);
    }
}

#[test]
fn test_slow_client_does_not_starve_others() {
    fn ok(_req: &Request) -> HandlerResult {
        Ok(Response::new(StatusCode::OK).with_chunk("ok"))
    }

    for mode in MODES {
        let server = Running::start(mode, Arc::new(ok));

        // Manda medio request y se queda esperando
        let mut slow = TcpStream::connect(server.addr).unwrap();
        slow.write_all(b"GET /slow HTTP/1.1\r\n").unwrap();
        thread::sleep(Duration::from_millis(50));

        let response = send_request(server.addr, "/fast").unwrap();
        assert!(response.starts_with(b"HTTP/1.1 200 OK"), "mode {}", mode);

        slow.write_all(b"\r\n").unwrap();
        let mut rest = Vec::new();
        slow.read_to_end(&mut rest).unwrap();
        assert!(rest.starts_with(b"HTTP/1.1 200 OK"), "mode {}", mode);

        server.stop();
    }
}

// ==================== Failures ====================

#[test]
fn test_overlong_uri_closes_without_response() {
    let root = site();
    for mode in MODES {
        let server = Running::start(mode, Arc::new(FileServingApp::new(root.path())));

        let path = format!("/{}", "a".repeat(3000));
        let response = send_request(server.addr, &path).unwrap_or_default();
        assert!(response.is_empty(), "mode {} answered an overlong URI", mode);

        // El servidor sigue atendiendo
        let response = send_request(server.addr, "/index.html").unwrap();
        assert!(response.starts_with(b"HTTP/1.1 200 OK"));

        let snapshot = server.stop().snapshot();
        assert_eq!(snapshot.parse_failures, 1, "mode {}", mode);
    }
}

#[test]
fn test_failing_handler_closes_without_response() {
    fn picky(req: &Request) -> HandlerResult {
        match req.path() {
            "/error" => Err(HandlerError::new("refused")),
            "/panic" => panic!("handler blew up"),
            _ => Ok(Response::new(StatusCode::OK).with_chunk("fine")),
        }
    }

    for mode in MODES {
        let server = Running::start(mode, Arc::new(picky));

        assert!(send_request(server.addr, "/error").unwrap_or_default().is_empty());
        assert!(send_request(server.addr, "/panic").unwrap_or_default().is_empty());

        // Los workers sobreviven
        for _ in 0..8 {
            let response = send_request(server.addr, "/ok").unwrap();
            assert!(response.starts_with(b"HTTP/1.1 200 OK"), "mode {}", mode);
        }

        let snapshot = server.stop().snapshot();
        assert_eq!(snapshot.handler_failures, 2, "mode {}", mode);
        assert_eq!(snapshot.responded, 8, "mode {}", mode);
    }
}

#[test]
fn test_empty_connection_is_silent() {
    let root = site();
    for mode in MODES {
        let server = Running::start(mode, Arc::new(FileServingApp::new(root.path())));

        // Conecta y cierra su lado sin mandar nada
        let mut client = TcpStream::connect(server.addr).unwrap();
        client.shutdown(std::net::Shutdown::Write).unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).unwrap();
        assert!(response.is_empty());

        let snapshot = server.stop().snapshot();
        assert_eq!(snapshot.closed_silently, 1, "mode {}", mode);
        assert_eq!(snapshot.parse_failures, 0, "mode {}", mode);
    }
}

// ==================== Request data ====================

#[test]
fn test_handler_receives_parsed_request() {
    fn describe(req: &Request) -> HandlerResult {
        let env = req.env();
        let body = String::from_utf8_lossy(req.body().unwrap_or_default()).to_string();
        let text = format!(
            "{}|{}|{}|{}|{}",
            env["REQUEST_METHOD"], env["PATH_INFO"], env["QUERY_STRING"], env["HTTP_X_TOKEN"], body
        );
        Ok(Response::new(StatusCode::CREATED)
            .with_header("Content-Type", "text/plain")
            .with_chunk(text))
    }

    for mode in MODES {
        let server = Running::start(mode, Arc::new(describe));

        let raw = b"POST /items?x=1 HTTP/1.1\r\nX-Token: abc\r\nContent-Length: 5\r\n\r\nhello";
        let response = send_raw(server.addr, raw).unwrap();
        let (status, headers, body) = assert_well_formed(&response);

        assert_eq!(status, "HTTP/1.1 201 Created");
        assert_eq!(header(&headers, "Content-Type"), Some("text/plain"));
        assert_eq!(body, b"POST|/items|x=1|abc|hello", "mode {}", mode);

        server.stop();
    }
}

// ==================== Shutdown ====================

#[test]
fn test_shutdown_stops_accepting() {
    let root = site();
    for mode in MODES {
        let server = Running::start(mode, Arc::new(FileServingApp::new(root.path())));
        let addr = server.addr;

        assert!(send_request(addr, "/index.html").is_ok());
        server.stop();

        // El listener ya se cerró
        assert!(TcpStream::connect(addr).is_err(), "mode {}", mode);
    }
}

//! # Worker de Conexión
//! src/server/worker.rs
//!
//! Atiende una conexión de punta a punta:
//!
//! ```text
//! Idle → Reading → Parsing → Resolving → Invoking → Serializing → Writing → Closed
//!            └─────────┴──────────┴───────────┴────────────┴──→ Errored → Closed
//! ```
//!
//! Una conexión = un request = una respuesta. Cualquier falla queda dentro
//! de la conexión: se registra, se responde si todavía tiene sentido
//! (400/413/500) y el socket se cierra. Nunca llega al acceptor ni a las
//! otras conexiones.

use crate::error::{HandlerError, HandlerResult, ServerError};
use crate::http::request::{find_head_end, HEAD_TERMINATOR};
use crate::http::{Request, Response, ResponseBuilder, StatusCode};
use crate::router::{Handler, Resolution, Router};
use crate::static_files::StaticFiles;
use std::any::Any;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

/// Estados de una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Reading,
    Parsing,
    Resolving,
    Invoking,
    Serializing,
    Writing,
    Closed,
    Errored,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Reading => "reading",
            Stage::Parsing => "parsing",
            Stage::Resolving => "resolving",
            Stage::Invoking => "invoking",
            Stage::Serializing => "serializing",
            Stage::Writing => "writing",
            Stage::Closed => "closed",
            Stage::Errored => "errored",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Límites de lectura
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Bytes por cada read()
    pub read_chunk: usize,
    /// Máximo de cabecera + body
    pub max_request_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            read_chunk: 4096,
            max_request_bytes: 1024 * 1024,
        }
    }
}

/// Todo lo que un worker necesita, compartido (solo lectura) entre threads
#[derive(Debug)]
pub struct ConnectionContext {
    router: Router,
    statics: StaticFiles,
    builder: ResponseBuilder,
    limits: Limits,
    io_timeout: Duration,
    dump_dir: Option<PathBuf>,
}

impl ConnectionContext {
    pub fn new(
        router: Router,
        statics: StaticFiles,
        builder: ResponseBuilder,
        limits: Limits,
        io_timeout: Duration,
    ) -> Self {
        Self {
            router,
            statics,
            builder,
            limits,
            io_timeout,
            dump_dir: None,
        }
    }

    /// Activa el volcado de los bytes crudos de cada conexión
    pub fn with_dump_dir(mut self, dump_dir: Option<PathBuf>) -> Self {
        self.dump_dir = dump_dir;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn builder(&self) -> &ResponseBuilder {
        &self.builder
    }

    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }
}

/// Atiende una conexión y la cierra
///
/// Nunca falla hacia afuera: los errores se registran acá.
pub fn handle_connection(stream: TcpStream, id: u64, ctx: &ConnectionContext) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let span = info_span!("connection", id, peer = %peer);
    let _enter = span.enter();

    let mut connection = Connection::new(stream, id, ctx);
    if let Err(e) = connection.run() {
        let failed_at = connection.stage;
        connection.advance(Stage::Errored);
        log_failure(&e, failed_at);
    }
    connection.close();
}

fn log_failure(err: &ServerError, stage: Stage) {
    match err {
        ServerError::Timeout => warn!(stage = %stage, "Timeout, cerrando conexión"),
        ServerError::MalformedRequest(_) | ServerError::RequestTooLarge { .. } => {
            warn!(stage = %stage, error = %err, "Request rechazado")
        }
        ServerError::NotFound(_) => debug!(stage = %stage, error = %err, "Recurso no encontrado"),
        ServerError::Handler(_) | ServerError::Transport(_) => {
            error!(stage = %stage, error = %err, "Falló la conexión")
        }
    }
}

/// Una conexión en curso
struct Connection<'a> {
    stream: TcpStream,
    id: u64,
    ctx: &'a ConnectionContext,
    stage: Stage,
    started: Instant,
}

impl<'a> Connection<'a> {
    fn new(stream: TcpStream, id: u64, ctx: &'a ConnectionContext) -> Self {
        Self {
            stream,
            id,
            ctx,
            stage: Stage::Idle,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "Transición");
        self.stage = next;
    }

    fn run(&mut self) -> Result<(), ServerError> {
        let ctx = self.ctx;

        self.stream.set_read_timeout(Some(ctx.io_timeout))?;
        self.stream.set_write_timeout(Some(ctx.io_timeout))?;

        // 1. Reading
        self.advance(Stage::Reading);
        let raw = match read_request(&mut self.stream, ctx.limits) {
            Ok(raw) => raw,
            Err(e @ ServerError::RequestTooLarge { .. }) => {
                self.respond_error(StatusCode::PayloadTooLarge);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if raw.is_empty() {
            debug!("El peer cerró sin enviar datos");
            return Ok(());
        }
        self.dump(&raw);

        // 2. Parsing
        self.advance(Stage::Parsing);
        let mut request = match Request::parse(&raw) {
            Ok(request) => request,
            Err(e) => {
                self.respond_error(StatusCode::BadRequest);
                return Err(e.into());
            }
        };

        // 3. Resolving
        self.advance(Stage::Resolving);
        let resolution = ctx.router.resolve(&mut request);

        // 4. Invoking
        self.advance(Stage::Invoking);
        let response = match resolution {
            Resolution::Dynamic(route) => {
                debug!(pattern = route.pattern(), "Ruta dinámica");
                invoke(route.handler(), &request)
            }
            Resolution::Static => {
                debug!("Sin ruta dinámica, sirviendo estático");
                Ok(ctx.statics.serve(&request))
            }
        };
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                self.respond_error(StatusCode::InternalServerError);
                return Err(e.into());
            }
        };

        // 5. Serializing
        self.advance(Stage::Serializing);
        let bytes = ctx.builder.build(&response, Some(request.path()));

        // 6. Writing
        self.advance(Stage::Writing);
        self.write(&bytes)?;

        info!(
            method = %request.method(),
            path = request.path(),
            status = response.status().as_u16(),
            bytes = bytes.len(),
            latency_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "Request completado"
        );

        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ServerError> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Intenta mandar una respuesta de error fija
    ///
    /// Si la escritura falla solo se registra: la conexión ya está perdida.
    fn respond_error(&mut self, status: StatusCode) {
        let bytes = self.ctx.builder.build(&Response::error(status), None);
        match self.write(&bytes) {
            Ok(()) => info!(
                status = status.as_u16(),
                bytes = bytes.len(),
                latency_ms = self.started.elapsed().as_secs_f64() * 1000.0,
                "Respuesta de error enviada"
            ),
            Err(e) => debug!(status = status.as_u16(), error = %e, "No se pudo enviar la respuesta de error"),
        }
    }

    fn dump(&self, raw: &[u8]) {
        let Some(dir) = &self.ctx.dump_dir else {
            return;
        };

        let path = dir.join(format!("request-{}.bin", self.id));
        if let Err(e) = fs::write(&path, raw) {
            warn!(path = %path.display(), error = %e, "No se pudo volcar el request");
        }
    }

    /// Cierra el socket en todos los caminos
    fn close(mut self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!(error = %e, "shutdown falló (el peer ya había cerrado)");
        }
        self.advance(Stage::Closed);
    }
}

/// Llama al handler atrapando panics
fn invoke(handler: &Handler, request: &Request) -> HandlerResult {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(request))) {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Lee un request completo
///
/// Lee de a `read_chunk` bytes hasta ver el `\r\n\r\n`; si la cabecera trae
/// `Content-Length` sigue hasta completar el body. EOF corta la lectura y
/// lo que haya llegado se entrega al parser.
pub fn read_request<R: Read>(reader: &mut R, limits: Limits) -> Result<Vec<u8>, ServerError> {
    let mut buffer: Vec<u8> = Vec::with_capacity(limits.read_chunk);
    let mut chunk = vec![0u8; limits.read_chunk];
    let mut expected_total: Option<usize> = None;

    loop {
        if let Some(total) = expected_total {
            if buffer.len() >= total {
                buffer.truncate(total);
                break;
            }
        }

        let n = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            break;
        }

        buffer.extend_from_slice(&chunk[..n]);

        if expected_total.is_none() {
            if let Some(head_end) = find_head_end(&buffer) {
                let body_start = head_end + HEAD_TERMINATOR.len();
                // Un Content-Length cercano a usize::MAX no entra en la suma
                let total = body_start
                    .checked_add(content_length(&buffer[..head_end]))
                    .ok_or(ServerError::RequestTooLarge {
                        limit: limits.max_request_bytes,
                    })?;
                expected_total = Some(total);
            }
        }

        let too_large = match expected_total {
            Some(total) => total > limits.max_request_bytes,
            None => buffer.len() > limits.max_request_bytes,
        };
        if too_large {
            return Err(ServerError::RequestTooLarge {
                limit: limits.max_request_bytes,
            });
        }
    }

    Ok(buffer)
}

/// Valor de `Content-Length` en la cabecera cruda; 0 si falta o no es número
fn content_length(head: &[u8]) -> usize {
    let head = String::from_utf8_lossy(head);
    head.split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::{BAD_REQUEST_BODY, INTERNAL_ERROR_BODY, NOT_FOUND_BODY};
    use crate::http::MimeTable;
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::thread;

    /// Reader que entrega los datos en pedazos fijos
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let end = (self.pos + self.step.min(buf.len())).min(self.data.len());
            let n = end - self.pos;
            buf[..n].copy_from_slice(&self.data[self.pos..end]);
            self.pos = end;
            Ok(n)
        }
    }

    fn limits(read_chunk: usize, max_request_bytes: usize) -> Limits {
        Limits {
            read_chunk,
            max_request_bytes,
        }
    }

    #[test]
    fn test_read_request_head_only() {
        let mut reader = Cursor::new(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n".to_vec());
        let raw = read_request(&mut reader, Limits::default()).unwrap();
        assert_eq!(raw, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
    }

    #[test]
    fn test_read_request_body_across_chunks() {
        let data = b"POST /parameters HTTP/1.1\r\nContent-Length: 7\r\n\r\na=1&b=2".to_vec();
        let mut reader = Trickle { data: data.clone(), pos: 0, step: 5 };

        let raw = read_request(&mut reader, limits(5, 1024)).unwrap();
        assert_eq!(raw, data);
    }

    #[test]
    fn test_read_request_ignores_bytes_past_content_length() {
        let mut reader = Cursor::new(b"POST / HTTP/1.1\r\ncontent-length: 3\r\n\r\nabcdef".to_vec());
        let raw = read_request(&mut reader, Limits::default()).unwrap();
        assert!(raw.ends_with(b"\r\n\r\nabc"));
    }

    #[test]
    fn test_read_request_eof_before_terminator() {
        let mut reader = Cursor::new(b"GET / HTTP/1.1\r\nHost".to_vec());
        let raw = read_request(&mut reader, Limits::default()).unwrap();
        assert_eq!(raw, b"GET / HTTP/1.1\r\nHost");
    }

    #[test]
    fn test_read_request_too_large_head() {
        let mut reader = Cursor::new(vec![b'a'; 100]);
        let result = read_request(&mut reader, limits(16, 32));
        assert!(matches!(result, Err(ServerError::RequestTooLarge { limit: 32 })));
    }

    #[test]
    fn test_read_request_too_large_declared_body() {
        let mut reader = Cursor::new(b"POST / HTTP/1.1\r\nContent-Length: 5000\r\n\r\n".to_vec());
        let result = read_request(&mut reader, limits(64, 1024));
        assert!(matches!(result, Err(ServerError::RequestTooLarge { .. })));
    }

    #[test]
    fn test_read_request_content_length_overflow() {
        let raw = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n", usize::MAX);
        let mut reader = Cursor::new(raw.into_bytes());
        let result = read_request(&mut reader, limits(64, 1024));
        assert!(matches!(result, Err(ServerError::RequestTooLarge { limit: 1024 })));
    }

    #[test]
    fn test_content_length_lookup() {
        assert_eq!(content_length(b"GET / HTTP/1.1\r\nContent-Length: 12"), 12);
        assert_eq!(content_length(b"GET / HTTP/1.1\r\nCONTENT-LENGTH:4"), 4);
        assert_eq!(content_length(b"GET / HTTP/1.1\r\nContent-Length: nope"), 0);
        assert_eq!(content_length(b"GET / HTTP/1.1"), 0);
    }

    #[test]
    fn test_invoke_catches_panic() {
        let handler: Handler = Arc::new(|_req: &Request| -> HandlerResult { panic!("boom") });
        let req = Request::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();

        match invoke(&handler, &req) {
            Err(HandlerError::Panicked(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected: {:?}", other.map(|r| r.status())),
        }
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Reading.to_string(), "reading");
        assert_eq!(Stage::Errored.to_string(), "errored");
    }

    // === Tests con sockets reales ===

    fn context(static_root: &std::path::Path) -> ConnectionContext {
        context_with_timeout(static_root, Duration::from_secs(5))
    }

    fn context_with_timeout(static_root: &std::path::Path, io_timeout: Duration) -> ConnectionContext {
        let mut router = Router::new();
        router
            .register("/hello/<name>", |req: &Request| {
                Ok(Response::html(&format!("hi {}", req.param("name").unwrap_or("?"))))
            })
            .unwrap();
        router
            .register("/fail", |_req: &Request| Err(HandlerError::Other("nope".to_string())))
            .unwrap();
        router
            .register("/panic", |_req: &Request| -> HandlerResult { panic!("handler exploded") })
            .unwrap();

        ConnectionContext::new(
            router,
            StaticFiles::new(static_root),
            ResponseBuilder::new("NinjaServer/0.1", Arc::new(MimeTable::default())),
            limits(64, 4096),
            io_timeout,
        )
    }

    /// Acepta una conexión, la atiende y devuelve lo que recibió el cliente
    fn exchange(ctx: ConnectionContext, raw: &[u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, 1, &ctx);
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        server.join().unwrap();

        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_handle_connection_dynamic_route() {
        let dir = tempfile::tempdir().unwrap();
        let text = exchange(context(dir.path()), b"GET /hello/ninja HTTP/1.1\r\n\r\n");

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 8\r\n"));
        assert!(text.contains("Connection: Close\r\n"));
        assert!(text.ends_with("\r\n\r\nhi ninja"));
    }

    #[test]
    fn test_handle_connection_static_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("style.css"), "body {}").unwrap();

        let text = exchange(context(dir.path()), b"GET /style.css HTTP/1.1\r\n\r\n");

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/css\r\n"));
        assert!(text.ends_with("body {}"));
    }

    #[test]
    fn test_handle_connection_static_missing() {
        let dir = tempfile::tempdir().unwrap();
        let text = exchange(context(dir.path()), b"GET /missing.html HTTP/1.1\r\n\r\n");

        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.ends_with(std::str::from_utf8(NOT_FOUND_BODY).unwrap()));
    }

    #[test]
    fn test_handle_connection_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let text = exchange(context(dir.path()), b"\x00\x01garbage\r\n\r\n");

        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(text.ends_with(std::str::from_utf8(BAD_REQUEST_BODY).unwrap()));
    }

    #[test]
    fn test_handle_connection_handler_error_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let text = exchange(context(dir.path()), b"GET /fail HTTP/1.1\r\n\r\n");

        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(text.ends_with(std::str::from_utf8(INTERNAL_ERROR_BODY).unwrap()));
    }

    #[test]
    fn test_handle_connection_handler_panic_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let text = exchange(context(dir.path()), b"GET /panic HTTP/1.1\r\n\r\n");

        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }

    #[test]
    fn test_handle_connection_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let text = exchange(
            context(dir.path()),
            b"POST / HTTP/1.1\r\nContent-Length: 10000\r\n\r\n",
        );

        assert!(text.starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    }

    #[test]
    fn test_handle_connection_peer_closed_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, 7, &ctx);
        });

        let client = TcpStream::connect(addr).unwrap();
        client.shutdown(Shutdown::Write).unwrap();
        let mut buf = Vec::new();
        (&client).read_to_end(&mut buf).unwrap();

        server.join().unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_handle_connection_idle_client_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_timeout(dir.path(), Duration::from_millis(200));

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, 9, &ctx);
        });

        // Conecta y no manda nada; el servidor tiene que cerrar por su cuenta
        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let started = Instant::now();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        let elapsed = started.elapsed();

        server.join().unwrap();
        assert!(buf.is_empty());
        assert!(elapsed < Duration::from_secs(3), "cerró después de {:?}", elapsed);
    }

    #[test]
    fn test_handle_connection_dumps_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let dumps = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).with_dump_dir(Some(dumps.path().to_path_buf()));

        exchange(ctx, b"GET /hello/dump HTTP/1.1\r\n\r\n");

        let dumped = fs::read(dumps.path().join("request-1.bin")).unwrap();
        assert_eq!(dumped, b"GET /hello/dump HTTP/1.1\r\n\r\n");
    }
}

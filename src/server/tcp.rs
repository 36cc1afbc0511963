//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Escucha en un puerto, numera cada conexión aceptada y la pasa al pool de
//! workers. Si el pool está saturado la conexión se rechaza con 503.
//! Un error de `accept` se registra y el loop sigue.

use super::pool::WorkerPool;
use super::worker::{ConnectionContext, Limits};
use crate::config::Config;
use crate::http::{MimeTable, Response, ResponseBuilder, StatusCode};
use crate::router::{RouteError, Router};
use crate::static_files::StaticFiles;
use crate::templates::TemplateRenderer;
use crate::views;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// Tope de espera del acceptor por lo que el cliente rechazado ya mandó
const REJECT_DRAIN_TIMEOUT: Duration = Duration::from_millis(50);

/// Servidor HTTP/1.1 con pool de workers
#[derive(Debug)]
pub struct Server {
    config: Config,
    ctx: Arc<ConnectionContext>,
    next_id: AtomicU64,
    stopped: Arc<AtomicBool>,
}

impl Server {
    /// Crea el servidor con todas las vistas registradas
    pub fn new(config: Config) -> Result<Self, RouteError> {
        let templates = Arc::new(TemplateRenderer::new(&config.templates_dir));

        let mut router = Router::new();
        views::register_all(&mut router, templates)?;

        Ok(Self::with_router(config, router))
    }

    /// Crea el servidor con un router armado afuera
    pub fn with_router(config: Config, router: Router) -> Self {
        let builder = ResponseBuilder::new(&config.server_name, Arc::new(MimeTable::default()));
        let limits = Limits {
            read_chunk: config.read_chunk,
            max_request_bytes: config.max_request_bytes,
        };

        let ctx = ConnectionContext::new(
            router,
            StaticFiles::new(&config.static_root),
            builder,
            limits,
            config.io_timeout(),
        )
        .with_dump_dir(config.dump_dir.as_ref().map(PathBuf::from));

        Self {
            config,
            ctx: Arc::new(ctx),
            next_id: AtomicU64::new(1),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Flag para detener el loop de accept
    ///
    /// El loop lo revisa después de cada `accept`, así que hace falta una
    /// conexión más para que lo note.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }

    /// Bind en la dirección configurada
    pub fn bind(&self) -> io::Result<TcpListener> {
        let address = self.config.address();
        info!(address = %address, "Iniciando servidor");
        TcpListener::bind(&address)
    }

    /// Bind + serve
    pub fn run(&self) -> io::Result<()> {
        let listener = self.bind()?;
        self.serve(listener)
    }

    /// Acepta conexiones hasta que se active `stop_handle`
    pub fn serve(&self, listener: TcpListener) -> io::Result<()> {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        let pool = WorkerPool::spawn(self.config.workers, self.config.queue_capacity, Arc::clone(&self.ctx))?;

        info!(
            address = ?local,
            workers = pool.workers(),
            routes = self.ctx.router().len(),
            static_root = %self.config.static_root,
            "Servidor escuchando"
        );

        for stream in listener.incoming() {
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }

            match stream {
                Ok(stream) => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    debug!(id, "Conexión aceptada");

                    if let Err(rejected) = pool.try_submit(stream, id) {
                        warn!(id, queued = pool.queued(), "Pool saturado, respondiendo 503");
                        self.reject(rejected);
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error al aceptar conexión");
                }
            }
        }

        info!("Deteniendo servidor");
        pool.shutdown();
        Ok(())
    }

    /// Responde 503 y cierra
    ///
    /// Antes de escribir consume lo que el cliente ya mandó, con una sola
    /// lectura acotada por `REJECT_DRAIN_TIMEOUT`. Con datos sin leer en el
    /// socket el cierre sale como RST.
    fn reject(&self, mut stream: TcpStream) {
        let _ = stream.set_read_timeout(Some(REJECT_DRAIN_TIMEOUT));
        let _ = stream.set_write_timeout(Some(self.ctx.io_timeout()));

        let mut pending = vec![0u8; self.config.read_chunk.max(1)];
        if let Ok(n) = stream.read(&mut pending) {
            debug!(drained = n, "Request descartado antes del 503");
        }

        let bytes = self
            .ctx
            .builder()
            .build(&Response::error(StatusCode::ServiceUnavailable), None);
        if let Err(e) = stream.write_all(&bytes).and_then(|_| stream.flush()) {
            debug!(error = %e, "No se pudo enviar el 503");
        }
        let _ = stream.shutdown(Shutdown::Both);
    }
}

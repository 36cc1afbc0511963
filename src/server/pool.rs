//! # Pool de Workers
//! src/server/pool.rs
//!
//! Cantidad fija de threads que toman conexiones aceptadas de una cola
//! FIFO acotada (`Mutex` + `Condvar`).
//!
//! El acceptor nunca se bloquea esperando lugar: si la cola está llena,
//! `try_submit` le devuelve la conexión para que la rechace con 503.

use super::worker::{handle_connection, ConnectionContext};
use std::collections::VecDeque;
use std::io;
use std::net::TcpStream;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Cola FIFO thread-safe con capacidad máxima
#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
    capacity: usize,
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            available: Condvar::new(),
            capacity,
        }
    }

    // Un worker que hizo panic no invalida la cola: el estado es una VecDeque
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola sin bloquear
    ///
    /// Devuelve el elemento si la cola está llena o cerrada.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let mut state = self.lock();
        if state.closed || state.items.len() >= self.capacity {
            return Err(item);
        }

        state.items.push_back(item);
        self.available.notify_one();
        Ok(())
    }

    /// Desencola el más antiguo, bloqueando hasta que haya uno
    ///
    /// Retorna `None` cuando la cola se cerró y ya no quedan elementos.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cierra la cola y despierta a todos los que esperan
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Conexión aceptada esperando un worker
#[derive(Debug)]
pub struct Accepted {
    pub stream: TcpStream,
    pub id: u64,
}

/// Threads que atienden conexiones
#[derive(Debug)]
pub struct WorkerPool {
    queue: Arc<BoundedQueue<Accepted>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Lanza `workers` threads que comparten `ctx`
    pub fn spawn(workers: usize, queue_capacity: usize, ctx: Arc<ConnectionContext>) -> io::Result<Self> {
        let queue = Arc::new(BoundedQueue::new(queue_capacity));
        let mut handles = Vec::with_capacity(workers);

        for n in 0..workers {
            let queue = Arc::clone(&queue);
            let ctx = Arc::clone(&ctx);

            let handle = thread::Builder::new()
                .name(format!("worker-{}", n))
                .spawn(move || {
                    debug!("Worker iniciado");
                    while let Some(Accepted { stream, id }) = queue.pop() {
                        run_contained(id, || handle_connection(stream, id, &ctx));
                    }
                    debug!("Worker terminado");
                })?;
            handles.push(handle);
        }

        info!(workers, queue_capacity, "Pool de workers listo");
        Ok(Self { queue, handles })
    }

    /// Entrega una conexión al pool sin bloquear
    ///
    /// Con la cola llena devuelve la conexión al llamador.
    pub fn try_submit(&self, stream: TcpStream, id: u64) -> Result<(), TcpStream> {
        self.queue
            .try_push(Accepted { stream, id })
            .map_err(|rejected| rejected.stream)
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Deja de aceptar, termina lo encolado y espera a los workers
    pub fn shutdown(mut self) {
        self.queue.close();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Ejecuta el trabajo de una conexión sin dejar que un panic mate al worker
///
/// Retorna `false` si el trabajo hizo panic.
fn run_contained<F: FnOnce()>(id: u64, job: F) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(()) => true,
        Err(_) => {
            error!(id, "Panic atendiendo la conexión, el worker sigue");
            false
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.queue.close();
    }
}

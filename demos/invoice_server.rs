//! Invoice server: one container scope per request.
//!
//! ```text
//! RUST_LOG=info,tiered_di=debug cargo run --example invoice_server
//! curl http://127.0.0.1:8080/
//! curl http://127.0.0.1:8080/ready
//! ```

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use tiered_di::{Container, ContainerConfig, DiError, Resolver};
use tracing_subscriber::EnvFilter;

// ===== Domain Types =====

#[derive(Debug, Clone)]
struct Invoice {
    number: String,
    amount_cents: u64,
}

/// Per-request data registered into each request scope.
#[derive(Debug)]
struct RequestContext {
    request_id: u64,
    method: String,
    path: String,
    user_agent: String,
}

// ===== Services =====

trait InvoiceRepository: Send + Sync {
    fn all(&self) -> Vec<Invoice>;
}

struct InMemoryInvoiceRepository {
    context: Arc<RequestContext>,
}

impl InvoiceRepository for InMemoryInvoiceRepository {
    fn all(&self) -> Vec<Invoice> {
        tracing::info!(
            request_id = self.context.request_id,
            user_agent = %self.context.user_agent,
            "loading invoices"
        );
        vec![
            Invoice { number: "INV-001".into(), amount_cents: 12_500 },
            Invoice { number: "INV-002".into(), amount_cents: 4_999 },
        ]
    }
}

trait InvoiceService: Send + Sync {
    fn all(&self) -> Vec<Invoice>;
}

struct DefaultInvoiceService {
    repository: Arc<dyn InvoiceRepository>,
}

impl InvoiceService for DefaultInvoiceService {
    fn all(&self) -> Vec<Invoice> {
        self.repository.all()
    }
}

// ===== Handlers =====

struct Response {
    status: &'static str,
    body: String,
}

trait Handler: Send + Sync {
    fn handle(&self, context: &RequestContext) -> Response;
}

struct InvoicesHandler {
    service: Arc<dyn InvoiceService>,
}

impl Handler for InvoicesHandler {
    fn handle(&self, _context: &RequestContext) -> Response {
        let items: Vec<String> = self
            .service
            .all()
            .iter()
            .map(|invoice| {
                format!(
                    r#"{{"number":"{}","amount_cents":{}}}"#,
                    invoice.number, invoice.amount_cents
                )
            })
            .collect();
        Response {
            status: "200 OK",
            body: format!("[{}]", items.join(",")),
        }
    }
}

struct ReadyHandler;

impl Handler for ReadyHandler {
    fn handle(&self, context: &RequestContext) -> Response {
        tracing::info!(request_id = context.request_id, "readiness probe");
        Response {
            status: "200 OK",
            body: "ok".into(),
        }
    }
}

/// Wraps every handler with request logging.
struct RequestLogging {
    inner: Arc<dyn Handler>,
}

impl Handler for RequestLogging {
    fn handle(&self, context: &RequestContext) -> Response {
        tracing::info!(request_id = context.request_id, method = %context.method, path = %context.path, "processing request");
        let response = self.inner.handle(context);
        tracing::info!(request_id = context.request_id, status = response.status, "processed request");
        response
    }
}

// ===== Wiring =====

fn configure() -> Result<Container, DiError> {
    let container = Container::with_config(ContainerConfig::from_env().with_label("invoices"));

    container.add_scoped_trait_factory::<dyn InvoiceRepository, _>(|c| {
        Arc::new(InMemoryInvoiceRepository {
            context: c.get_required::<RequestContext>(),
        })
    })?;
    container.add_scoped_trait_factory::<dyn InvoiceService, _>(|c| {
        Arc::new(DefaultInvoiceService {
            repository: c.get_required_trait::<dyn InvoiceRepository>(),
        })
    })?;

    container.add_named_scoped_trait_factory::<dyn Handler, _>("/", |c| {
        Arc::new(InvoicesHandler {
            service: c.get_required_trait::<dyn InvoiceService>(),
        })
    })?;
    container.add_named_transient_trait_factory::<dyn Handler, _>("/ready", |_| Arc::new(ReadyHandler))?;

    // Applies to both named handlers.
    container.decorate::<dyn Handler, _>(|inner, _| Arc::new(RequestLogging { inner }))?;

    Ok(container)
}

// ===== Server =====

struct Server {
    container: Container,
    requests: AtomicU64,
}

impl Server {
    fn handle_request(&self, raw: &str) -> String {
        let mut request_line = raw.lines().next().unwrap_or_default().split(' ');
        let method = request_line.next().unwrap_or("GET").to_string();
        let path = request_line.next().unwrap_or("/").to_string();
        let user_agent = raw
            .lines()
            .find_map(|line| line.strip_prefix("User-Agent: "))
            .unwrap_or("unknown")
            .to_string();

        let scope = self.container.create_scope();
        let context = RequestContext {
            request_id: self.requests.fetch_add(1, Ordering::Relaxed) + 1,
            method,
            path: path.clone(),
            user_agent,
        };
        if let Err(e) = scope.add_scoped(context) {
            return http_response("500 Internal Server Error", &e.to_string());
        }

        let response = match scope.get_named_trait::<dyn Handler>(path) {
            Ok(handler) => handler.handle(&scope.get_required::<RequestContext>()),
            Err(DiError::FactoryNotRegistered { .. }) => Response {
                status: "404 Not Found",
                body: "not found".into(),
            },
            Err(e) => Response {
                status: "500 Internal Server Error",
                body: e.to_string(),
            },
        };
        http_response(response.status, &response.body)
    }

    fn handle_connection(&self, mut stream: TcpStream) -> std::io::Result<()> {
        let mut buffer = [0; 4096];
        let bytes_read = stream.read(&mut buffer)?;
        let request = String::from_utf8_lossy(&buffer[..bytes_read]);

        let response = self.handle_request(&request);
        stream.write_all(response.as_bytes())?;
        stream.flush()
    }
}

fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let server = Arc::new(Server {
        container: configure()?,
        requests: AtomicU64::new(0),
    });

    let listener = TcpListener::bind("127.0.0.1:8080")?;
    tracing::info!("listening on http://127.0.0.1:8080");

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let server = Arc::clone(&server);
                thread::spawn(move || {
                    if let Err(e) = server.handle_connection(stream) {
                        tracing::warn!(error = %e, "connection failed");
                    }
                });
            }
            Err(e) => tracing::warn!(error = %e, "accept failed"),
        }
    }
    Ok(())
}

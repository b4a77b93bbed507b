//! Read-only HTTP responder for the durable data file
//!
//! `GET /` answers with the file content verbatim and
//! `Content-Type: application/json`. The file is read fresh on every
//! request; since the log replaces it by rename, a request sees either the
//! previous or the new array, never a torn write.
//!
//! | Request | Answer |
//! |---------|--------|
//! | `GET /`, file present | 200, file bytes |
//! | `GET /`, file missing | 200, `[]` |
//! | `GET /`, read error | 500 |
//! | other path | 404 |
//! | other method | 405 |

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;

use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};

/// Serve `data_file` on `addr` until `shutdown` resolves
pub async fn serve(
    addr: SocketAddr,
    data_file: PathBuf,
    shutdown: impl Future<Output = ()>,
) -> Result<(), ResponderError> {
    let listener = TcpListener::bind(addr)?;
    serve_listener(listener, data_file, shutdown).await
}

/// Serve `data_file` on an already bound listener
///
/// Returns once the server has stopped. The bound address is logged, which
/// matters when the listener uses port 0.
pub async fn serve_listener(
    listener: TcpListener,
    data_file: PathBuf,
    shutdown: impl Future<Output = ()>,
) -> Result<(), ResponderError> {
    let data_file = Arc::new(data_file);

    let make_service = make_service_fn(move |_conn| {
        let data_file = Arc::clone(&data_file);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                handle_request(req, Arc::clone(&data_file))
            }))
        }
    });

    let server = Server::from_tcp(listener)?.serve(make_service);
    log::info!("serving data file at http://{}/", server.local_addr());

    server.with_graceful_shutdown(shutdown).await?;
    Ok(())
}

/// Responder startup or runtime failure
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    /// Address could not be bound
    #[error("bind failed: {0}")]
    Bind(#[from] io::Error),

    /// Server failed while running
    #[error("server error: {0}")]
    Server(#[from] hyper::Error),
}

/// Answer one request
pub async fn handle_request(
    req: Request<Body>,
    data_file: Arc<PathBuf>,
) -> Result<Response<Body>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => Ok(read_data_file(&data_file).await),
        (_, "/") => {
            let mut response = status_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET"));
            Ok(response)
        }
        _ => Ok(status_response(StatusCode::NOT_FOUND, "Not Found")),
    }
}

async fn read_data_file(path: &PathBuf) -> Response<Body> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => b"[]".to_vec(),
        Err(e) => {
            log::error!("failed to read {}: {}", path.display(), e);
            return status_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    let mut response = Response::new(Body::from(bytes));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn status_response(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}

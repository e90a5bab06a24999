use std::io::Cursor;

use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{debug, info, warn};

use crate::page;
use crate::state::SharedMonitor;

type Reply = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn respond_bytes(code: u16, content_type: &str, body: Vec<u8>) -> Reply {
    let len = body.len();
    let headers = [header("Content-Type", content_type), header("Cache-Control", "no-store")]
        .into_iter()
        .flatten()
        .collect();
    Response::new(StatusCode(code), headers, Cursor::new(body), Some(len), None)
}

fn html_response(body: String) -> Reply {
    respond_bytes(200, "text/html; charset=utf-8", body.into_bytes())
}

fn json_response(body: String) -> Reply {
    respond_bytes(200, "application/json", body.into_bytes())
}

fn text_response(code: u16, body: impl Into<String>) -> Reply {
    respond_bytes(code, "text/plain; charset=utf-8", body.into().into_bytes())
}

fn not_found() -> Reply {
    text_response(404, "404 Not Found")
}

fn redirect(location: &str) -> Reply {
    let headers = header("Location", location).into_iter().collect();
    Response::new(StatusCode(303), headers, Cursor::new(Vec::new()), Some(0), None)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn index(monitor: &SharedMonitor) -> Reply {
    let status = monitor.status();
    let report = monitor.report();
    html_response(page::render(&status, report.as_deref()))
}

fn plot(monitor: &SharedMonitor) -> Reply {
    // Frames are renamed into place, so a read never sees half a PNG.
    match monitor.plot() {
        Some(bytes) => respond_bytes(200, "image/png", bytes),
        None => not_found(),
    }
}

fn status(monitor: &SharedMonitor) -> Reply {
    match serde_json::to_string(&monitor.status()) {
        Ok(body) => json_response(body),
        Err(e) => text_response(500, format!("status serialization failed: {e}")),
    }
}

fn report(monitor: &SharedMonitor) -> Reply {
    match monitor.report() {
        Some(text) => text_response(200, text),
        None => not_found(),
    }
}

fn pause(monitor: &SharedMonitor) -> Reply {
    monitor.pause.pause();
    info!("training paused");
    redirect("/")
}

fn resume(monitor: &SharedMonitor) -> Reply {
    monitor.pause.resume();
    info!("training resumed");
    redirect("/")
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

fn route(method: &Method, path: &str, monitor: &SharedMonitor) -> Reply {
    match (method, path) {
        (Method::Get, "/") => index(monitor),
        (Method::Get, "/plot.png") => plot(monitor),
        (Method::Get, "/status") => status(monitor),
        (Method::Get, "/report") => report(monitor),
        (Method::Post, "/pause") => pause(monitor),
        (Method::Post, "/resume") => resume(monitor),
        _ => not_found(),
    }
}

pub fn dispatch(request: Request, monitor: SharedMonitor) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split('?').next().unwrap_or("");
    debug!(%method, path, "request");

    let response = route(&method, path, &monitor);
    if let Err(e) = request.respond(response) {
        warn!(error = %e, path, "failed to send response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::state::Monitor;

    fn monitor(dir: &std::path::Path) -> SharedMonitor {
        Arc::new(Monitor::new(dir.join("plot.png")))
    }

    fn code(reply: &Reply) -> u16 {
        reply.status_code().0
    }

    #[test]
    fn report_and_plot_are_missing_before_the_run_writes_them() {
        let dir = tempfile::tempdir().unwrap();
        let m = monitor(dir.path());
        assert_eq!(code(&route(&Method::Get, "/report", &m)), 404);
        assert_eq!(code(&route(&Method::Get, "/plot.png", &m)), 404);
        assert_eq!(code(&route(&Method::Get, "/status", &m)), 200);

        m.finish(Ok("R^2  : 0.900000".into()));
        assert_eq!(code(&route(&Method::Get, "/report", &m)), 200);
    }

    #[test]
    fn pause_and_resume_toggle_the_token() {
        let dir = tempfile::tempdir().unwrap();
        let m = monitor(dir.path());
        assert_eq!(code(&route(&Method::Post, "/pause", &m)), 303);
        assert!(m.pause.is_paused());
        route(&Method::Post, "/resume", &m);
        assert!(!m.pause.is_paused());
    }

    #[test]
    fn unknown_routes_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let m = monitor(dir.path());
        assert_eq!(code(&route(&Method::Get, "/nope", &m)), 404);
        assert_eq!(code(&route(&Method::Get, "/pause", &m)), 404);
    }
}

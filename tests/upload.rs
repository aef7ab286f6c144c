use std::io::Read;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use sketchpad::transport::{Gateway, HttpGateway, Uploader};
use sketchpad::{SketchError, SceneSurface, SurfaceConfig};
use tiny_http::{Response, Server};

struct Received {
    content_type: Option<String>,
    method: String,
    body: String,
}

/// Serve exactly one request with `status`, forwarding what arrived.
fn one_shot_server(status: u16) -> (String, mpsc::Receiver<Received>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string());
            let method = request.method().as_str().to_string();
            let _ = tx.send(Received { content_type, method, body });
            let _ = request.respond(Response::from_string("{\"name\":\"-Nabc\"}").with_status_code(status));
        }
    });
    (format!("http://{}/images.json", addr), rx)
}

#[test]
fn posts_json_string_payload() {
    let (url, rx) = one_shot_server(200);
    let gw = HttpGateway::new(url, Duration::from_secs(5)).unwrap();

    let surface = SceneSurface::new(SurfaceConfig { width: 20, height: 10, ..Default::default() });
    let uri = surface.rasterize(1.0).unwrap().to_data_uri();
    gw.upload(&uri).unwrap();

    let got = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(got.method, "POST");
    assert_eq!(got.content_type.as_deref(), Some("application/json"));
    let decoded: String = serde_json::from_str(&got.body).unwrap();
    assert_eq!(decoded, uri);
}

#[test]
fn non_2xx_is_a_transport_error() {
    let (url, _rx) = one_shot_server(500);
    let gw = HttpGateway::new(url, Duration::from_secs(5)).unwrap();
    let err = gw.upload("data:image/png;base64,AA==").unwrap_err();
    assert!(matches!(err, SketchError::Transport(_)));
    assert_eq!(err.user_message(), "Something went wrong; please try it again.");
}

#[test]
fn unreachable_endpoint_is_a_transport_error() {
    // bind then drop to get a port nobody listens on
    let port = {
        let s = Server::http("127.0.0.1:0").unwrap();
        s.server_addr().to_ip().unwrap().port()
    };
    let gw = HttpGateway::new(format!("http://127.0.0.1:{port}/x"), Duration::from_secs(2)).unwrap();
    assert!(matches!(gw.upload("x"), Err(SketchError::Transport(_))));
}

#[test]
fn uploader_sets_flags_only_after_success() {
    let (url, _rx) = one_shot_server(200);
    let gw = HttpGateway::new(url, Duration::from_secs(5)).unwrap();
    let mut up = Uploader::new(Arc::new(gw));
    let mut surface = SceneSurface::new(SurfaceConfig::default());

    up.submit(surface.rasterize(1.0).unwrap().to_data_uri());
    assert!(!surface.status().success());

    let start = Instant::now();
    let outcome = loop {
        if let Some(o) = up.poll() {
            break o;
        }
        assert!(start.elapsed() < Duration::from_secs(5));
        thread::sleep(Duration::from_millis(5));
    };
    surface.record_upload(&outcome);
    assert!(surface.status().submitted());
    assert!(surface.status().success());
}

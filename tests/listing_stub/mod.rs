#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

pub static WALLPAPER_PNG: &[u8] = &[
    137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 1, 0, 0, 0, 1, 8, 4, 0,
    0, 0, 181, 28, 12, 2, 0, 0, 0, 11, 73, 68, 65, 84, 120, 218, 99, 252, 255, 23, 0, 2, 3, 1, 128,
    110, 220, 25, 0, 0, 0, 0, 73, 69, 78, 68, 174, 66, 96, 130,
];

pub const SUFFIX: &str = ".295x184_q100.png";

#[derive(Debug, Clone, Default)]
pub struct ListingStubConfig {
    /// Full-image paths per listing page; page N is `pages[N - 1]`.
    pub pages: Vec<Vec<&'static str>>,
    /// Answer this many listing requests with HTTP 500 first.
    pub fail_first_listings: usize,
}

pub struct ListingStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListingStub {
    pub fn spawn(config: ListingStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start listing stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let failures = AtomicUsize::new(config.fail_first_listings);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                seen.lock().expect("lock request log").push(path.clone());

                if let Some(page) = path.strip_prefix("/page/") {
                    if failures
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                        .is_ok()
                    {
                        let _ = request.respond(
                            tiny_http::Response::from_string("try again").with_status_code(500),
                        );
                        continue;
                    }

                    let images = page
                        .parse::<usize>()
                        .ok()
                        .and_then(|page| page.checked_sub(1))
                        .and_then(|idx| config.pages.get(idx))
                        .cloned()
                        .unwrap_or_default();
                    let _ = request.respond(html_response(&listing_html(&images)));
                    continue;
                }

                if path.starts_with("/media/") && !path.ends_with(SUFFIX) {
                    let header =
                        tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"image/png"[..])
                            .expect("build header");
                    let _ = request.respond(
                        tiny_http::Response::from_data(WALLPAPER_PNG.to_vec()).with_header(header),
                    );
                    continue;
                }

                let _ = request
                    .respond(tiny_http::Response::from_string("not found").with_status_code(404));
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn listing_url(&self) -> String {
        format!("{}/page/{{page}}", self.base_url)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock request log").clone()
    }
}

impl Drop for ListingStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn listing_html(images: &[&str]) -> String {
    let mut body = String::from(
        "<!doctype html>\n<html>\n<head><title>Wallpapers</title></head>\n<body>\n  <img src=\"/static/logo.svg\" alt=\"logo\">\n",
    );
    for image in images {
        body.push_str(&format!("  <a href=\"{image}\"><img src=\"{image}{SUFFIX}\"></a>\n"));
    }
    body.push_str("</body>\n</html>\n");
    body
}

fn html_response(body: &str) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let header = tiny_http::Header::from_bytes(
        &b"Content-Type"[..],
        &b"text/html; charset=utf-8"[..],
    )
    .expect("build header");
    tiny_http::Response::from_string(body).with_header(header)
}

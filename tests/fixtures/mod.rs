//! Shared test fixtures.
//!
//! Provides:
//! - The unit-square world used across solver tests
//! - A helper that serves an axum router on an ephemeral port

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

use axum::Router;
use tsp_evo::{City, World};

/// Corners of the unit square; the optimal tour is the perimeter (length 4).
pub fn square_cities() -> Vec<City> {
    vec![
        City::new("andermatt", 0.0, 1.0),
        City::new("barcelona", 0.0, 0.0),
        City::new("como", 1.0, 0.0),
        City::new("dijon", 1.0, 1.0),
    ]
}

pub fn square_world() -> World {
    World::new(square_cities()).expect("square world")
}

pub fn square_mapping() -> BTreeMap<String, [f64; 2]> {
    square_cities()
        .into_iter()
        .map(|city| (city.name, [city.x, city.y]))
        .collect()
}

/// Serve `app` on 127.0.0.1 from a background runtime and return its base URL.
///
/// The server lives until the test process exits.
pub fn spawn_router(app: Router) -> String {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral port");
            tx.send(listener.local_addr().expect("local addr"))
                .expect("send address");
            axum::serve(listener, app).await.expect("serve");
        });
    });

    let addr = rx.recv().expect("server address");
    format!("http://{addr}")
}

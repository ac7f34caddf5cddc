mod common;

use http::{Method, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use strutrouter::{LazyDispatcher, RequestContext};

use common::{petstore_config, petstore_contract, temp_contract, PETSTORE};

#[test]
fn test_concurrent_first_requests_build_once() {
    const THREADS: usize = 8;
    let loads = Arc::new(AtomicUsize::new(0));
    let loads_in = Arc::clone(&loads);
    let lazy = Arc::new(LazyDispatcher::new(
        move || {
            loads_in.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            Ok(petstore_contract())
        },
        petstore_config(),
    ));
    assert!(!lazy.is_built());

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let lazy = Arc::clone(&lazy);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut ctx = RequestContext::new(Method::GET, "/api/pets");
                lazy.dispatch(&mut ctx);
                ctx.status
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some(StatusCode::OK));
    }
    assert!(lazy.is_built());
    assert_eq!(lazy.build_attempts(), 1);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_from_path() {
    let file = temp_contract(PETSTORE, "yaml");
    let lazy = LazyDispatcher::from_path(file.path(), petstore_config());

    let mut ctx = RequestContext::new(Method::GET, "/api/pets/1").with_header("X-Api-Key", "reader-key");
    lazy.dispatch(&mut ctx);
    assert_eq!(ctx.status, Some(StatusCode::OK));
    assert_eq!(ctx.body.unwrap()["name"], "rex");
    assert_eq!(lazy.get().unwrap().routes().len(), 5);
}

#[test]
fn test_unloadable_contract_is_500_every_time() {
    let lazy = LazyDispatcher::from_path("/no/such/contract.yaml", petstore_config());
    for _ in 0..2 {
        let mut ctx = RequestContext::new(Method::GET, "/api/pets");
        lazy.dispatch(&mut ctx);
        assert_eq!(ctx.status, Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(ctx.body.unwrap()["code"], "INITIALIZATION_FAILED");
    }
    assert_eq!(lazy.build_attempts(), 2);
    assert!(!lazy.is_built());
}

#[test]
fn test_unverifiable_contract_is_500() {
    let lazy = LazyDispatcher::new(
        || Ok(petstore_contract()),
        strutrouter::DispatcherConfig::builder().build(),
    );
    let err = lazy.get().unwrap_err();
    assert!(format!("{err:#}").contains("MissingHandler"));
}

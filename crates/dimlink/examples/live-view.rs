//! Decode a capture on one thread while another thread renders the latest
//! snapshot, the way a dashboard would.
//!
//! Run with:
//!   cargo run --features cli -- simulate --frames 200 --out /tmp/dimlink.bin
//!   cargo run --example live-view -- /tmp/dimlink.bin

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dimlink::session::{open_capture, SessionConfig};
use dimlink::telemetry::MotorSlot;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "-".to_string());
    let mut session = open_capture(&path, SessionConfig::default())?;
    let sink = session.sink();
    let done = Arc::new(AtomicBool::new(false));

    let view = {
        let done = done.clone();
        thread::spawn(move || {
            let mut last_generation = 0;
            while !done.load(Ordering::SeqCst) {
                let view = sink.view();
                if view.generation != last_generation {
                    last_generation = view.generation;
                    match view.latest {
                        Some(snapshot) => {
                            let clutch = snapshot.motor(MotorSlot::Clutch);
                            eprintln!(
                                "[{}] mode={} clutch={} @ {:.2}",
                                if view.receiving { "live" } else { "stale" },
                                snapshot.mode(),
                                clutch.state,
                                clutch.actual_position
                            );
                        }
                        None => eprintln!("[idle] no data"),
                    }
                }
                thread::sleep(Duration::from_millis(50));
            }
        })
    };

    // Slow the reader down so the render thread sees intermediate states.
    session.run(|_| {
        thread::sleep(Duration::from_millis(5));
        ControlFlow::Continue(())
    })?;

    done.store(true, Ordering::SeqCst);
    let _ = view.join();
    eprintln!("decoded {} frames", session.stats().frames);
    Ok(())
}

//! Instance loggers follow their object's current name.
//!
//! Run with: cargo run -p sessionlog --example instance_logger

use std::sync::{Arc, Mutex};

use sessionlog::{DisplayName, Emit, LogResult, Session, Severity};

struct Simulation {
    name: Mutex<String>,
}

impl Simulation {
    fn rename(&self, name: &str) {
        if let Ok(mut current) = self.name.lock() {
            *current = name.to_string();
        }
    }
}

impl DisplayName for Simulation {
    fn display_name(&self) -> String {
        self.name.lock().map(|name| name.clone()).unwrap_or_default()
    }
}

fn main() -> LogResult<()> {
    let session = Session::builder()
        .level(Severity::Debug)
        .console_header(true)
        .build()?;

    sessionlog::info!(session, "session started");

    let solver = session.add_child_logger("solver", Some(Severity::Info))?;
    solver.debug("not shown: the child runs at INFO");
    sessionlog::info!(solver, "mesh loaded with {} cells", 1024);

    let simulation = Arc::new(Simulation {
        name: Mutex::new("draft".to_string()),
    });
    let instance = session.add_instance_logger("simulation", &simulation, None)?;
    instance.info("created");
    simulation.rename("wing-v2");
    instance.warning("renamed; later lines carry the new name");

    for name in session.names() {
        session.get(&name)?.debug(&format!("registered as {name}"));
    }
    Ok(())
}

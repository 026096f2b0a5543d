use std::rc::Rc;
use std::time::{Duration, Instant};

use pollbind::{Engine, PollScheduler, RenderTarget, StateTree, TargetId, Value};

/// Prints every write to stdout.
struct Console(&'static str);

impl RenderTarget for Console {
    fn target_id(&self) -> TargetId {
        self.0.into()
    }

    fn write(&self, markup: &str) -> anyhow::Result<()> {
        println!("[{}] {}", self.0, markup);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let tree = StateTree::from_json(&serde_json::json!({
        "clock": { "seconds": 0 },
        "greeting": { "name": "world" }
    }))?;
    let mut engine = Engine::new(tree.clone());
    let mut scheduler = PollScheduler::for_engine(&engine);

    let clock = Rc::new(Console("clock"));
    let greeting = Rc::new(Console("greeting"));
    engine.register("clock.seconds", &clock, |v| Ok(format!("<b>{v}s</b>")))?;
    engine.register("greeting", &greeting, |v: &Value| {
        Ok(format!("<p>Hello, {}!</p>", v.get("name").unwrap_or_default()))
    })?;

    let start = Instant::now();
    let mut last = start;
    while start.elapsed() < Duration::from_secs(3) {
        let now = Instant::now();
        let dt = now - last;
        last = now;

        // the host mutates the tree; nothing tells the engine
        tree.set("clock.seconds", start.elapsed().as_secs() as f64)?;
        if start.elapsed() > Duration::from_millis(1500) {
            tree.set("greeting.name", "pollbind")?;
        }

        if let Some(report) = scheduler.advance(&mut engine, dt)? {
            if !report.rendered.is_empty() {
                println!("pass {} re-rendered {:?}", report.epoch, report.rendered);
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    engine.unbind("clock")?;
    println!("clock bound: {}", engine.is_bound("clock")?);
    Ok(())
}

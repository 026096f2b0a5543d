use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use pollbind::{RenderTarget, TargetId, RENDER_MARKER};
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    models: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod models {
    use super::*;
    use pollbind::StateTree;

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.models, "model", name)?;
        super::load_json(rel)
    }

    /// Fresh state tree seeded from the named model fixture.
    pub fn tree(name: &str) -> Result<StateTree> {
        let json: serde_json::Value = load(name)?;
        StateTree::from_json(&json)
            .with_context(|| format!("model fixture '{name}' is not a map"))
    }
}

/// Render target that keeps every write it receives.
#[derive(Debug)]
pub struct RecordingTarget {
    id: TargetId,
    writes: RefCell<Vec<String>>,
    attached: Cell<bool>,
    failing: Cell<bool>,
}

impl RecordingTarget {
    pub fn new(id: &str) -> Rc<Self> {
        Rc::new(Self {
            id: id.into(),
            writes: RefCell::new(Vec::new()),
            attached: Cell::new(true),
            failing: Cell::new(false),
        })
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn last(&self) -> Option<String> {
        self.writes.borrow().last().cloned()
    }

    /// Last write with the render marker stripped.
    pub fn last_content(&self) -> Option<String> {
        self.last()
            .map(|m| m.strip_prefix(RENDER_MARKER).unwrap_or(m.as_str()).to_string())
    }

    /// Report the target as detached from now on.
    pub fn detach(&self) {
        self.attached.set(false);
    }

    /// Make subsequent writes fail.
    pub fn fail_writes(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl RenderTarget for RecordingTarget {
    fn target_id(&self) -> TargetId {
        self.id.clone()
    }

    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn write(&self, markup: &str) -> Result<()> {
        if self.failing.get() {
            return Err(anyhow!("target '{}' refused the write", self.id));
        }
        self.writes.borrow_mut().push(markup.to_string());
        Ok(())
    }
}

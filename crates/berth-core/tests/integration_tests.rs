//! Integration tests for berth-core: the generate pipeline over in-process
//! port implementations.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use berth_core::{
    application::{ApplicationError, ports::*},
    domain::ManifestDocument,
    prelude::*,
};

// ── in-process ports ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Projects(BTreeMap<PathBuf, &'static str>);

impl ManifestLoader for Projects {
    fn load(&self, project_path: &Path) -> BerthResult<Manifest> {
        let raw = self.0.get(project_path).ok_or_else(|| {
            BerthError::from(ApplicationError::ManifestNotFound {
                path: project_path.to_path_buf(),
            })
        })?;
        let doc: ManifestDocument = serde_yaml::from_str(raw).map_err(|e| {
            BerthError::from(ApplicationError::ManifestParse {
                path: project_path.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
        let fallback = project_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("project");
        Ok(Manifest::from_document(doc, fallback)?)
    }
}

#[derive(Default)]
struct SharedLedger(Mutex<PortTable>);

impl PortLedger for SharedLedger {
    fn get(&self, key: &LedgerKey) -> BerthResult<Option<u16>> {
        Ok(self.0.lock().unwrap().get(key))
    }

    fn reserve(&self, key: &LedgerKey, host_port: u16) -> BerthResult<ReserveOutcome> {
        Ok(self.0.lock().unwrap().reserve(key.clone(), host_port))
    }

    fn release(&self, keys: &[LedgerKey]) -> BerthResult<usize> {
        let mut table = self.0.lock().unwrap();
        Ok(keys.iter().filter_map(|k| table.release(k)).count())
    }

    fn release_project(&self, project: &str) -> BerthResult<usize> {
        Ok(self.0.lock().unwrap().release_project(project))
    }

    fn live_host_ports(&self) -> BerthResult<BTreeSet<u16>> {
        Ok(self.0.lock().unwrap().live_host_ports())
    }

    fn entries(&self) -> BerthResult<Vec<LedgerEntry>> {
        Ok(self.0.lock().unwrap().entries())
    }
}

struct Bound(BTreeSet<u16>);

impl PortProbe for Bound {
    fn is_bound(&self, port: u16) -> bool {
        self.0.contains(&port)
    }
}

#[derive(Clone, Default)]
struct Written(Arc<Mutex<BTreeMap<PathBuf, ComposeDescriptor>>>);

impl ComposeWriter for Written {
    fn write(&self, descriptor: &ComposeDescriptor, path: &Path) -> BerthResult<()> {
        self.0
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), descriptor.clone());
        Ok(())
    }
}

// ── fixtures ──────────────────────────────────────────────────────────────────

const SHOP: &str = r#"
name: shop
framework: laravel
services:
  app:
    build: .
    ports: ["80", "443"]
  db:
    image: mysql:8
    ports: [3306]
"#;

const BLOG: &str = r#"
services:
  web:
    image: ghost:5
    ports: ["2368"]
"#;

struct Harness {
    ledger: Arc<SharedLedger>,
    written: Written,
}

impl Harness {
    fn new() -> Self {
        Self {
            ledger: Arc::new(SharedLedger::default()),
            written: Written::default(),
        }
    }

    fn service(&self, bound: &[u16]) -> GenerateService {
        let mut projects = Projects::default();
        projects.0.insert(PathBuf::from("/work/shop"), SHOP);
        projects.0.insert(PathBuf::from("/work/blog"), BLOG);

        GenerateService::new(
            Box::new(projects),
            PortAllocator::new(
                Box::new(Arc::clone(&self.ledger)),
                Box::new(Bound(bound.iter().copied().collect())),
            ),
            ComposeSynthesizer::default(),
            Box::new(self.written.clone()),
        )
    }

    fn compose(&self, path: &str) -> ComposeDescriptor {
        self.written.0.lock().unwrap()[Path::new(path)].clone()
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[test]
fn full_generate_workflow() {
    let harness = Harness::new();
    let report = harness
        .service(&[])
        .generate(&GenerateRequest::new("/work/shop"))
        .unwrap();

    assert_eq!(report.project.as_str(), "shop");
    assert_eq!(report.compose_path, PathBuf::from("/work/shop/docker-compose.yml"));
    assert_eq!(report.ports.host_port("app", 80), Some(10000));
    assert_eq!(report.ports.host_port("app", 443), Some(10001));
    assert_eq!(report.ports.host_port("db", 3306), Some(10002));

    let compose = harness.compose("/work/shop/docker-compose.yml");
    assert_eq!(compose.services["app"].ports, vec!["10000:80", "10001:443"]);
    assert_eq!(compose.services["app"].image.as_deref(), Some("shop-laravel-app"));
    assert_eq!(compose.services["db"].container_name, "shop-db");
}

#[test]
fn projects_share_one_ledger_without_collisions() {
    let harness = Harness::new();
    let service = harness.service(&[]);

    let shop = service.generate(&GenerateRequest::new("/work/shop")).unwrap();
    let blog = service.generate(&GenerateRequest::new("/work/blog")).unwrap();

    assert_eq!(blog.project.as_str(), "blog");
    assert_eq!(blog.ports.host_port("web", 2368), Some(10003));

    let mut hosts = BTreeSet::new();
    for map in [&shop.ports, &blog.ports] {
        for (_, ports) in map.iter() {
            for host in ports.values() {
                assert!(hosts.insert(*host), "host port {host} handed out twice");
            }
        }
    }
}

#[test]
fn rerun_keeps_ports_even_when_they_are_now_bound() {
    let harness = Harness::new();
    let first = harness
        .service(&[])
        .generate(&GenerateRequest::new("/work/shop"))
        .unwrap();

    // The containers are running now, so the probe sees their ports.
    let second = harness
        .service(&[10000, 10001, 10002])
        .generate(&GenerateRequest::new("/work/shop"))
        .unwrap();

    assert_eq!(first.ports, second.ports);
}

#[test]
fn bound_ports_are_skipped_for_new_reservations() {
    let harness = Harness::new();
    let report = harness
        .service(&[10000, 10002])
        .generate(&GenerateRequest::new("/work/shop"))
        .unwrap();

    assert_eq!(report.ports.host_port("app", 80), Some(10001));
    assert_eq!(report.ports.host_port("app", 443), Some(10003));
    assert_eq!(report.ports.host_port("db", 3306), Some(10004));
}

#[test]
fn reset_ports_moves_the_project() {
    let harness = Harness::new();
    harness
        .service(&[])
        .generate(&GenerateRequest::new("/work/shop"))
        .unwrap();

    let mut request = GenerateRequest::new("/work/shop");
    request.reset_ports = true;
    let report = harness.service(&[10000]).generate(&request).unwrap();

    assert_eq!(report.ports.host_port("app", 80), Some(10001));
    assert_eq!(harness.ledger.entries().unwrap().len(), 3);
}

#[test]
fn unknown_project_is_not_found() {
    let harness = Harness::new();
    let err = harness
        .service(&[])
        .generate(&GenerateRequest::new("/work/nowhere"))
        .unwrap_err();

    assert_eq!(err.category(), berth_core::error::ErrorCategory::NotFound);
    assert!(harness.ledger.entries().unwrap().is_empty());
}

//! Generate Service - main application orchestrator.
//!
//! This service coordinates the whole `berth generate` workflow:
//! 1. Load the manifest
//! 2. Allocate host ports (optionally after a reset)
//! 3. Prune ledger entries the manifest no longer declares
//! 4. Synthesize the compose descriptor
//! 5. Write it (fatal on failure)
//! 6. Publish endpoints (best-effort, never fatal)

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::{
    application::{
        ports::{ComposeWriter, ManifestLoader},
        services::{EndpointPublisher, PortAllocator, PublishReport},
    },
    domain::{ComposeSynthesizer, DomainValidator as validator, ProjectName, ResolvedPortMap},
    error::{BerthError, BerthResult},
};

/// Compose file name written next to the manifest when none is configured.
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub project_path: PathBuf,
    /// Explicit output file; defaults to `<project_path>/<compose file name>`.
    pub output: Option<PathBuf>,
    /// Release the project's ports before allocating.
    pub reset_ports: bool,
    /// Release ports the manifest no longer declares.
    pub prune_stale: bool,
}

impl GenerateRequest {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            output: None,
            reset_ports: false,
            prune_stale: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub project: ProjectName,
    pub compose_path: PathBuf,
    pub ports: ResolvedPortMap,
    pub pruned: usize,
    /// `None` when publishing is disabled.
    pub publish: Option<PublishReport>,
}

pub struct GenerateService {
    loader: Box<dyn ManifestLoader>,
    allocator: PortAllocator,
    synthesizer: ComposeSynthesizer,
    writer: Box<dyn ComposeWriter>,
    publisher: Option<EndpointPublisher>,
    compose_file_name: String,
}

impl GenerateService {
    pub fn new(
        loader: Box<dyn ManifestLoader>,
        allocator: PortAllocator,
        synthesizer: ComposeSynthesizer,
        writer: Box<dyn ComposeWriter>,
    ) -> Self {
        Self {
            loader,
            allocator,
            synthesizer,
            writer,
            publisher: None,
            compose_file_name: DEFAULT_COMPOSE_FILE.to_string(),
        }
    }

    #[must_use]
    pub fn with_publisher(mut self, publisher: EndpointPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    #[must_use]
    pub fn with_compose_file_name(mut self, name: impl Into<String>) -> Self {
        self.compose_file_name = name.into();
        self
    }

    pub fn allocator(&self) -> &PortAllocator {
        &self.allocator
    }

    #[instrument(
        skip_all,
        fields(
            project_path = %request.project_path.display(),
            reset = request.reset_ports
        )
    )]
    pub fn generate(&self, request: &GenerateRequest) -> BerthResult<GenerateReport> {
        // 1. Load and validate
        let manifest = self.loader.load(&request.project_path)?;
        validator::validate_manifest(&manifest).map_err(BerthError::Domain)?;
        info!(project = %manifest.name, services = manifest.services.len(), "Manifest loaded");

        // 2. Allocate
        if request.reset_ports {
            self.allocator.release_project(manifest.name.as_str())?;
        }
        let required = manifest.port_requirements();
        let ports = self
            .allocator
            .allocate_ports_for_project(&manifest.name, &required)?;

        // 3. Prune; the allocation already stands, so this only warns
        let pruned = if request.prune_stale {
            self.allocator
                .prune_stale(&manifest.name, &required)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Pruning stale ports failed");
                    0
                })
        } else {
            0
        };

        // 4. Synthesize
        let descriptor = self.synthesizer.synthesize(&manifest, &ports);

        // 5. Write
        let compose_path = self.compose_path(request);
        self.writer.write(&descriptor, &compose_path)?;
        info!(path = %compose_path.display(), "Compose file written");

        // 6. Publish
        let publish = self
            .publisher
            .as_ref()
            .map(|p| p.publish(&manifest.name, &ports, &request.project_path));

        Ok(GenerateReport {
            project: manifest.name,
            compose_path,
            ports,
            pruned,
            publish,
        })
    }

    fn compose_path(&self, request: &GenerateRequest) -> PathBuf {
        match &request.output {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => request.project_path.join(path),
            None => request.project_path.join(&self.compose_file_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use crate::application::ports::{
        MockComposeWriter, MockFilesystem, MockManifestLoader, MockNameResolver,
    };
    use crate::application::services::StepOutcome;
    use crate::application::services::testing::{NeverBound, TableLedger};
    use crate::domain::{LedgerKey, Manifest, ServiceSpec};
    use std::sync::{Arc, Mutex};

    fn shop_manifest() -> Manifest {
        Manifest::new(ProjectName::parse("shop").unwrap())
            .with_framework("laravel")
            .with_service("app", ServiceSpec::build(".", "Dockerfile").port("80"))
            .with_service("db", ServiceSpec::image("mysql:8").port("3306"))
    }

    fn loader_for(manifest: Manifest) -> Box<MockManifestLoader> {
        let mut loader = MockManifestLoader::new();
        loader
            .expect_load()
            .returning(move |_| Ok(manifest.clone()));
        Box::new(loader)
    }

    fn accepting_writer() -> Box<MockComposeWriter> {
        let mut writer = MockComposeWriter::new();
        writer.expect_write().returning(|_, _| Ok(()));
        Box::new(writer)
    }

    fn service(ledger: &Arc<TableLedger>, manifest: Manifest) -> GenerateService {
        GenerateService::new(
            loader_for(manifest),
            PortAllocator::new(Box::new(Arc::clone(ledger)), Box::new(NeverBound)),
            ComposeSynthesizer::default(),
            accepting_writer(),
        )
    }

    #[test]
    fn generate_twice_is_idempotent() {
        let ledger = Arc::new(TableLedger::default());
        let svc = service(&ledger, shop_manifest());
        let request = GenerateRequest::new("/work/shop");

        let first = svc.generate(&request).unwrap();
        let second = svc.generate(&request).unwrap();

        assert_eq!(first.ports.host_port("app", 80), Some(10000));
        assert_eq!(first.ports.host_port("db", 3306), Some(10001));
        assert_eq!(first.ports, second.ports);
        assert_eq!(first.compose_path, PathBuf::from("/work/shop/docker-compose.yml"));
        assert!(first.publish.is_none());
    }

    #[test]
    fn writes_synthesized_descriptor() {
        let ledger = Arc::new(TableLedger::default());
        let written = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&written);

        let mut writer = MockComposeWriter::new();
        writer.expect_write().times(1).returning(move |descriptor, path| {
            *sink.lock().unwrap() = Some((descriptor.clone(), path.to_path_buf()));
            Ok(())
        });

        let svc = GenerateService::new(
            loader_for(shop_manifest()),
            PortAllocator::new(Box::new(Arc::clone(&ledger)), Box::new(NeverBound)),
            ComposeSynthesizer::default(),
            Box::new(writer),
        )
        .with_compose_file_name("compose.yaml");

        svc.generate(&GenerateRequest::new("/work/shop")).unwrap();

        let (descriptor, path) = written.lock().unwrap().clone().unwrap();
        assert_eq!(path, PathBuf::from("/work/shop/compose.yaml"));
        assert_eq!(descriptor.services["app"].ports, vec!["10000:80"]);
        assert_eq!(descriptor.services["app"].networks, vec!["shop-network"]);
    }

    #[test]
    fn write_failure_is_fatal_and_keeps_reservations() {
        let ledger = Arc::new(TableLedger::default());
        let mut writer = MockComposeWriter::new();
        writer.expect_write().returning(|_, path| {
            Err(ApplicationError::WriteFailure {
                path: path.to_path_buf(),
                reason: "disk full".into(),
            }
            .into())
        });

        let svc = GenerateService::new(
            loader_for(shop_manifest()),
            PortAllocator::new(Box::new(Arc::clone(&ledger)), Box::new(NeverBound)),
            ComposeSynthesizer::default(),
            Box::new(writer),
        );

        let err = svc.generate(&GenerateRequest::new("/work/shop")).unwrap_err();
        assert!(matches!(
            err,
            BerthError::Application(ApplicationError::WriteFailure { .. })
        ));
        assert_eq!(ledger.snapshot().len(), 2);
    }

    #[test]
    fn missing_manifest_surfaces_verbatim() {
        let ledger = Arc::new(TableLedger::default());
        let mut loader = MockManifestLoader::new();
        loader.expect_load().returning(|path| {
            Err(ApplicationError::ManifestNotFound {
                path: path.to_path_buf(),
            }
            .into())
        });

        let svc = GenerateService::new(
            Box::new(loader),
            PortAllocator::new(Box::new(Arc::clone(&ledger)), Box::new(NeverBound)),
            ComposeSynthesizer::default(),
            Box::new(MockComposeWriter::new()),
        );

        let err = svc.generate(&GenerateRequest::new("/nowhere")).unwrap_err();
        assert!(matches!(
            err,
            BerthError::Application(ApplicationError::ManifestNotFound { .. })
        ));
        assert!(ledger.snapshot().is_empty());
    }

    #[test]
    fn reset_ports_reassigns_from_scratch() {
        let ledger = Arc::new(TableLedger::default());
        ledger.seed(LedgerKey::new("shop", "app", 80), 12345);
        let svc = service(&ledger, shop_manifest());

        let mut request = GenerateRequest::new("/work/shop");
        let kept = svc.generate(&request).unwrap();
        assert_eq!(kept.ports.host_port("app", 80), Some(12345));

        request.reset_ports = true;
        let reset = svc.generate(&request).unwrap();
        assert_eq!(reset.ports.host_port("app", 80), Some(10000));
    }

    #[test]
    fn prunes_ports_no_longer_declared() {
        let ledger = Arc::new(TableLedger::default());
        ledger.seed(LedgerKey::new("shop", "cache", 6379), 10500);
        let svc = service(&ledger, shop_manifest());

        let report = svc.generate(&GenerateRequest::new("/work/shop")).unwrap();
        assert_eq!(report.pruned, 1);
        assert_eq!(ledger.snapshot().holder_of(10500), None);

        let mut keep = GenerateRequest::new("/work/shop");
        keep.prune_stale = false;
        ledger.seed(LedgerKey::new("shop", "cache", 6379), 10500);
        assert_eq!(svc.generate(&keep).unwrap().pruned, 0);
        assert!(ledger.snapshot().holder_of(10500).is_some());
    }

    #[test]
    fn publish_failure_does_not_fail_generate() {
        let ledger = Arc::new(TableLedger::default());
        let mut resolver = MockNameResolver::new();
        resolver.expect_add_project().returning(|_, _| {
            Err(ApplicationError::PublishFailed {
                reason: "no resolver".into(),
            }
            .into())
        });
        let mut fs = MockFilesystem::new();
        fs.expect_write_file().returning(|_, _| Ok(()));

        let svc = service(&ledger, shop_manifest())
            .with_publisher(EndpointPublisher::new(Box::new(resolver), Box::new(fs)));

        let report = svc.generate(&GenerateRequest::new("/work/shop")).unwrap();
        let publish = report.publish.unwrap();
        assert!(!publish.published());
        assert_eq!(publish.summary, StepOutcome::Done);
    }

    #[test]
    fn relative_output_is_resolved_against_project() {
        let ledger = Arc::new(TableLedger::default());
        let svc = service(&ledger, shop_manifest());
        let mut request = GenerateRequest::new("/work/shop");
        request.output = Some(PathBuf::from("deploy/compose.yml"));

        let report = svc.generate(&request).unwrap();
        assert_eq!(
            report.compose_path,
            PathBuf::from("/work/shop/deploy/compose.yml")
        );
    }
}

//! Compose file output.

use std::path::Path;

use berth_core::{
    application::{ApplicationError, ports::ComposeWriter},
    domain::ComposeDescriptor,
    error::BerthResult,
};
use tracing::{debug, instrument};

use crate::persist::atomic_write;

/// First lines of every generated compose file.
pub const GENERATED_HEADER: &str = "# GENERATED BY berth - DO NOT EDIT.\n\
# Changes will be overwritten by `berth generate`; edit berth.yaml instead.\n";

/// Writes descriptors as YAML behind [`GENERATED_HEADER`].
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlComposeWriter;

impl YamlComposeWriter {
    pub fn new() -> Self {
        Self
    }

    /// The exact bytes `write` puts on disk.
    pub fn render(descriptor: &ComposeDescriptor) -> Result<String, serde_yaml::Error> {
        let body = serde_yaml::to_string(descriptor)?;
        Ok(format!("{GENERATED_HEADER}\n{body}"))
    }
}

impl ComposeWriter for YamlComposeWriter {
    #[instrument(
        skip(self, descriptor),
        fields(path = %path.display(), services = descriptor.services.len())
    )]
    fn write(&self, descriptor: &ComposeDescriptor, path: &Path) -> BerthResult<()> {
        let failure = |reason: String| ApplicationError::WriteFailure {
            path: path.to_path_buf(),
            reason,
        };

        let content = Self::render(descriptor).map_err(|e| failure(e.to_string()))?;
        atomic_write(path, content.as_bytes()).map_err(|e| failure(e.to_string()))?;
        debug!(bytes = content.len(), "compose file replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::domain::{
        Command, ComposeSynthesizer, Manifest, ProjectName, ResolvedPortMap, ServiceSpec,
    };
    use tempfile::TempDir;

    fn descriptor() -> ComposeDescriptor {
        let manifest = Manifest::new(ProjectName::parse("shop").unwrap())
            .with_framework("laravel")
            .with_service(
                "app",
                ServiceSpec::build(".", "Dockerfile")
                    .port("80")
                    .command(Command::Single("php artisan serve".into())),
            )
            .with_service(
                "db",
                ServiceSpec::image("mysql:8")
                    .port("3306")
                    .env("MYSQL_DATABASE", "shop"),
            );
        let mut ports = ResolvedPortMap::new();
        ports.insert("app", 80, 10000);
        ports.insert("db", 3306, 10001);
        ComposeSynthesizer::default().synthesize(&manifest, &ports)
    }

    #[test]
    fn writes_header_then_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docker-compose.yml");
        YamlComposeWriter.write(&descriptor(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(GENERATED_HEADER));

        let parsed: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
        assert_eq!(parsed["version"], serde_yaml::Value::from("3.8"));
        assert_eq!(parsed["services"]["app"]["image"], serde_yaml::Value::from("shop-laravel-app"));
        assert_eq!(
            parsed["services"]["app"]["command"],
            serde_yaml::Value::from("php artisan serve")
        );
        assert_eq!(
            parsed["services"]["db"]["ports"][0],
            serde_yaml::Value::from("10001:3306")
        );
        assert_eq!(
            parsed["networks"]["shop-network"]["driver"],
            serde_yaml::Value::from("bridge")
        );
    }

    #[test]
    fn output_is_byte_stable() {
        let a = YamlComposeWriter::render(&descriptor()).unwrap();
        let b = YamlComposeWriter::render(&descriptor()).unwrap();
        assert_eq!(a, b);
        // services are emitted in name order
        assert!(a.find("  app:").unwrap() < a.find("  db:").unwrap());
    }

    #[test]
    fn bare_environment_key_is_written_as_null() {
        let mut descriptor = descriptor();
        descriptor
            .services
            .get_mut("db")
            .unwrap()
            .environment
            .insert("MYSQL_ROOT_PASSWORD".into(), None);

        let rendered = YamlComposeWriter::render(&descriptor).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        let env = &parsed["services"]["db"]["environment"];
        assert!(env.as_mapping().unwrap().contains_key("MYSQL_ROOT_PASSWORD"));
        assert!(env["MYSQL_ROOT_PASSWORD"].is_null());
        assert_eq!(env["MYSQL_DATABASE"], serde_yaml::Value::from("shop"));
    }

    #[test]
    fn omits_empty_sections() {
        let rendered = YamlComposeWriter::render(&descriptor()).unwrap();
        assert!(!rendered.contains("volumes:"));
        assert!(!rendered.contains("depends_on:"));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deploy/local/compose.yml");
        YamlComposeWriter.write(&descriptor(), &path).unwrap();
        assert!(path.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_target_is_write_failure() {
        use berth_core::error::BerthError;

        let dir = TempDir::new().unwrap();
        // a directory where the file should go cannot be replaced
        let path = dir.path().join("compose.yml");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let err = YamlComposeWriter.write(&descriptor(), &path).unwrap_err();
        assert!(matches!(
            err,
            BerthError::Application(ApplicationError::WriteFailure { .. })
        ));
    }
}

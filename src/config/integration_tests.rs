#[cfg(test)]
mod integration_tests {
    use crate::config::{load_and_validate_config, load_config, BackendType};
    use crate::errors::ConfigError;
    use std::io::Write;
    use tempfile::Builder;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    /// YAML files load with every section
    #[test]
    fn test_yaml_file_loading() {
        let file = write_config(
            ".yaml",
            r#"
context:
  backend: lua
service:
  port: 62002
  lambdas:
    - id: 1
      program: "lcm:register(function (batch) return batch:upper() end)"
  batches:
    - lambda_id: 1
      batch_id: 100
      data: hello
computer:
  threads: 2
"#,
        );

        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(cfg.context.backend, BackendType::Lua);
        assert_eq!(cfg.service.port, 62002);
        assert_eq!(cfg.service.batches[0].data, "hello");
        assert_eq!(cfg.computer.get_threads(), 2);
    }

    /// TOML files are accepted as an alternative format
    #[test]
    fn test_toml_file_loading() {
        let file = write_config(
            ".toml",
            r#"
[context]
backend = "wasm"

[context.wasm.fuel]
default = 5000000

[client]
timeout_ms = 2000
"#,
        );

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.context.backend, BackendType::Wasm);
        assert_eq!(cfg.context.wasm.fuel.effective_fuel(), 5_000_000);
        assert_eq!(cfg.client.timeout_ms, Some(2000));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let file = write_config(".ini", "port = 1");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let result = load_config("/definitely/not/here.yaml");
        match result {
            Err(ConfigError::Io { path, .. }) => assert!(path.ends_with("here.yaml")),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_config_fails_validation() {
        let file = write_config(".yml", "computer:\n  threads: 0\n");
        let result = load_and_validate_config(file.path());
        assert!(matches!(result, Err(ConfigError::Invalid(errors)) if errors.len() == 1));
    }
}
